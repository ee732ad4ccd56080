use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use ischedule_core::{
    Config,
    cycle::week_info,
    generate::{CalendarGenerator, GenerationStrategy, first_class_date},
    holiday::HolidayImport,
    ics::IcsGenerator,
    index::{decode_index, merge_occurrences},
    schedule::load_schedule,
};

/// 生成命令参数
pub struct GenerateParams {
    pub config: PathBuf,
    pub schedule: PathBuf,
    pub holidays: Option<PathBuf>,
    pub output_dir: PathBuf,
}

/// 生成ICS文件命令
pub fn generate_command(params: &GenerateParams) -> Result<()> {
    let config = Config::from_path(&params.config)
        .with_context(|| format!("加载配置失败: {}", params.config.display()))?;
    let mut terms = load_schedule(&params.schedule)?;

    if let Some(ref path) = params.holidays {
        let import = HolidayImport::from_path(path)?;
        for term in &mut terms {
            let holidays = import.holidays_for(term, config.count_day_in_holiday);
            tracing::info!(
                "Imported {} holiday(s) from {} into \"{}\"",
                holidays.len(),
                path.display(),
                term.name
            );
            for holiday in holidays {
                term.add_holiday(holiday);
            }
        }
    }

    let name = config.display_name();
    let generator = CalendarGenerator::new(&config);
    let total = terms.len();

    for (i, term) in terms.iter().enumerate() {
        let file_name = format!("{} - {}.ics", name, term.name);

        let calendar = generator
            .generate(term, &name)
            .with_context(|| format!("[{} of {}] 生成 {} 失败", i + 1, total, file_name))?;
        let ics_content = IcsGenerator::new().generate(&calendar)?;

        let output_file = params.output_dir.join(&file_name);
        fs::write(&output_file, ics_content).with_context(|| {
            format!(
                "[{} of {}] Failed to generate ICS file - {}",
                i + 1,
                total,
                output_file.display()
            )
        })?;

        tracing::info!(
            "[{} of {}] Successfully generated ICS file - {} ({} events)",
            i + 1,
            total,
            file_name,
            calendar.events.len()
        );
    }

    println!("✓ 已生成 {total} 个ICS文件，将其拖入日历应用即可导入");

    Ok(())
}

/// 校验课表命令
pub fn validate_command(schedule: &Path) -> Result<()> {
    let terms = load_schedule(schedule)?;

    for term in &terms {
        for course in term.courses() {
            decode_index(course, term)?;
        }
        println!(
            "✓ {}: {} 门课程, {} 个假期",
            term.name,
            term.courses().len(),
            term.holidays().len()
        );
    }

    println!("课表校验通过");
    Ok(())
}

/// 列出学期与课程命令
pub fn terms_command(schedule: &Path) -> Result<()> {
    let terms = load_schedule(schedule)?;

    for term in &terms {
        println!(
            "{} ({} ~ {}), 循环 {} 周, 生成方式: {:?}",
            term.name,
            term.start,
            term.end,
            term.cycle,
            GenerationStrategy::select(term)
        );

        for course in term.courses() {
            println!(
                "  {} - {} (循环 {} 周)",
                course.name,
                course.teacher,
                term.course_cycle(course)
            );

            for group in merge_occurrences(&decode_index(course, term)?) {
                let time = term.slot_time(group.slot)?;
                for day in group.days {
                    let position = week_info(day)?;
                    println!(
                        "    第 {} 天 (第 {} 周 星期{}) {} 首次上课: {}",
                        day,
                        position.week_offset + 1,
                        position.weekday,
                        time.format("%H:%M"),
                        first_class_date(term, course, day)?
                    );
                }
            }
        }

        for holiday in term.holidays() {
            println!("  假期: {} ({} ~ {})", holiday.name, holiday.start, holiday.end);
            for compensation in &holiday.compensation {
                println!(
                    "    {} 补第 {} 天的课",
                    compensation.date, compensation.cycle_day
                );
            }
        }
    }

    Ok(())
}

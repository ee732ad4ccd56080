//! 按学期生成日历事件
//!
//! 没有假期时每个 (循环日, 节次) 生成一个带 RRULE 的重复事件；有假期时
//! 逐日枚举，因为 RRULE 无法表达跳过假期与循环日顺延。

use std::collections::BTreeSet;

use chrono::{NaiveDate, TimeDelta};

use crate::{
    Calendar, Config, Course, Event, Result, Term,
    cycle::{date_for_cycle_day, week_info},
    event::EventMaterializer,
    holiday::{WorkdayCounter, compensations, holiday_on, is_workday},
    index::{Occurrence, decode_index, flatten_groups, merge_occurrences},
    types::WORKDAYS_PER_WEEK,
};

/// 生成策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStrategy {
    /// 每组上课生成一个每周重复事件
    Recurrence,
    /// 逐日生成单次事件
    Enumeration,
}

impl GenerationStrategy {
    pub fn select(term: &Term) -> Self {
        if term.holidays().is_empty() {
            Self::Recurrence
        } else {
            Self::Enumeration
        }
    }
}

/// 已解码的课程
struct DecodedCourse<'a> {
    course: &'a Course,
    occurrences: Vec<Occurrence>,
    cycle_days: u32,
}

impl DecodedCourse<'_> {
    fn on_day(&self, cycle_day: u32) -> impl Iterator<Item = &Occurrence> {
        self.occurrences.iter().filter(move |o| o.day == cycle_day)
    }
}

/// 日历生成器
pub struct CalendarGenerator<'a> {
    config: &'a Config,
}

impl<'a> CalendarGenerator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// 生成一个学期的完整日历，任何解码错误都会使整个学期失败
    pub fn generate(&self, term: &Term, calendar_name: &str) -> Result<Calendar> {
        let strategy = GenerationStrategy::select(term);
        tracing::info!(
            "Generating \"{}\" with {} course(s) using {:?} strategy",
            term.name,
            term.courses().len(),
            strategy
        );

        let events = match strategy {
            GenerationStrategy::Recurrence => self.recurring_events(term)?,
            GenerationStrategy::Enumeration => self.enumerated_events(term)?,
        };

        Ok(Calendar {
            prodid: self.config.prodid.clone(),
            name: format!("{} - {}", calendar_name, term.name),
            color: self.config.calendar_color(),
            timezone: self.config.timezone.clone(),
            events,
        })
    }

    /// 无假期：每个 (循环日, 节次) 一个重复事件
    pub fn recurring_events(&self, term: &Term) -> Result<Vec<Event>> {
        let materializer = EventMaterializer::new(term, &self.config.alarm);
        let mut events = Vec::new();

        for course in term.courses() {
            let groups = merge_occurrences(&decode_index(course, term)?);
            let mut seen = BTreeSet::new();

            for occurrence in flatten_groups(&groups) {
                if !seen.insert(occurrence) {
                    continue;
                }

                let position = week_info(occurrence.day)?;
                let date = first_class_date(term, course, occurrence.day)?;
                if date > term.end {
                    tracing::debug!(
                        "Skipping {} on cycle day {}: first class {} is after the term ends",
                        course.name,
                        occurrence.day,
                        date
                    );
                    continue;
                }

                events.push(materializer.materialize_recurring(
                    course,
                    date,
                    occurrence.slot,
                    position.weekday,
                )?);
            }
        }

        Ok(events)
    }

    /// 有假期：逐日枚举，最后追加调休补课
    pub fn enumerated_events(&self, term: &Term) -> Result<Vec<Event>> {
        let materializer = EventMaterializer::new(term, &self.config.alarm);
        let courses = decode_courses(term)?;
        let mut counter = WorkdayCounter::starting_at(term.start, self.config.count_day_in_holiday);
        let mut events = Vec::new();

        for date in term.start.iter_days().take_while(|date| *date <= term.end) {
            if !is_workday(date) {
                continue;
            }

            if let Some(holiday) = holiday_on(date, term.holidays()) {
                counter.advance(date, true);
                tracing::debug!("{} is in holiday \"{}\"", date, holiday.name);
                continue;
            }

            counter.advance(date, false);
            for decoded in &courses {
                let Some(cycle_day) = counter.cycle_day(decoded.cycle_days) else {
                    continue;
                };
                for occurrence in decoded.on_day(cycle_day) {
                    events.push(materializer.materialize(decoded.course, date, occurrence.slot)?);
                }
            }
        }

        for (holiday, compensation) in compensations(term.holidays()) {
            tracing::debug!(
                "Replaying cycle day {} on {} for \"{}\"",
                compensation.cycle_day,
                compensation.date,
                holiday.name
            );
            for decoded in &courses {
                // 补课循环日按学期循环给出，换算到课程自己的循环
                let cycle_day = compensation.cycle_day.saturating_sub(1) % decoded.cycle_days + 1;
                for occurrence in decoded.on_day(cycle_day) {
                    events.push(materializer.materialize(
                        decoded.course,
                        compensation.date,
                        occurrence.slot,
                    )?);
                }
            }
        }

        Ok(events)
    }
}

fn decode_courses(term: &Term) -> Result<Vec<DecodedCourse<'_>>> {
    term.courses()
        .iter()
        .map(|course| {
            let mut occurrences = decode_index(course, term)?;
            // 同一门课重复的 (日, 节) 只上一次
            let mut seen = BTreeSet::new();
            occurrences.retain(|o| seen.insert(*o));
            Ok(DecodedCourse {
                course,
                occurrences,
                cycle_days: term.course_cycle(course) * WORKDAYS_PER_WEEK,
            })
        })
        .collect()
}

/// 循环日在学期内的首次上课日期
///
/// 学期从周中开始时，落在开学之前的日期顺延整数个循环。
pub fn first_class_date(term: &Term, course: &Course, day: u32) -> Result<NaiveDate> {
    let mut date = date_for_cycle_day(term.initial_monday(), day)?;
    while date < term.start {
        date += TimeDelta::weeks(i64::from(term.course_cycle(course)));
    }
    Ok(date)
}

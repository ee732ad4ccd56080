mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ischedule")]
#[command(about = "Convert a class timetable into ICS calendar files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 启用详细日志
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// 为每个学期生成ICS文件
    Generate {
        /// 程序配置文件
        #[arg(short, long, default_value = "config.json")]
        config: PathBuf,

        /// 课表文件
        #[arg(short, long, default_value = "schedule.json")]
        schedule: PathBuf,

        /// 额外导入的节假日ICS
        #[arg(long)]
        holidays: Option<PathBuf>,

        /// 输出目录
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// 校验课表文件并解码所有课程
    Validate {
        /// 课表文件
        #[arg(short, long, default_value = "schedule.json")]
        schedule: PathBuf,
    },

    /// 列出学期与课程的解码结果
    Terms {
        /// 课表文件
        #[arg(short, long, default_value = "schedule.json")]
        schedule: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 设置日志级别
    let log_level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("ischedule={log_level},ischedule_core={log_level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("iSchedule {}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Generate {
            config,
            schedule,
            holidays,
            output_dir,
        } => commands::generate_command(&commands::GenerateParams {
            config,
            schedule,
            holidays,
            output_dir,
        }),
        Commands::Validate { schedule } => commands::validate_command(&schedule),
        Commands::Terms { schedule } => commands::terms_command(&schedule),
    }
}

use std::{fs, path::Path, sync::OnceLock};

use chrono::{Local, TimeDelta};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// 程序配置 (`config.json`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// 日历名称前缀，为空时自动生成
    #[serde(default)]
    pub name: String,
    /// 日历颜色：`#RRGGBB`、`#RRGGBBAA` 或 `random`
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub alarm: AlarmConfig,
    /// 放假的工作日是否占用循环日
    #[serde(default)]
    pub count_day_in_holiday: bool,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_prodid")]
    pub prodid: String,
}

/// 提醒设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfig {
    #[serde(default)]
    pub enabled: bool,
    /// 提前量 `[小时, 分钟]`
    #[serde(default = "default_before")]
    pub before: (u32, u32),
}

fn default_color() -> String {
    "random".to_string()
}

fn default_timezone() -> String {
    "Asia/Shanghai".to_string()
}

fn default_prodid() -> String {
    "-//iSchedule//Timetable Calendar//EN".to_string()
}

const fn default_before() -> (u32, u32) {
    (0, 15)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: String::new(),
            color: default_color(),
            alarm: AlarmConfig::default(),
            count_day_in_holiday: false,
            timezone: default_timezone(),
            prodid: default_prodid(),
        }
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            before: default_before(),
        }
    }
}

impl AlarmConfig {
    /// 启用时返回提醒提前量
    pub fn offset(&self) -> Option<TimeDelta> {
        self.enabled.then(|| {
            TimeDelta::hours(i64::from(self.before.0)) + TimeDelta::minutes(i64::from(self.before.1))
        })
    }
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let content = fs::read_to_string(path_ref).map_err(|err| {
            Error::Config(format!("cannot read {}: {}", path_ref.display(), err))
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 日历名称前缀，未配置时按当前时间生成
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            format!("Schedule-{}", Local::now().format("%H:%M:%S-%Y.%m.%d"))
        } else {
            self.name.clone()
        }
    }

    /// 解析后的日历颜色
    pub fn calendar_color(&self) -> String {
        parse_hex_color(&self.color)
    }
}

fn hex_color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^#[0-9a-fA-F]{6}([0-9a-fA-F]{2})?$").expect("valid regex"))
}

/// 随机生成 `#rrggbb` 颜色
pub fn random_hex_color() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    format!("#{:02x}{:02x}{:02x}", bytes[0], bytes[1], bytes[2])
}

/// 解析颜色；带透明度时去掉透明度，无效时使用随机颜色
pub fn parse_hex_color(color: &str) -> String {
    if color.eq_ignore_ascii_case("random") {
        return random_hex_color();
    }

    if let Some(captures) = hex_color_regex().captures(color) {
        return match captures.get(1) {
            Some(alpha) => color[..alpha.start()].to_string(),
            None => color.to_string(),
        };
    }

    let fallback = random_hex_color();
    tracing::error!("Invalid color code: {}, using {} instead.", color, fallback);
    fallback
}

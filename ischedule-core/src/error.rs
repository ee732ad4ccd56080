use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// 课表文件中某个学期/课程/字段的配置错误
    #[error("Invalid schedule file, error processing {location}: {message}")]
    Schedule { location: String, message: String },

    /// 内部查表失败，说明上游解码有误
    #[error("Lookup failed: {0}")]
    Lookup(String),

    #[error("Holiday calendar parsing failed: {0}")]
    HolidayCalendar(String),

    #[error("ICS generation failed: {0}")]
    IcsGeneration(String),
}

impl Error {
    /// 构造带有 `学期.课程.字段` 定位信息的课表错误
    pub fn schedule(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Schedule {
            location: location.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

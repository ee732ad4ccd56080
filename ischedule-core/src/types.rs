use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use uuid::Uuid;

use crate::{Error, Result, cycle, index::IndexPair, location::Location};

/// 每个循环周内的上课日数量（周一至周五）
pub const WORKDAYS_PER_WEEK: u32 = 5;

/// 学期
///
/// 学期独占其课程与假期，课程只能通过 [`Term::add_course`] 挂载，
/// 挂载时回填课程的有效循环周数。
#[derive(Debug, Clone)]
pub struct Term {
    pub name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// 单节课时长（分钟）
    pub duration: u32,
    /// 每天各节课的开始时间
    pub timetable: Vec<NaiveTime>,
    /// 循环周数
    pub cycle: u32,
    courses: Vec<Course>,
    holidays: Vec<Holiday>,
}

impl Term {
    pub fn new(
        name: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
        duration: u32,
        timetable: Vec<NaiveTime>,
        cycle: u32,
    ) -> Result<Self> {
        let name = name.into();

        if cycle == 0 {
            return Err(Error::schedule(
                format!("{name}.cycle"),
                "invalid cycle number, cycle number should be a positive integer",
            ));
        }
        if start > end {
            return Err(Error::schedule(
                format!("{name}.start"),
                format!("term starts on {start} but ends on {end}"),
            ));
        }
        if timetable.is_empty() {
            return Err(Error::schedule(
                format!("{name}.timetable"),
                "timetable must contain at least one class",
            ));
        }
        if duration == 0 {
            return Err(Error::schedule(
                format!("{name}.duration"),
                "class duration must be positive",
            ));
        }

        Ok(Self {
            name,
            start,
            end,
            duration,
            timetable,
            cycle,
            courses: Vec::new(),
            holidays: Vec::new(),
        })
    }

    /// 挂载课程，并根据课程自身的循环设置确定其有效循环周数
    pub fn add_course(&mut self, mut course: Course) {
        let effective = match course.cycle_override {
            None => self.cycle,
            Some(value) => match u32::try_from(value) {
                Ok(cycle) if cycle > 0 => {
                    tracing::warn!(
                        "Exceptional cycle \"{}\" is provided in \"{}.{}\" and this will OVERRIDE the default cycle",
                        cycle,
                        self.name,
                        course.name
                    );
                    cycle
                }
                _ => {
                    tracing::warn!(
                        "Invalid cycle \"{}\" in \"{}.{}\", falling back to the term cycle {}",
                        value,
                        self.name,
                        course.name,
                        self.cycle
                    );
                    self.cycle
                }
            },
        };

        course.cycle = Some(effective);
        self.courses.push(course);
    }

    /// 挂载假期
    pub fn add_holiday(&mut self, holiday: Holiday) {
        self.holidays.push(holiday);
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn holidays(&self) -> &[Holiday] {
        &self.holidays
    }

    /// 一个循环内的上课日总数
    pub fn cycle_days(&self) -> u32 {
        self.cycle * WORKDAYS_PER_WEEK
    }

    /// 学期开始所在周的星期一
    pub fn initial_monday(&self) -> NaiveDate {
        cycle::monday_of(self.start)
    }

    /// 第 `slot` 节课的开始时间
    pub fn slot_time(&self, slot: usize) -> Result<NaiveTime> {
        self.timetable.get(slot).copied().ok_or_else(|| {
            Error::Lookup(format!(
                "slot {} is outside the timetable of \"{}\" ({} slots)",
                slot,
                self.name,
                self.timetable.len()
            ))
        })
    }

    pub fn class_duration(&self) -> TimeDelta {
        TimeDelta::minutes(i64::from(self.duration))
    }

    /// 课程在该学期内的有效循环周数
    pub fn course_cycle(&self, course: &Course) -> u32 {
        course.cycle().unwrap_or(self.cycle)
    }
}

/// 课程信息
#[derive(Debug, Clone)]
pub struct Course {
    pub name: String,
    pub teacher: String,
    pub location: Option<Location>,
    /// 上课时间索引 `[[日, 节], ...]`
    pub index: Vec<IndexPair>,
    cycle_override: Option<i64>,
    cycle: Option<u32>,
}

impl Course {
    pub fn new(
        name: impl Into<String>,
        teacher: impl Into<String>,
        location: Option<Location>,
        index: Vec<IndexPair>,
        cycle_override: Option<i64>,
    ) -> Self {
        Self {
            name: name.into(),
            teacher: teacher.into(),
            location,
            index,
            cycle_override,
            cycle: None,
        }
    }

    /// 有效循环周数，挂载到学期之前为 `None`
    pub fn cycle(&self) -> Option<u32> {
        self.cycle
    }

    /// 事件描述：教师与地点各占一行
    pub fn description(&self) -> String {
        match self.location {
            Some(ref location) => format!("{}\n{}", self.teacher, location),
            None => self.teacher.clone(),
        }
    }
}

/// 假期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolidayKind {
    /// 固定日期
    Fixed,
}

/// 调休补课：在 `date` 重放循环日 `cycle_day` 的课表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Compensation {
    pub date: NaiveDate,
    pub cycle_day: u32,
}

/// 假期
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Holiday {
    pub name: String,
    pub kind: HolidayKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub compensation: Vec<Compensation>,
}

impl Holiday {
    pub fn new(name: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Result<Self> {
        let name = name.into();
        if start > end {
            return Err(Error::schedule(
                format!("holidays.{name}"),
                format!("holiday starts on {start} but ends on {end}"),
            ));
        }

        Ok(Self {
            name,
            kind: HolidayKind::Fixed,
            start,
            end,
            compensation: Vec::new(),
        })
    }

    pub fn with_compensation(mut self, compensation: Vec<Compensation>) -> Self {
        self.compensation = compensation;
        self
    }

    /// 日期是否落在假期内（首尾皆含）
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// 事件提醒
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alarm {
    /// 提前量
    pub before: TimeDelta,
    pub description: String,
}

/// 每周重复规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceRule {
    /// 重复频率，目前只有 WEEKLY
    pub frequency: String,
    /// 每N周
    pub interval: u32,
    /// BYDAY 缩写 (MO..FR)
    pub by_day: &'static str,
    pub until: NaiveDateTime,
}

/// 单个日历事件
#[derive(Debug, Clone)]
pub struct Event {
    pub uid: Uuid,
    pub summary: String,
    pub description: String,
    pub location: Option<Location>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub alarm: Option<Alarm>,
    pub recurrence: Option<RecurrenceRule>,
}

/// 一个学期对应的日历文档
#[derive(Debug, Clone)]
pub struct Calendar {
    pub prodid: String,
    pub name: String,
    pub color: String,
    pub timezone: String,
    pub events: Vec<Event>,
}

//! 课表文件 (`schedule.json`) 解析
//!
//! 顶层是 `学期名 -> 学期` 的对象，键的顺序即学期的生成顺序。所有校验错误
//! 都带有 `学期.课程.字段` 形式的定位信息。

use std::{fs, path::Path};

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::{
    Compensation, Course, Error, Holiday, Result, Term,
    index::{IndexComponent, IndexPair},
    location::Location,
};

#[derive(Debug, Deserialize)]
struct RawTerm {
    start: RawDate,
    end: RawDate,
    duration: u32,
    timetable: Vec<Vec<u32>>,
    cycle: i64,
    #[serde(default)]
    courses: Map<String, Value>,
    #[serde(default)]
    holidays: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RawCourse {
    #[serde(default)]
    teacher: String,
    #[serde(default)]
    location: Option<RawLocation>,
    index: Vec<Vec<Value>>,
    #[serde(default)]
    cycle: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawHoliday {
    #[serde(rename = "type", default = "default_holiday_type")]
    kind: String,
    start: RawDate,
    #[serde(default)]
    end: Option<RawDate>,
    #[serde(default)]
    compensation: Vec<(RawDate, i64)>,
}

fn default_holiday_type() -> String {
    "fixed".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawDate {
    Parts(Vec<i64>),
    Text(String),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawLocation {
    Text(String),
    Structured(String, RawCoordinate, RawCoordinate),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCoordinate {
    Number(f64),
    Text(String),
}

impl RawDate {
    fn resolve(&self, location: &str) -> Result<NaiveDate> {
        let date = match self {
            Self::Parts(parts) => match parts.as_slice() {
                [y, m, d, ..] => i32::try_from(*y).ok().and_then(|y| {
                    NaiveDate::from_ymd_opt(y, u32::try_from(*m).ok()?, u32::try_from(*d).ok()?)
                }),
                _ => None,
            },
            Self::Text(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d").ok(),
        };

        date.ok_or_else(|| {
            Error::schedule(
                location,
                format!("{self:?} is not a valid date, expected [year, month, day] or \"YYYY-MM-DD\""),
            )
        })
    }
}

impl RawCoordinate {
    fn resolve(&self, location: &str) -> Result<f64> {
        match self {
            Self::Number(value) => Ok(*value),
            Self::Text(text) => text.trim().parse().map_err(|_| {
                Error::schedule(location, format!("\"{text}\" is not a valid coordinate"))
            }),
        }
    }
}

impl RawLocation {
    fn resolve(self, location: &str) -> Result<Option<Location>> {
        match self {
            Self::Text(name) if name.trim().is_empty() => {
                tracing::warn!("Empty location is provided in \"{}\"", location);
                Ok(None)
            }
            Self::Text(name) => Ok(Some(Location::Named(name))),
            Self::Structured(name, latitude, longitude) => Ok(Some(Location::Geo {
                name,
                latitude: latitude.resolve(location)?,
                longitude: longitude.resolve(location)?,
            })),
        }
    }
}

/// 从文件加载课表
pub fn load_schedule<P: AsRef<Path>>(path: P) -> Result<Vec<Term>> {
    let path_ref = path.as_ref();
    let content = fs::read_to_string(path_ref).map_err(|err| {
        Error::Config(format!("cannot read {}: {}", path_ref.display(), err))
    })?;
    let terms = parse_schedule(&content)?;
    tracing::info!("{} is successfully parsed", path_ref.display());
    Ok(terms)
}

/// 解析课表 JSON
pub fn parse_schedule(json: &str) -> Result<Vec<Term>> {
    let root: Map<String, Value> = serde_json::from_str(json)?;
    root.into_iter()
        .map(|(name, value)| parse_term(&name, value))
        .collect()
}

fn parse_term(name: &str, value: Value) -> Result<Term> {
    let raw: RawTerm = serde_json::from_value(value)
        .map_err(|err| Error::schedule(name, err.to_string()))?;

    let timetable = raw
        .timetable
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let time = match entry.as_slice() {
                [hour, minute] => NaiveTime::from_hms_opt(*hour, *minute, 0),
                _ => None,
            };
            time.ok_or_else(|| {
                Error::schedule(
                    format!("{name}.timetable[{i}]"),
                    format!("{entry:?} is not a valid [hour, minute] pair"),
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut term = Term::new(
        name,
        raw.start.resolve(&format!("{name}.start"))?,
        raw.end.resolve(&format!("{name}.end"))?,
        raw.duration,
        timetable,
        u32::try_from(raw.cycle).unwrap_or(0),
    )?;

    for (course_name, value) in raw.courses {
        let course = parse_course(name, &course_name, value)?;
        term.add_course(course);
    }

    for (holiday_name, value) in raw.holidays {
        let holiday = parse_holiday(&term, &holiday_name, value)?;
        term.add_holiday(holiday);
    }

    Ok(term)
}

fn parse_course(term: &str, name: &str, value: Value) -> Result<Course> {
    let location = format!("{term}.{name}");
    let raw: RawCourse = serde_json::from_value(value)
        .map_err(|err| Error::schedule(&location, err.to_string()))?;

    let index = raw
        .index
        .iter()
        .enumerate()
        .map(|(i, pair)| {
            let field = format!("{location}.index[{i}]");
            let [day, slot] = pair.as_slice() else {
                return Err(Error::schedule(
                    field,
                    format!("expected a [day, slot] pair, found {} item(s)", pair.len()),
                ));
            };
            let day = IndexComponent::from_value(day)
                .map_err(|message| Error::schedule(format!("{field}.day"), message))?;
            let slot = IndexComponent::from_value(slot)
                .map_err(|message| Error::schedule(format!("{field}.slot"), message))?;
            Ok(IndexPair::new(day, slot))
        })
        .collect::<Result<Vec<_>>>()?;

    let place = match raw.location {
        Some(raw_location) => raw_location.resolve(&format!("{location}.location"))?,
        None => {
            tracing::warn!("Empty location is provided in \"{}\"", location);
            None
        }
    };

    Ok(Course::new(name, raw.teacher, place, index, raw.cycle))
}

fn parse_holiday(term: &Term, name: &str, value: Value) -> Result<Holiday> {
    let location = format!("{}.holidays.{}", term.name, name);
    let raw: RawHoliday = serde_json::from_value(value)
        .map_err(|err| Error::schedule(&location, err.to_string()))?;

    match raw.kind.to_lowercase().as_str() {
        "fixed" => {}
        "relative" => {
            return Err(Error::schedule(
                format!("{location}.type"),
                "relative holidays are not supported",
            ));
        }
        other => {
            return Err(Error::schedule(
                format!("{location}.type"),
                format!("unknown holiday type \"{other}\""),
            ));
        }
    }

    let start = raw.start.resolve(&format!("{location}.start"))?;
    let end = match raw.end {
        Some(end) => end.resolve(&format!("{location}.end"))?,
        None => start,
    };

    let compensation = raw
        .compensation
        .iter()
        .enumerate()
        .map(|(i, (date, day))| {
            let field = format!("{location}.compensation[{i}]");
            let date = date.resolve(&field)?;
            let cycle_day = u32::try_from(*day)
                .ok()
                .filter(|d| (1..=term.cycle_days()).contains(d))
                .ok_or_else(|| {
                    Error::schedule(
                        &field,
                        format!("{day} is out of range, expected 1..={}", term.cycle_days()),
                    )
                })?;
            Ok(Compensation { date, cycle_day })
        })
        .collect::<Result<Vec<_>>>()?;

    Holiday::new(name, start, end)
        .map_err(|_| {
            Error::schedule(
                &location,
                format!("holiday starts on {start} but ends on {end}"),
            )
        })
        .map(|holiday| holiday.with_compensation(compensation))
}

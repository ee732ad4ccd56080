use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta};
use ical::parser::ical::{IcalParser, component::IcalEvent};
use std::{
    collections::{BTreeMap, BTreeSet},
    fs::File,
    io::{BufReader, Read},
    path::Path,
};

use crate::{
    Compensation, Error, Holiday, Result, Term,
    cycle::{self, calendar_cycle_day},
    types::WORKDAYS_PER_WEEK,
};

/// 查找包含该日期的假期，多个假期重叠时取第一个
pub fn holiday_on(date: NaiveDate, holidays: &[Holiday]) -> Option<&Holiday> {
    holidays.iter().find(|holiday| holiday.contains(date))
}

pub fn is_workday(date: NaiveDate) -> bool {
    date.weekday().num_days_from_monday() < WORKDAYS_PER_WEEK
}

/// 所有假期的调休补课条目
pub fn compensations(holidays: &[Holiday]) -> impl Iterator<Item = (&Holiday, &Compensation)> {
    holidays
        .iter()
        .flat_map(|holiday| holiday.compensation.iter().map(move |c| (holiday, c)))
}

/// 工作日计数器
///
/// 从学期开始所在周的星期一起累计工作日，周末不计。放假的工作日是否计数
/// 由 `countDayInHoliday` 决定。
#[derive(Debug, Clone)]
pub struct WorkdayCounter {
    count: u32,
    count_day_in_holiday: bool,
}

impl WorkdayCounter {
    /// 学期开始日之前本周已经过去的工作日视为已计数
    pub fn starting_at(start: NaiveDate, count_day_in_holiday: bool) -> Self {
        let elapsed = start
            .weekday()
            .num_days_from_monday()
            .min(WORKDAYS_PER_WEEK);
        Self {
            count: elapsed,
            count_day_in_holiday,
        }
    }

    /// 推进一天，返回该日是否占用了一个循环日
    pub fn advance(&mut self, date: NaiveDate, in_holiday: bool) -> bool {
        if !is_workday(date) {
            return false;
        }
        if in_holiday && !self.count_day_in_holiday {
            return false;
        }
        self.count += 1;
        true
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// 当前处于长度为 `cycle_days` 的循环中的第几天，尚未计数时为 `None`
    pub fn cycle_day(&self, cycle_days: u32) -> Option<u32> {
        if self.count == 0 || cycle_days == 0 {
            return None;
        }
        Some((self.count - 1) % cycle_days + 1)
    }
}

/// 节假日ICS导入
///
/// 读取公共节假日日历，将放假日合并为固定假期，并把调休上班日转换为补课条目。
#[derive(Debug, Clone, Default)]
pub struct HolidayImport {
    groups: BTreeMap<String, HolidayGroup>,
}

#[derive(Debug, Clone, Default)]
struct HolidayGroup {
    name: String,
    rest: BTreeSet<NaiveDate>,
    makeup: BTreeSet<NaiveDate>,
}

impl HolidayImport {
    /// 从文件路径加载节假日ICS
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref).map_err(|err| {
            Error::HolidayCalendar(format!("cannot open {}: {}", path_ref.display(), err))
        })?;
        Self::from_reader(file)
    }

    /// 从字节切片加载节假日ICS
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self> {
        Self::from_reader(std::io::Cursor::new(bytes.as_ref()))
    }

    /// 从读取器中加载节假日ICS
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let parser = IcalParser::new(BufReader::new(reader));
        let mut groups: BTreeMap<String, HolidayGroup> = BTreeMap::new();

        for calendar in parser {
            let calendar = calendar.map_err(|err| Error::HolidayCalendar(err.to_string()))?;

            for event in calendar.events {
                let Some(kind) = classify_event(&event) else {
                    continue;
                };

                let dates = extract_event_dates(&event)?;
                if dates.is_empty() {
                    continue;
                }

                let summary = event_property(&event, "SUMMARY").unwrap_or_default();
                let key = event_property(&event, "X-APPLE-UNIVERSAL-ID")
                    .or_else(|| event_property(&event, "UID"))
                    .map_or_else(|| group_name(summary), ToString::to_string);

                let entry = groups.entry(key).or_default();
                if entry.name.is_empty() {
                    entry.name = group_name(summary);
                }
                match kind {
                    HolidayEventKind::Rest => entry.rest.extend(dates),
                    HolidayEventKind::Makeup => entry.makeup.extend(dates),
                }
            }
        }

        Ok(Self { groups })
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// 转换为学期内的固定假期
    ///
    /// 放假的工作日计入循环日时，每个调休上班日按时间顺序对应一个放假的
    /// 工作日，补课条目重放该工作日按日历推算的循环日。不计入时，放假日的课
    /// 已经顺延到之后的工作日，不再生成补课条目。
    pub fn holidays_for(&self, term: &Term, count_day_in_holiday: bool) -> Vec<Holiday> {
        let initial_monday = cycle::monday_of(term.start);
        let mut holidays = Vec::new();

        for group in self.groups.values() {
            let touches_term = group
                .rest
                .iter()
                .chain(&group.makeup)
                .any(|date| term.start <= *date && *date <= term.end);
            if group.rest.is_empty() || !touches_term {
                continue;
            }

            let compensation: Vec<Compensation> = if count_day_in_holiday {
                let displaced = group.rest.iter().copied().filter(|date| is_workday(*date));
                group
                    .makeup
                    .iter()
                    .copied()
                    .zip(displaced)
                    .filter_map(|(makeup, rest)| {
                        calendar_cycle_day(initial_monday, term.cycle, rest).map(|cycle_day| {
                            Compensation {
                                date: makeup,
                                cycle_day,
                            }
                        })
                    })
                    .collect()
            } else {
                if !group.makeup.is_empty() {
                    tracing::debug!(
                        "Skipping {} make-up day(s) of \"{}\": classes are postponed instead",
                        group.makeup.len(),
                        group.name
                    );
                }
                Vec::new()
            };

            let ranges = contiguous_ranges(&group.rest);
            let last = ranges.len().saturating_sub(1);
            for (i, (start, end)) in ranges.into_iter().enumerate() {
                holidays.push(Holiday {
                    name: group.name.clone(),
                    kind: crate::HolidayKind::Fixed,
                    start,
                    end,
                    // 补课条目挂在最后一段假期上，只会被生成一次
                    compensation: if i == last {
                        compensation.clone()
                    } else {
                        Vec::new()
                    },
                });
            }
        }

        holidays.sort_by_key(|holiday| holiday.start);
        holidays
    }
}

fn group_name(summary: &str) -> String {
    summary
        .trim()
        .trim_end_matches(['休', '班'])
        .trim_end_matches(['（', '('])
        .trim()
        .to_string()
}

fn contiguous_ranges(dates: &BTreeSet<NaiveDate>) -> Vec<(NaiveDate, NaiveDate)> {
    let mut ranges: Vec<(NaiveDate, NaiveDate)> = Vec::new();

    for &date in dates {
        match ranges.last_mut() {
            Some((_, end)) if *end + TimeDelta::days(1) == date => *end = date,
            _ => ranges.push((date, date)),
        }
    }

    ranges
}

#[derive(Debug, Clone, Copy)]
enum HolidayEventKind {
    Rest,
    Makeup,
}

fn classify_event(event: &IcalEvent) -> Option<HolidayEventKind> {
    if let Some(kind) = event_property(event, "X-APPLE-SPECIAL-DAY") {
        return match kind {
            "WORK-HOLIDAY" => Some(HolidayEventKind::Rest),
            "ALTERNATE-WORKDAY" => Some(HolidayEventKind::Makeup),
            _ => None,
        };
    }

    let summary = event_property(event, "SUMMARY")?;
    let normalized = summary.replace([' ', '\t'], "");
    if normalized.contains('休') || normalized.contains("放假") {
        return Some(HolidayEventKind::Rest);
    }
    if normalized.contains('班') || normalized.contains("调休") || normalized.contains("上班")
    {
        return Some(HolidayEventKind::Makeup);
    }

    None
}

fn extract_event_dates(event: &IcalEvent) -> Result<Vec<NaiveDate>> {
    let start_raw = event_property(event, "DTSTART")
        .ok_or_else(|| Error::HolidayCalendar("event without DTSTART".to_string()))?;
    let start = parse_date(start_raw).map_err(|err| {
        Error::HolidayCalendar(format!("invalid start date {start_raw}: {err}"))
    })?;

    let exclusive_end = match event_property(event, "DTEND") {
        Some(value) => parse_date(value).map_err(|err| {
            Error::HolidayCalendar(format!("invalid end date {value}: {err}"))
        })?,
        None => next_day(start)?,
    };

    if exclusive_end <= start {
        return Ok(vec![start]);
    }

    Ok(start
        .iter_days()
        .take_while(|date| *date < exclusive_end)
        .collect())
}

fn next_day(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_add_signed(TimeDelta::days(1))
        .ok_or_else(|| Error::HolidayCalendar(format!("date {date} is out of range")))
}

fn event_property<'a>(event: &'a IcalEvent, name: &str) -> Option<&'a str> {
    event
        .properties
        .iter()
        .find(|prop| prop.name.eq_ignore_ascii_case(name))
        .and_then(|prop| prop.value.as_deref())
}

fn parse_date(value: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(value, "%Y%m%d")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ").map(|dt| dt.date()))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
}

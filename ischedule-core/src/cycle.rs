use chrono::{Datelike, NaiveDate, TimeDelta};

use crate::{Error, Result, types::WORKDAYS_PER_WEEK};

/// 循环日在周内的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekPosition {
    /// 星期几，周一为 1，周五为 5
    pub weekday: u32,
    /// 之前经过的完整周数
    pub week_offset: u32,
}

/// 将从 1 开始的循环日映射为 (星期几, 周偏移)
pub fn week_info(day: u32) -> Result<WeekPosition> {
    if day == 0 {
        return Err(Error::Lookup("cycle day must start from 1".to_string()));
    }

    let week_offset = if day % WORKDAYS_PER_WEEK != 0 {
        day / WORKDAYS_PER_WEEK
    } else {
        day / WORKDAYS_PER_WEEK - 1
    };

    Ok(WeekPosition {
        weekday: day - week_offset * WORKDAYS_PER_WEEK,
        week_offset,
    })
}

/// 星期几转为 RRULE 中 BYDAY 的缩写
pub fn day_abbreviation(weekday: u32) -> Result<&'static str> {
    match weekday {
        1 => Ok("MO"),
        2 => Ok("TU"),
        3 => Ok("WE"),
        4 => Ok("TH"),
        5 => Ok("FR"),
        _ => Err(Error::Lookup(format!("Invalid day: {weekday}"))),
    }
}

/// 找到这一周的星期一
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    let days_since_monday = date.weekday().num_days_from_monday();
    date - TimeDelta::days(i64::from(days_since_monday))
}

/// 循环日对应的具体日期
pub fn date_for_cycle_day(initial_monday: NaiveDate, day: u32) -> Result<NaiveDate> {
    let position = week_info(day)?;
    Ok(initial_monday
        + TimeDelta::weeks(i64::from(position.week_offset))
        + TimeDelta::days(i64::from(position.weekday - 1)))
}

/// 按纯日历推算某个日期处于循环中的第几天；周末返回 `None`
pub fn calendar_cycle_day(initial_monday: NaiveDate, cycle: u32, date: NaiveDate) -> Option<u32> {
    let weekday = date.weekday().num_days_from_monday();
    if weekday >= WORKDAYS_PER_WEEK || cycle == 0 {
        return None;
    }

    let weeks = (date - initial_monday).num_days().div_euclid(7);
    let week_in_cycle = u32::try_from(weeks.rem_euclid(i64::from(cycle))).ok()?;
    Some(week_in_cycle * WORKDAYS_PER_WEEK + weekday + 1)
}

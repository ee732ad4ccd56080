use chrono::{NaiveDate, NaiveTime, TimeDelta};
use uuid::Uuid;

use crate::{
    Alarm, Course, Event, RecurrenceRule, Result, Term, config::AlarmConfig, cycle,
};

/// 提醒事项的默认描述
pub const ALARM_DESCRIPTION: &str = "提醒事项";

/// 将课程的单次上课转换为日历事件
pub struct EventMaterializer<'a> {
    term: &'a Term,
    alarm: Option<TimeDelta>,
}

impl<'a> EventMaterializer<'a> {
    pub fn new(term: &'a Term, alarm: &AlarmConfig) -> Self {
        Self {
            term,
            alarm: alarm.offset(),
        }
    }

    /// 生成不重复的单次事件
    pub fn materialize(&self, course: &Course, date: NaiveDate, slot: usize) -> Result<Event> {
        let start = date.and_time(self.term.slot_time(slot)?);

        Ok(Event {
            uid: Uuid::new_v4(),
            summary: course.name.clone(),
            description: course.description(),
            location: course.location.clone(),
            start,
            end: start + self.term.class_duration(),
            alarm: self.alarm.map(|before| Alarm {
                before,
                description: ALARM_DESCRIPTION.to_string(),
            }),
            recurrence: None,
        })
    }

    /// 生成每隔 `course.cycle` 周重复一次的事件，持续到学期结束
    pub fn materialize_recurring(
        &self,
        course: &Course,
        date: NaiveDate,
        slot: usize,
        weekday: u32,
    ) -> Result<Event> {
        let by_day = cycle::day_abbreviation(weekday)?;
        let mut event = self.materialize(course, date, slot)?;

        event.recurrence = Some(RecurrenceRule {
            frequency: "WEEKLY".to_string(),
            interval: self.term.course_cycle(course),
            by_day,
            // 学期最后一天也要上课
            until: self.term.end.and_time(NaiveTime::MIN) + TimeDelta::days(1)
                - TimeDelta::seconds(1),
        });

        tracing::debug!(
            "Adding {} on {} with rrule: every {} week(s) on {}",
            course.name,
            event.start,
            self.term.course_cycle(course),
            by_day
        );

        Ok(event)
    }
}

use chrono::{NaiveDateTime, TimeDelta, Utc};

use crate::{Alarm, Calendar, Event, RecurrenceRule, Result};

#[cfg(test)]
mod tests;

const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";

/// ICS日历生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct IcsGenerator;

impl IcsGenerator {
    pub fn new() -> Self {
        Self
    }

    /// 生成ICS日历内容
    pub fn generate(&self, calendar: &Calendar) -> Result<String> {
        let mut ics_content = String::new();

        // ICS文件头部
        ics_content.push_str("BEGIN:VCALENDAR\r\n");
        ics_content.push_str("VERSION:2.0\r\n");
        ics_content.push_str(&format!("PRODID:{}\r\n", calendar.prodid));
        ics_content.push_str("CALSCALE:GREGORIAN\r\n");
        ics_content.push_str("METHOD:PUBLISH\r\n");
        ics_content.push_str(&format!("X-APPLE-CALENDAR-COLOR:{}\r\n", calendar.color));
        ics_content.push_str(&format!(
            "X-WR-CALNAME:{}\r\n",
            escape_text(&calendar.name)
        ));
        ics_content.push_str(&format!("X-WR-TIMEZONE:{}\r\n", calendar.timezone));

        for event in &calendar.events {
            self.add_event(&mut ics_content, event)?;
        }

        // ICS文件尾部
        ics_content.push_str("END:VCALENDAR\r\n");

        Ok(ics_content)
    }

    /// 添加单个课程事件
    fn add_event(&self, ics_content: &mut String, event: &Event) -> Result<()> {
        if event.end < event.start {
            return Err(crate::Error::IcsGeneration(format!(
                "event \"{}\" ends before it starts",
                event.summary
            )));
        }

        let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

        ics_content.push_str("BEGIN:VEVENT\r\n");
        ics_content.push_str(&format!("UID:{}\r\n", event.uid));
        ics_content.push_str(&format!("DTSTAMP:{dtstamp}\r\n"));
        ics_content.push_str(&format!("DTSTART:{}\r\n", format_local(event.start)));
        ics_content.push_str(&format!("DTEND:{}\r\n", format_local(event.end)));
        ics_content.push_str(&format!("SUMMARY:{}\r\n", escape_text(&event.summary)));

        if let Some(ref location) = event.location {
            ics_content.push_str(&location.to_ics_lines());
        }

        ics_content.push_str(&format!(
            "DESCRIPTION:{}\r\n",
            escape_text(&event.description)
        ));

        if let Some(ref recurrence) = event.recurrence {
            ics_content.push_str(&format_rrule(recurrence));
        }

        if let Some(ref alarm) = event.alarm {
            ics_content.push_str("BEGIN:VALARM\r\n");
            ics_content.push_str("ACTION:DISPLAY\r\n");
            ics_content.push_str(&format!(
                "DESCRIPTION:{}\r\n",
                escape_text(&alarm.description)
            ));
            ics_content.push_str(&format!("TRIGGER:{}\r\n", format_trigger(alarm)));
            ics_content.push_str("END:VALARM\r\n");
        }

        ics_content.push_str("END:VEVENT\r\n");

        Ok(())
    }
}

/// 转义ICS文本内容
pub fn escape_text(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('\r', "")
        .replace(',', "\\,")
        .replace(';', "\\;")
}

/// 属性参数值，含有 `,` `;` `:` 时加双引号；参数值中不允许出现双引号和换行
pub fn quote_param_value(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, '"' | '\r' | '\n'))
        .collect();

    if cleaned.contains([',', ';', ':']) {
        format!("\"{cleaned}\"")
    } else {
        cleaned
    }
}

fn format_local(datetime: NaiveDateTime) -> String {
    datetime.format(LOCAL_FORMAT).to_string()
}

fn format_rrule(recurrence: &RecurrenceRule) -> String {
    let mut rrule = format!("RRULE:FREQ={}", recurrence.frequency);

    if recurrence.interval > 1 {
        rrule.push_str(&format!(";INTERVAL={}", recurrence.interval));
    }
    rrule.push_str(&format!(";BYDAY={}", recurrence.by_day));
    rrule.push_str(&format!(";UNTIL={}", format_local(recurrence.until)));

    format!("{rrule}\r\n")
}

/// 提醒触发时间，例如 `-PT1H15M`
fn format_trigger(alarm: &Alarm) -> String {
    let total = alarm.before.max(TimeDelta::zero());
    let hours = total.num_hours();
    let minutes = total.num_minutes() % 60;

    match (hours, minutes) {
        (0, 0) => "-PT0M".to_string(),
        (0, m) => format!("-PT{m}M"),
        (h, 0) => format!("-PT{h}H"),
        (h, m) => format!("-PT{h}H{m}M"),
    }
}

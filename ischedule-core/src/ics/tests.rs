use super::*;
use crate::location::Location;
use chrono::NaiveDate;
use uuid::Uuid;

fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, 0)
        .unwrap()
}

fn event() -> Event {
    Event {
        uid: Uuid::new_v4(),
        summary: "Calculus 12".to_string(),
        description: "Zhang\nA310".to_string(),
        location: Some(Location::Named("A310".to_string())),
        start: at(2024, 9, 4, 10, 0),
        end: at(2024, 9, 4, 11, 10),
        alarm: None,
        recurrence: None,
    }
}

fn calendar(events: Vec<Event>) -> Calendar {
    Calendar {
        prodid: "-//iSchedule//Timetable Calendar//EN".to_string(),
        name: "2025 Schedule - Term 1".to_string(),
        color: "#ff8800".to_string(),
        timezone: "Asia/Shanghai".to_string(),
        events,
    }
}

#[test]
fn test_calendar_header() {
    let ics_content = IcsGenerator::new().generate(&calendar(vec![])).unwrap();

    assert!(ics_content.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
    assert!(ics_content.contains("PRODID:-//iSchedule//Timetable Calendar//EN\r\n"));
    assert!(ics_content.contains("X-APPLE-CALENDAR-COLOR:#ff8800\r\n"));
    assert!(ics_content.contains("X-WR-CALNAME:2025 Schedule - Term 1\r\n"));
    assert!(ics_content.contains("X-WR-TIMEZONE:Asia/Shanghai\r\n"));
    assert!(ics_content.ends_with("END:VCALENDAR\r\n"));
    assert!(!ics_content.contains("BEGIN:VEVENT"));
}

#[test]
fn test_single_event() {
    let event = event();
    let uid = event.uid;
    let ics_content = IcsGenerator::new().generate(&calendar(vec![event])).unwrap();

    assert!(ics_content.contains(&format!("UID:{uid}\r\n")));
    assert!(ics_content.contains("DTSTART:20240904T100000\r\n"));
    assert!(ics_content.contains("DTEND:20240904T111000\r\n"));
    assert!(ics_content.contains("SUMMARY:Calculus 12\r\n"));
    assert!(ics_content.contains("LOCATION:A310\r\n"));
    assert!(ics_content.contains("DESCRIPTION:Zhang\\nA310\r\n"));
    assert!(!ics_content.contains("RRULE"));
    assert!(!ics_content.contains("VALARM"));
}

#[test]
fn test_recurring_event_with_alarm() {
    let mut event = event();
    event.recurrence = Some(RecurrenceRule {
        frequency: "WEEKLY".to_string(),
        interval: 2,
        by_day: "WE",
        until: at(2025, 1, 17, 23, 59) + TimeDelta::seconds(59),
    });
    event.alarm = Some(Alarm {
        before: TimeDelta::minutes(75),
        description: "提醒事项".to_string(),
    });

    let ics_content = IcsGenerator::new().generate(&calendar(vec![event])).unwrap();

    assert!(ics_content.contains("RRULE:FREQ=WEEKLY;INTERVAL=2;BYDAY=WE;UNTIL=20250117T235959\r\n"));
    assert!(ics_content.contains("BEGIN:VALARM\r\nACTION:DISPLAY\r\nDESCRIPTION:提醒事项\r\nTRIGGER:-PT1H15M\r\nEND:VALARM\r\n"));
}

#[test]
fn test_weekly_interval_omitted() {
    let mut event = event();
    event.recurrence = Some(RecurrenceRule {
        frequency: "WEEKLY".to_string(),
        interval: 1,
        by_day: "MO",
        until: at(2025, 1, 17, 0, 0),
    });

    let ics_content = IcsGenerator::new().generate(&calendar(vec![event])).unwrap();
    assert!(ics_content.contains("RRULE:FREQ=WEEKLY;BYDAY=MO;UNTIL=20250117T000000\r\n"));
}

#[test]
fn test_trigger_format() {
    let alarm = |minutes| Alarm {
        before: TimeDelta::minutes(minutes),
        description: String::new(),
    };

    assert_eq!(format_trigger(&alarm(0)), "-PT0M");
    assert_eq!(format_trigger(&alarm(15)), "-PT15M");
    assert_eq!(format_trigger(&alarm(120)), "-PT2H");
    assert_eq!(format_trigger(&alarm(90)), "-PT1H30M");
}

#[test]
fn test_escape_text() {
    assert_eq!(escape_text("a,b;c\\d\ne"), "a\\,b\\;c\\\\d\\ne");
    assert_eq!(escape_text("line\r\nbreak"), "line\\nbreak");
}

#[test]
fn test_quote_param_value() {
    assert_eq!(quote_param_value("Science Building"), "Science Building");
    assert_eq!(quote_param_value("Library, Floor 2"), "\"Library, Floor 2\"");
    assert_eq!(quote_param_value("Hall; East"), "\"Hall; East\"");
    assert_eq!(quote_param_value("Room \"A\": 3"), "\"Room A: 3\"");
}

#[test]
fn test_geo_location_and_escaped_summary() {
    let mut event = event();
    event.summary = "Physics; Lab".to_string();
    event.location = Some(Location::Geo {
        name: "Science Building".to_string(),
        latitude: 32.05,
        longitude: 118.78,
    });

    let ics_content = IcsGenerator::new().generate(&calendar(vec![event])).unwrap();
    assert!(ics_content.contains("SUMMARY:Physics\\; Lab\r\n"));
    assert!(ics_content.contains("GEO:32.05;118.78\r\n"));
    assert!(ics_content.contains("X-APPLE-STRUCTURED-LOCATION"));
}

#[test]
fn test_event_ending_before_start() {
    let mut event = event();
    event.end = at(2024, 9, 4, 9, 0);
    assert!(IcsGenerator::new().generate(&calendar(vec![event])).is_err());
}

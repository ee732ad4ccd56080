//! iSchedule Core Library
//!
//! This library decodes compact class timetables (terms, courses, time
//! indices, holidays) into calendar events and renders them as ICS files.

pub mod config;
pub mod cycle;
pub mod error;
pub mod event;
pub mod generate;
pub mod holiday;
pub mod ics;
pub mod index;
pub mod location;
pub mod schedule;
pub mod types;

// Re-export core types and error handling
pub use config::{AlarmConfig, Config};
pub use error::{Error, Result};
pub use types::*;

/// Commonly used items
pub mod prelude {
    pub use crate::{
        config::*, generate::*, holiday::*, ics::*, index::*, location::*, schedule::*, types::*,
    };
}

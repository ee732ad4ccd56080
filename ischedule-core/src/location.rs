use std::fmt;

use crate::ics::{escape_text, quote_param_value};

/// 上课地点：可以只有名称，也可以带地理坐标
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    Named(String),
    Geo {
        name: String,
        latitude: f64,
        longitude: f64,
    },
}

impl Location {
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) | Self::Geo { name, .. } => name,
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match self {
            Self::Named(_) => None,
            Self::Geo {
                latitude,
                longitude,
                ..
            } => Some((*latitude, *longitude)),
        }
    }

    /// 生成ICS位置信息，有坐标时附带 Apple 结构化位置与 GEO
    pub fn to_ics_lines(&self) -> String {
        let mut lines = format!("LOCATION:{}\r\n", escape_text(self.name()));

        if let Some((latitude, longitude)) = self.coordinates() {
            lines.push_str(&format!(
                "X-APPLE-STRUCTURED-LOCATION;VALUE=URI;X-TITLE={}:geo:{latitude},{longitude}\r\n",
                quote_param_value(self.name())
            ));
            lines.push_str(&format!("GEO:{latitude};{longitude}\r\n"));
        }

        lines
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

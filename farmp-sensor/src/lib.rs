//! Sensor lib for the soil readings reported by the FarmTech field
//! controller over its serial monitor.
//!
//! The controller prints one reading per line in the form
//! `humidity,ph,phosphorus,potassium,pump_status[,notes]`, e.g.
//! `40.0,6.5,SIM,NAO,0`. This crate owns the payload type for such a
//! line ([`SensorSample`]), the tolerant line parser used by the
//! database import path, and a generator of simulated lines for runs
//! without hardware attached.
//!
//! Two generations of the nutrient fields exist:
//!
//! 1. presence markers, where phosphorus / potassium are reported as
//!    `SIM` (present) or `NAO` (absent). This is the canonical format
//!    and the one produced by the current controller firmware.
//! 2. integer levels (0-100) as printed by the earlier firmware. This
//!    format is only used when a caller asks for it explicitly with
//!    [`NutrientFormat::Level`]; a level above zero counts as present.

mod simulate;

pub use simulate::simulate_lines;

use std::str::FromStr;
use thiserror::Error;

/// Minimum number of comma separated fields in a serial line
pub const MIN_FIELDS: usize = 5;

/// Marker printed by the controller when a nutrient is detected
pub const PRESENCE_MARKER: &str = "SIM";

/// Marker printed by the controller when a nutrient is missing
pub const ABSENCE_MARKER: &str = "NAO";

#[derive(Error, Debug, PartialEq)]
pub enum SerialParseError {
    #[error("Expected at least 5 fields, found {0}")]
    TooFewFields(usize),
    #[error("Invalid humidity value {0:?}")]
    Humidity(String),
    #[error("Invalid pH value {0:?}")]
    Ph(String),
    #[error("Non-finite {field} value {value:?}")]
    NonFinite { field: &'static str, value: String },
    #[error("Invalid {field} level {value:?}")]
    NutrientLevel { field: &'static str, value: String },
    #[error("Invalid pump status {0:?}, expected 0 or 1")]
    PumpStatus(String),
    #[error("Unknown nutrient format {0:?}")]
    UnknownFormat(String),
}

/// How the phosphorus / potassium fields of a serial line are read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NutrientFormat {
    /// `SIM` (any case) is present, everything else is absent
    #[default]
    Presence,
    /// Integer level, present when above zero
    Level,
}

impl FromStr for NutrientFormat {
    type Err = SerialParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "presence" => Ok(NutrientFormat::Presence),
            "level" => Ok(NutrientFormat::Level),
            other => Err(SerialParseError::UnknownFormat(other.to_string())),
        }
    }
}

impl NutrientFormat {
    fn parse_flag(&self, field: &'static str, value: &str) -> Result<bool, SerialParseError> {
        match self {
            NutrientFormat::Presence => Ok(value.eq_ignore_ascii_case(PRESENCE_MARKER)),
            NutrientFormat::Level => value
                .parse::<i32>()
                .map(|level| level > 0)
                .map_err(|_| SerialParseError::NutrientLevel {
                    field,
                    value: value.to_string(),
                }),
        }
    }
}

/// One reading as reported by the field controller. The store assigns
/// id and timestamp on insert, so neither is part of the payload
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSample {
    pub humidity: f64,
    pub ph: f64,
    pub phosphorus_present: bool,
    pub potassium_present: bool,
    pub pump_status: bool,
    pub notes: String,
}

impl SensorSample {
    /// Parse a single serial line. Fields are trimmed; a sixth field is
    /// kept as notes and anything after it is ignored
    pub fn parse_line(line: &str, format: NutrientFormat) -> Result<Self, SerialParseError> {
        let fields = line.trim().split(',').map(str::trim).collect::<Vec<_>>();
        if fields.len() < MIN_FIELDS {
            return Err(SerialParseError::TooFewFields(fields.len()));
        }

        let humidity = fields[0]
            .parse::<f64>()
            .map_err(|_| SerialParseError::Humidity(fields[0].to_string()))
            .and_then(|v| finite("humidity", fields[0], v))?;
        let ph = fields[1]
            .parse::<f64>()
            .map_err(|_| SerialParseError::Ph(fields[1].to_string()))
            .and_then(|v| finite("ph", fields[1], v))?;
        let phosphorus_present = format.parse_flag("phosphorus", fields[2])?;
        let potassium_present = format.parse_flag("potassium", fields[3])?;
        let pump_status = parse_pump_status(fields[4])?;
        let notes = fields.get(5).map(|n| n.to_string()).unwrap_or_default();

        Ok(Self {
            humidity,
            ph,
            phosphorus_present,
            potassium_present,
            pump_status,
            notes,
        })
    }

    /// Render the sample back into the presence format line
    pub fn to_line(&self) -> String {
        let marker = |present: bool| {
            if present {
                PRESENCE_MARKER
            } else {
                ABSENCE_MARKER
            }
        };
        let mut line = format!(
            "{},{},{},{},{}",
            self.humidity,
            self.ph,
            marker(self.phosphorus_present),
            marker(self.potassium_present),
            u8::from(self.pump_status)
        );
        if !self.notes.is_empty() {
            line.push(',');
            line.push_str(&self.notes);
        }
        line
    }
}

impl FromStr for SensorSample {
    type Err = SerialParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorSample::parse_line(s, NutrientFormat::Presence)
    }
}

// SQLite binds NaN as NULL, which the NOT NULL measurement columns reject
fn finite(field: &'static str, raw: &str, value: f64) -> Result<f64, SerialParseError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SerialParseError::NonFinite {
            field,
            value: raw.to_string(),
        })
    }
}

fn parse_pump_status(value: &str) -> Result<bool, SerialParseError> {
    match value.parse::<i32>() {
        Ok(0) => Ok(false),
        Ok(1) => Ok(true),
        _ => Err(SerialParseError::PumpStatus(value.to_string())),
    }
}

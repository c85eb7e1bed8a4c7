use std::fmt::Write;
use std::fs;
use std::path::Path;

use chrono::format::{Item, StrftimeItems};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::accumulator::CaptureStamp;
use crate::error::SurveyError;

const MAX_GPS_AGE_SECS: u64 = 86_400;

/// Runtime settings, loadable from TOML. Missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// Key of the project collection in the key-value store.
    pub store_key: String,
    /// Oldest GPS fix accepted when a session starts.
    pub gps_max_age_secs: u64,
    /// strftime pattern for the measurement date.
    pub date_format: String,
    /// strftime pattern for the measurement time.
    pub time_format: String,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            store_key: "results".to_string(),
            gps_max_age_secs: 120,
            date_format: "%m/%d/%Y".to_string(),
            time_format: "%-I:%M:%S %p".to_string(),
        }
    }
}

impl SurveyConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, SurveyError> {
        let config: SurveyConfig =
            toml::from_str(text).map_err(|e| SurveyError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, SurveyError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(SurveyError::Config(format!("{}: {e}", path.display()))),
        }
    }

    pub fn validate(&self) -> Result<(), SurveyError> {
        if self.store_key.trim().is_empty() {
            return Err(SurveyError::Config("store_key must not be empty".to_string()));
        }
        for (name, pattern) in [
            ("date_format", &self.date_format),
            ("time_format", &self.time_format),
        ] {
            if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
                return Err(SurveyError::Config(format!(
                    "{name} '{pattern}' is not a valid strftime pattern"
                )));
            }
        }
        Ok(())
    }

    pub fn gps_max_age(&self) -> Duration {
        Duration::seconds(self.gps_max_age_secs.min(MAX_GPS_AGE_SECS) as i64)
    }

    /// Date and time strings for `captured_at`. A pattern chrono cannot
    /// render is reported instead of panicking.
    pub fn stamp(&self, captured_at: NaiveDateTime) -> Result<CaptureStamp, SurveyError> {
        Ok(CaptureStamp {
            date: render(captured_at, "date_format", &self.date_format)?,
            time: render(captured_at, "time_format", &self.time_format)?,
        })
    }
}

fn render(captured_at: NaiveDateTime, name: &str, pattern: &str) -> Result<String, SurveyError> {
    let mut out = String::new();
    write!(out, "{}", captured_at.format(pattern)).map_err(|_| {
        SurveyError::Config(format!("{name} '{pattern}' cannot be rendered"))
    })?;
    Ok(out)
}

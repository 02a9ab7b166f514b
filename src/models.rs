use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RhythmError;

/// One day of logged data for a user
///
/// The store keeps at most one record per (user, date); re-submitting for
/// the same date replaces the previous values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricRecord {
    /// Calendar date the record belongs to
    pub date: NaiveDate,

    /// Logged wake time, required for cycle generation
    #[serde(default, with = "crate::cycles::optional_time_format")]
    pub wake_time: Option<NaiveTime>,

    /// Heart rate variability (RMSSD, ms)
    #[serde(default)]
    pub hrv: Option<f64>,

    /// Resting heart rate (bpm)
    #[serde(default, alias = "rhr")]
    pub resting_heart_rate: Option<f64>,

    /// Total sleep in hours
    #[serde(default, alias = "sleep")]
    pub sleep_duration_hours: Option<f64>,

    /// Mood check-in, usually a single emoji
    #[serde(default)]
    pub mood: Option<String>,
}

impl BiometricRecord {
    /// Empty record for a date
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            wake_time: None,
            hrv: None,
            resting_heart_rate: None,
            sleep_duration_hours: None,
            mood: None,
        }
    }

    pub fn with_wake_time(mut self, wake_time: NaiveTime) -> Self {
        self.wake_time = Some(wake_time);
        self
    }

    pub fn with_hrv(mut self, hrv: f64) -> Self {
        self.hrv = Some(hrv);
        self
    }

    pub fn with_resting_heart_rate(mut self, rhr: f64) -> Self {
        self.resting_heart_rate = Some(rhr);
        self
    }

    pub fn with_sleep(mut self, hours: f64) -> Self {
        self.sleep_duration_hours = Some(hours);
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    /// Value of a tracked metric, if logged
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Hrv => self.hrv,
            Metric::RestingHeartRate => self.resting_heart_rate,
            Metric::SleepDuration => self.sleep_duration_hours,
        }
    }
}

/// Metrics that support a rolling baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Hrv,
    RestingHeartRate,
    SleepDuration,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Hrv => write!(f, "hrv"),
            Metric::RestingHeartRate => write!(f, "rhr"),
            Metric::SleepDuration => write!(f, "sleep"),
        }
    }
}

impl FromStr for Metric {
    type Err = RhythmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hrv" => Ok(Metric::Hrv),
            "rhr" | "resting_heart_rate" => Ok(Metric::RestingHeartRate),
            "sleep" | "sleep_duration" => Ok(Metric::SleepDuration),
            _ => Err(RhythmError::UnsupportedMetric {
                name: s.to_string(),
            }),
        }
    }
}

/// Per-user cycle preferences as stored by the account layer
///
/// Every field is optional; unset values fall back to the configured
/// schedule defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCycleSettings {
    pub peak_minutes: Option<u32>,
    pub trough_minutes: Option<u32>,
    pub cycle_count: Option<u32>,
    pub grog_minutes: Option<u32>,
}

/// Current weather at the user's location
///
/// Missing fields are substituted with typical values by the vibe scorer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherConditions {
    /// Air temperature (°C)
    pub temperature: Option<f64>,

    /// Dew point (°C)
    pub dew_point: Option<f64>,

    /// Relative humidity (%)
    pub humidity: Option<f64>,

    /// Mean sea level pressure (hPa)
    pub pressure: Option<f64>,
}

impl WeatherConditions {
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.dew_point.is_none()
            && self.humidity.is_none()
            && self.pressure.is_none()
    }
}

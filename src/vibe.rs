//! Vibe (readiness) score
//!
//! A deterministic penalty scorer: start at 100 and subtract a fixed amount
//! for every rule that fires. Categories are independent; within one metric
//! the tiers form a chain where only the most severe tier applies.
//!
//! | Category    | Condition                 | Penalty |
//! |-------------|---------------------------|---------|
//! | Environment | dew point < 10 or > 20    | 2       |
//! | Environment | pressure < 1005 / > 1035  | 2 / 1   |
//! | Environment | temperature < 16 / > 27   | 2 / 2   |
//! | Environment | humidity < 30 / > 70      | 1 / 2   |
//! | Sleep       | < 6h / > 9.5h             | 8 / 3   |
//! | HRV         | < -15% / < -7% / > +25%   | 10/5/4  |
//! | RHR         | > +10% / > +6% / < -15%   | 10/5/2  |
//! | Mood        | strained mood             | 3       |
//!
//! Missing inputs are substituted with typical values so a score can always
//! be produced.

use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

use crate::models::WeatherConditions;

/// Substitution values for missing inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibeDefaults {
    pub hrv: f64,
    pub resting_heart_rate: f64,
    pub sleep_duration_hours: f64,
    pub dew_point: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,

    /// Used when history yields no HRV baseline
    pub baseline_hrv: f64,

    /// Used when history yields no RHR baseline
    pub baseline_resting_heart_rate: f64,
}

impl Default for VibeDefaults {
    fn default() -> Self {
        Self {
            hrv: 60.0,
            resting_heart_rate: 55.0,
            sleep_duration_hours: 7.5,
            dew_point: 12.0,
            temperature: 22.0,
            humidity: 50.0,
            pressure: 1015.0,
            baseline_hrv: 65.0,
            baseline_resting_heart_rate: 54.0,
        }
    }
}

/// Scorer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VibeConfig {
    pub defaults: VibeDefaults,

    /// Mood check-ins that indicate strain or low energy
    pub strained_moods: Vec<String>,
}

impl Default for VibeConfig {
    fn default() -> Self {
        Self {
            defaults: VibeDefaults::default(),
            strained_moods: vec!["😐".to_string(), "😴".to_string(), "😤".to_string()],
        }
    }
}

/// Today's biometrics as logged
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BioInputs {
    pub hrv: Option<f64>,
    pub resting_heart_rate: Option<f64>,
    pub sleep_duration_hours: Option<f64>,
}

/// Personal baselines for deviation rules
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VibeBaselines {
    pub hrv: Option<f64>,
    pub resting_heart_rate: Option<f64>,
}

/// One triggered rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Penalty {
    DewPoint,
    LowPressure,
    HighPressure,
    Cold,
    Heat,
    LowHumidity,
    HighHumidity,
    SleepDebt,
    Oversleep,
    HrvDropSevere,
    HrvDropModerate,
    HrvSpike,
    RhrRiseSevere,
    RhrRiseModerate,
    RhrLow,
    Mood,
}

impl Penalty {
    /// Points deducted from the score
    pub fn points(&self) -> u8 {
        match self {
            Penalty::DewPoint => 2,
            Penalty::LowPressure => 2,
            Penalty::HighPressure => 1,
            Penalty::Cold => 2,
            Penalty::Heat => 2,
            Penalty::LowHumidity => 1,
            Penalty::HighHumidity => 2,
            Penalty::SleepDebt => 8,
            Penalty::Oversleep => 3,
            Penalty::HrvDropSevere => 10,
            Penalty::HrvDropModerate => 5,
            Penalty::HrvSpike => 4,
            Penalty::RhrRiseSevere => 10,
            Penalty::RhrRiseModerate => 5,
            Penalty::RhrLow => 2,
            Penalty::Mood => 3,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Penalty::DewPoint => "Suboptimal dew point",
            Penalty::LowPressure => "Low pressure = fatigue risk",
            Penalty::HighPressure => "High pressure = tension",
            Penalty::Cold => "Cold impairs focus",
            Penalty::Heat => "Overheating risk",
            Penalty::LowHumidity => "Dehydration risk",
            Penalty::HighHumidity => "Sweat evaporation impacted",
            Penalty::SleepDebt => "Sleep debt",
            Penalty::Oversleep => "Possible oversleep",
            Penalty::HrvDropSevere => "HRV drop >15%: stress",
            Penalty::HrvDropModerate => "HRV drop >7%: early strain",
            Penalty::HrvSpike => "HRV spike: possible illness",
            Penalty::RhrRiseSevere => "RHR rise >10%: stress or illness",
            Penalty::RhrRiseModerate => "RHR rise >6%: early strain",
            Penalty::RhrLow => "Bradycardia/adaptation",
            Penalty::Mood => "Mood suggests strain or low energy",
        }
    }
}

impl fmt::Display for Penalty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl Serialize for Penalty {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.message())
    }
}

/// Readiness zone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    Green,
    Yellow,
    Orange,
    Red,
}

impl Zone {
    pub fn from_score(score: u8) -> Self {
        if score >= 90 {
            Zone::Green
        } else if score >= 75 {
            Zone::Yellow
        } else if score >= 60 {
            Zone::Orange
        } else {
            Zone::Red
        }
    }

    /// Advisory text shown with the zone
    pub fn prompt(&self) -> &'static str {
        match self {
            Zone::Green => {
                "You're primed for peak performance. Stack deep work or push physical goals."
            }
            Zone::Yellow => {
                "You're functional, but there’s some underlying strain. Buffer and monitor recovery."
            }
            Zone::Orange => {
                "You’re under strain. Today should prioritize recovery, light work, and recalibration."
            }
            Zone::Red => {
                "Recovery is compromised. Cancel unnecessary strain and restore your system aggressively."
            }
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Green => write!(f, "Green"),
            Zone::Yellow => write!(f, "Yellow"),
            Zone::Orange => write!(f, "Orange"),
            Zone::Red => write!(f, "Red"),
        }
    }
}

/// Resolved data point the score was computed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VibeInputs {
    pub hrv: f64,
    pub rhr: f64,
    pub sleep: f64,
    pub dew_point: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub mood: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VibeScoreResult {
    /// 0-100
    pub score: u8,
    pub zone: Zone,
    /// Triggered rules in table order
    pub penalties: Vec<Penalty>,
    pub prompt: String,
    pub inputs: VibeInputs,
}

impl VibeScoreResult {
    pub fn penalty_messages(&self) -> Vec<&'static str> {
        self.penalties.iter().map(Penalty::message).collect()
    }
}

/// Vibe score calculator
#[derive(Debug, Clone, Default)]
pub struct VibeScorer {
    config: VibeConfig,
}

impl VibeScorer {
    pub fn new(config: VibeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VibeConfig {
        &self.config
    }

    fn positive_or(value: Option<f64>, fallback: f64) -> f64 {
        match value {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => fallback,
        }
    }

    fn finite_or(value: Option<f64>, fallback: f64) -> f64 {
        value.filter(|v| v.is_finite()).unwrap_or(fallback)
    }

    /// Substitute defaults for anything missing
    ///
    /// A biometric reading of zero or less counts as missing; sensors report
    /// 0 when they fail to read.
    pub fn resolve_inputs(
        &self,
        bio: &BioInputs,
        weather: &WeatherConditions,
        mood: &str,
    ) -> VibeInputs {
        let d = &self.config.defaults;
        VibeInputs {
            hrv: Self::positive_or(bio.hrv, d.hrv),
            rhr: Self::positive_or(bio.resting_heart_rate, d.resting_heart_rate),
            sleep: Self::positive_or(bio.sleep_duration_hours, d.sleep_duration_hours),
            dew_point: Self::finite_or(weather.dew_point, d.dew_point),
            temperature: Self::finite_or(weather.temperature, d.temperature),
            humidity: Self::finite_or(weather.humidity, d.humidity),
            pressure: Self::finite_or(weather.pressure, d.pressure),
            mood: mood.trim().to_string(),
        }
    }

    /// Evaluate every rule against a resolved data point
    pub fn penalties(&self, inputs: &VibeInputs, baselines: &VibeBaselines) -> Vec<Penalty> {
        let d = &self.config.defaults;
        let mut penalties = Vec::new();

        // Environment
        if inputs.dew_point < 10.0 || inputs.dew_point > 20.0 {
            penalties.push(Penalty::DewPoint);
        }

        if inputs.pressure < 1005.0 {
            penalties.push(Penalty::LowPressure);
        } else if inputs.pressure > 1035.0 {
            penalties.push(Penalty::HighPressure);
        }

        if inputs.temperature < 16.0 {
            penalties.push(Penalty::Cold);
        } else if inputs.temperature > 27.0 {
            penalties.push(Penalty::Heat);
        }

        if inputs.humidity < 30.0 {
            penalties.push(Penalty::LowHumidity);
        } else if inputs.humidity > 70.0 {
            penalties.push(Penalty::HighHumidity);
        }

        // Sleep
        if inputs.sleep < 6.0 {
            penalties.push(Penalty::SleepDebt);
        } else if inputs.sleep > 9.5 {
            penalties.push(Penalty::Oversleep);
        }

        // Biometric deviation
        let hrv_baseline = Self::positive_or(baselines.hrv, d.baseline_hrv);
        let hrv_dev = (inputs.hrv - hrv_baseline) / hrv_baseline;
        if hrv_dev < -0.15 {
            penalties.push(Penalty::HrvDropSevere);
        } else if hrv_dev < -0.07 {
            penalties.push(Penalty::HrvDropModerate);
        } else if hrv_dev > 0.25 {
            penalties.push(Penalty::HrvSpike);
        }

        let rhr_baseline =
            Self::positive_or(baselines.resting_heart_rate, d.baseline_resting_heart_rate);
        let rhr_dev = (inputs.rhr - rhr_baseline) / rhr_baseline;
        if rhr_dev > 0.10 {
            penalties.push(Penalty::RhrRiseSevere);
        } else if rhr_dev > 0.06 {
            penalties.push(Penalty::RhrRiseModerate);
        } else if rhr_dev < -0.15 {
            penalties.push(Penalty::RhrLow);
        }

        // Mood check-in
        if self.config.strained_moods.iter().any(|m| m == &inputs.mood) {
            penalties.push(Penalty::Mood);
        }

        penalties
    }

    /// Score a day
    pub fn score(
        &self,
        bio: &BioInputs,
        baselines: &VibeBaselines,
        weather: &WeatherConditions,
        mood: &str,
    ) -> VibeScoreResult {
        let inputs = self.resolve_inputs(bio, weather, mood);
        let penalties = self.penalties(&inputs, baselines);

        let deducted: i32 = penalties.iter().map(|p| i32::from(p.points())).sum();
        let score = (100 - deducted).clamp(0, 100) as u8;
        let zone = Zone::from_score(score);

        tracing::debug!(score, %zone, triggered = penalties.len(), "Calculated vibe score");

        VibeScoreResult {
            score,
            zone,
            penalties,
            prompt: zone.prompt().to_string(),
            inputs,
        }
    }
}

/// Score with the stock defaults and mood set
pub fn calculate_vibe_score(
    bio: &BioInputs,
    baselines: &VibeBaselines,
    weather: &WeatherConditions,
    mood: &str,
) -> VibeScoreResult {
    VibeScorer::default().score(bio, baselines, weather, mood)
}

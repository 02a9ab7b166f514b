use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cycles::{check_cycle_count, CycleDefaults};
use crate::error::RhythmError;
use crate::logging::LogConfig;
use crate::planner::{PlannerSettings, DEFAULT_HISTORY_LIMIT};
use crate::vibe::VibeConfig;
use crate::vital::VitalIndexConfig;
use crate::weather::Location;

/// Main application configuration
///
/// Every section is optional in the TOML file; missing sections take their
/// defaults. The loaded value is immutable and passed into calculators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Cycle defaults for users without stored preferences
    pub schedule: CycleDefaults,

    /// Vital index window, rounding and status policy
    pub vital: VitalIndexConfig,

    /// Vibe score substitution defaults and mood set
    pub vibe: VibeConfig,

    /// Weather lookup settings
    pub weather: WeatherSettings,

    /// History fetched per request
    pub history_limit: usize,

    /// Logging setup
    pub logging: LogConfig,
}

/// Weather lookup settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherSettings {
    /// Location used when a request does not supply one
    pub default_location: Location,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            default_location: Location::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            schedule: CycleDefaults::default(),
            vital: VitalIndexConfig::default(),
            vibe: VibeConfig::default(),
            weather: WeatherSettings::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            logging: LogConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rhythmrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "Config file not loaded, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Reject settings that would make every calculation degenerate
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| -> Result<()> { Err(RhythmError::Configuration(reason).into()) };

        if let Err(err) = check_cycle_count(self.schedule.cycle_count) {
            return invalid(format!("schedule.cycle_count: {}", err));
        }
        if self.vital.window_size == 0 {
            return invalid("vital.window_size must be at least 1".to_string());
        }
        if self.vital.min_points < 2 {
            return invalid("vital.min_points must be at least 2".to_string());
        }
        if self.vibe.defaults.baseline_hrv <= 0.0 || self.vibe.defaults.baseline_resting_heart_rate <= 0.0 {
            return invalid("vibe baseline fallbacks must be positive".to_string());
        }
        if self.history_limit <= self.vital.window_size {
            return invalid(format!(
                "history_limit ({}) must exceed vital.window_size ({})",
                self.history_limit, self.vital.window_size
            ));
        }
        Ok(())
    }

    /// Calculator settings for the planner
    pub fn planner_settings(&self) -> PlannerSettings {
        PlannerSettings {
            schedule: self.schedule,
            vital: self.vital,
            vibe: self.vibe.clone(),
            history_limit: Some(self.history_limit),
        }
    }
}

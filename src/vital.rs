//! Vital index: today's HRV as a percentage of the rolling baseline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::baseline::{BaselineCalculator, BaselineConfig, HrvFilter};
use crate::models::{BiometricRecord, Metric};

/// How an index maps to a status
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusPolicy {
    /// Above iff index > `upper`, below iff index < `lower`
    ToleranceBand { lower: f64, upper: f64 },
    /// Any deviation from 100 counts (legacy behaviour)
    Symmetric,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        StatusPolicy::ToleranceBand {
            lower: 90.0,
            upper: 110.0,
        }
    }
}

impl StatusPolicy {
    pub fn classify(&self, index: f64) -> VitalStatus {
        let (lower, upper) = match self {
            StatusPolicy::ToleranceBand { lower, upper } => (*lower, *upper),
            StatusPolicy::Symmetric => (100.0, 100.0),
        };

        if index > upper {
            VitalStatus::AboveBaseline
        } else if index < lower {
            VitalStatus::BelowBaseline
        } else {
            VitalStatus::Baseline
        }
    }
}

/// Position of today's HRV relative to baseline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VitalStatus {
    #[serde(rename = "above baseline")]
    AboveBaseline,
    #[serde(rename = "below baseline")]
    BelowBaseline,
    #[serde(rename = "baseline")]
    Baseline,
}

impl fmt::Display for VitalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VitalStatus::AboveBaseline => write!(f, "above baseline"),
            VitalStatus::BelowBaseline => write!(f, "below baseline"),
            VitalStatus::Baseline => write!(f, "baseline"),
        }
    }
}

/// Vital index settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VitalIndexConfig {
    /// Prior days averaged into the baseline (default: 7)
    pub window_size: usize,

    /// Minimum qualifying days, today included (default: 2)
    pub min_points: usize,

    /// Decimal places kept on the index (default: 0)
    pub decimals: u32,

    /// Status thresholds (default: 90/110 tolerance band)
    pub policy: StatusPolicy,

    /// HRV plausibility filter (default: lenient)
    pub filter: HrvFilter,
}

impl Default for VitalIndexConfig {
    fn default() -> Self {
        Self {
            window_size: 7,
            min_points: 2,
            decimals: 0,
            policy: StatusPolicy::default(),
            filter: HrvFilter::default(),
        }
    }
}

impl VitalIndexConfig {
    pub fn baseline_config(&self) -> BaselineConfig {
        BaselineConfig {
            window_size: self.window_size,
            min_points: self.min_points,
            hrv_filter: self.filter,
        }
    }
}

/// Result of a vital index calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VitalIndexResult {
    pub vital_index: f64,
    pub today_hrv: f64,
    pub baseline_hrv: f64,
    pub status: VitalStatus,
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Vital index calculator
#[derive(Debug, Clone, Default)]
pub struct VitalIndexCalculator {
    config: VitalIndexConfig,
}

impl VitalIndexCalculator {
    pub fn new(config: VitalIndexConfig) -> Self {
        Self { config }
    }

    /// Compute the index for `today` from recent history
    ///
    /// Returns `None` when today has no qualifying HRV or when fewer than
    /// `min_points` qualifying days exist.
    pub fn calculate(
        &self,
        records: &[BiometricRecord],
        today: NaiveDate,
    ) -> Option<VitalIndexResult> {
        let baseline = BaselineCalculator::new(self.config.baseline_config());
        let window = baseline.window(records, Metric::Hrv, today)?;
        let today_hrv = window.today?;

        let vital_index = round_to(today_hrv / window.baseline * 100.0, self.config.decimals);
        let status = self.config.policy.classify(vital_index);

        tracing::debug!(
            %today,
            today_hrv,
            baseline_hrv = window.baseline,
            vital_index,
            %status,
            "Calculated vital index"
        );

        Some(VitalIndexResult {
            vital_index,
            today_hrv,
            baseline_hrv: round_to(window.baseline, 2),
            status,
        })
    }
}

/// Vital index with the default window, rounding and tolerance band
pub fn calculate_vital_index(
    records: &[BiometricRecord],
    today: NaiveDate,
) -> Option<VitalIndexResult> {
    VitalIndexCalculator::default().calculate(records, today)
}

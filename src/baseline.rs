//! Rolling personal baselines
//!
//! A baseline is the mean of a metric over the most recent `window_size`
//! days before the evaluation day that logged it. The evaluation day itself
//! and anything dated after it never contribute. When
//! too few days qualify the result is `None` ("not enough data"), never an
//! error.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::Result;
use crate::models::{BiometricRecord, Metric};

/// Default number of prior days averaged into a baseline
pub const DEFAULT_BASELINE_WINDOW: usize = 7;

/// Default minimum number of qualifying days, evaluation day included
pub const DEFAULT_MIN_POINTS: usize = 2;

/// Plausibility filter applied to HRV readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum HrvFilter {
    /// Any logged value qualifies
    Lenient,
    /// Values at or below `floor` are treated as measurement errors
    Strict { floor: f64 },
}

impl Default for HrvFilter {
    fn default() -> Self {
        HrvFilter::Lenient
    }
}

impl HrvFilter {
    /// Strict filter with the usual 30ms floor
    pub fn strict() -> Self {
        HrvFilter::Strict { floor: 30.0 }
    }

    pub fn accepts(&self, hrv: f64) -> bool {
        match self {
            HrvFilter::Lenient => true,
            HrvFilter::Strict { floor } => hrv > *floor,
        }
    }
}

/// Baseline window settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Prior days averaged (default: 7)
    pub window_size: usize,

    /// Minimum qualifying days including the evaluation day (default: 2)
    pub min_points: usize,

    /// HRV plausibility filter
    pub hrv_filter: HrvFilter,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_BASELINE_WINDOW,
            min_points: DEFAULT_MIN_POINTS,
            hrv_filter: HrvFilter::default(),
        }
    }
}

/// Resolved window for one metric on one evaluation day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineWindow {
    pub metric: Metric,

    /// Evaluation day's value, if it qualified
    pub today: Option<f64>,

    /// Prior values used for the mean, newest first
    pub values: Vec<f64>,

    /// Mean of `values`
    pub baseline: f64,
}

impl BaselineWindow {
    /// Fractional deviation of today's value from baseline
    pub fn deviation(&self) -> Option<f64> {
        self.today.map(|today| (today - self.baseline) / self.baseline)
    }
}

/// Baseline calculator over a user's record history
#[derive(Debug, Clone, Default)]
pub struct BaselineCalculator {
    config: BaselineConfig,
}

impl BaselineCalculator {
    pub fn new(config: BaselineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BaselineConfig {
        &self.config
    }

    fn qualifies(&self, metric: Metric, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        match metric {
            Metric::Hrv => self.config.hrv_filter.accepts(value),
            Metric::RestingHeartRate | Metric::SleepDuration => true,
        }
    }

    /// Build the baseline window for `metric` as of `today`
    ///
    /// Records may arrive in any order; they are considered newest first.
    pub fn window(
        &self,
        records: &[BiometricRecord],
        metric: Metric,
        today: NaiveDate,
    ) -> Option<BaselineWindow> {
        let mut qualifying: Vec<(NaiveDate, f64)> = records
            .iter()
            .filter_map(|r| r.metric(metric).map(|v| (r.date, v)))
            .filter(|(_, v)| self.qualifies(metric, *v))
            .collect();
        qualifying.sort_by(|a, b| b.0.cmp(&a.0));

        let today_value = qualifying
            .iter()
            .find(|(date, _)| *date == today)
            .map(|(_, v)| *v);

        let values: Vec<f64> = qualifying
            .iter()
            .filter(|(date, _)| *date < today)
            .take(self.config.window_size)
            .map(|(_, v)| *v)
            .collect();

        let points = values.len() + usize::from(today_value.is_some());
        if values.is_empty() || points < self.config.min_points {
            tracing::debug!(
                metric = %metric,
                points,
                required = self.config.min_points,
                "Insufficient data for baseline"
            );
            return None;
        }

        let baseline = values.iter().mean();
        if baseline == 0.0 {
            return None;
        }

        Some(BaselineWindow {
            metric,
            today: today_value,
            values,
            baseline,
        })
    }

    /// Baseline mean for `metric`, or `None` when data is insufficient
    pub fn baseline(
        &self,
        records: &[BiometricRecord],
        metric: Metric,
        today: NaiveDate,
    ) -> Option<f64> {
        self.window(records, metric, today).map(|w| w.baseline)
    }

    /// Baseline lookup by metric name
    ///
    /// Fails with `UnsupportedMetric` for names outside hrv/rhr/sleep.
    pub fn baseline_by_name(
        &self,
        records: &[BiometricRecord],
        metric: &str,
        today: NaiveDate,
    ) -> Result<Option<f64>> {
        let metric: Metric = metric.parse()?;
        Ok(self.baseline(records, metric, today))
    }
}

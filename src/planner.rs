//! Daily planning over external collaborators
//!
//! The request layer owns storage, auth and transport. This module holds the
//! glue it would otherwise repeat: resolve the user's stored settings and the
//! day's record, then hand plain values to the pure calculators. The "current
//! date" is always passed in.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::baseline::BaselineCalculator;
use crate::cycles::{time_format, CycleDefaults, CycleEvent, CycleParameters, CycleScheduler};
use crate::error::{Result, RhythmError};
use crate::models::{BiometricRecord, Metric, UserCycleSettings};
use crate::vibe::{BioInputs, VibeBaselines, VibeConfig, VibeScoreResult, VibeScorer};
use crate::vital::{VitalIndexCalculator, VitalIndexConfig, VitalIndexResult};
use crate::weather::{resolve_weather, Location, WeatherProvider};

/// Default number of history records fetched for baselines
pub const DEFAULT_HISTORY_LIMIT: usize = 30;

/// Read access to stored user data
pub trait RecordStore {
    /// Record for exactly `date`, if logged
    fn daily_record(&self, user: &str, date: NaiveDate) -> Option<BiometricRecord>;

    /// Up to `limit` records dated on or before `until`, newest first
    fn recent_records(&self, user: &str, until: NaiveDate, limit: usize) -> Vec<BiometricRecord>;

    /// Stored cycle preferences
    fn cycle_settings(&self, user: &str) -> UserCycleSettings;
}

/// In-memory record store keyed by (user, date)
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    records: BTreeMap<(String, NaiveDate), BiometricRecord>,
    settings: HashMap<String, UserCycleSettings>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for (user, record.date)
    ///
    /// Returns the record it replaced.
    pub fn upsert(&mut self, user: &str, record: BiometricRecord) -> Option<BiometricRecord> {
        self.records.insert((user.to_string(), record.date), record)
    }

    pub fn extend<I>(&mut self, user: &str, records: I)
    where
        I: IntoIterator<Item = BiometricRecord>,
    {
        for record in records {
            self.upsert(user, record);
        }
    }

    pub fn set_cycle_settings(&mut self, user: &str, settings: UserCycleSettings) {
        self.settings.insert(user.to_string(), settings);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for InMemoryStore {
    fn daily_record(&self, user: &str, date: NaiveDate) -> Option<BiometricRecord> {
        self.records.get(&(user.to_string(), date)).cloned()
    }

    fn recent_records(&self, user: &str, until: NaiveDate, limit: usize) -> Vec<BiometricRecord> {
        let start = (user.to_string(), NaiveDate::MIN);
        let end = (user.to_string(), until);
        self.records
            .range(start..=end)
            .rev()
            .take(limit)
            .map(|(_, record)| record.clone())
            .collect()
    }

    fn cycle_settings(&self, user: &str) -> UserCycleSettings {
        self.settings.get(user).cloned().unwrap_or_default()
    }
}

/// Calculator settings shared by all planner requests
#[derive(Debug, Clone, Default)]
pub struct PlannerSettings {
    pub schedule: CycleDefaults,
    pub vital: VitalIndexConfig,
    pub vibe: VibeConfig,
    pub history_limit: Option<usize>,
}

/// A generated schedule with the inputs that produced it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CyclePlan {
    pub date: NaiveDate,
    #[serde(with = "time_format")]
    pub wake_time: NaiveTime,
    pub parameters: CycleParameters,
    pub cycles: Vec<CycleEvent>,
}

/// Request-level orchestration over a store and a weather source
pub struct DailyPlanner<S, W> {
    store: S,
    weather: W,
    settings: PlannerSettings,
}

impl<S: RecordStore, W: WeatherProvider> DailyPlanner<S, W> {
    pub fn new(store: S, weather: W, settings: PlannerSettings) -> Self {
        Self {
            store,
            weather,
            settings,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    fn history(&self, user: &str, until: NaiveDate) -> Vec<BiometricRecord> {
        let limit = self.settings.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        self.store.recent_records(user, until, limit)
    }

    /// Build the cycle schedule for `date` from the logged wake time
    ///
    /// Fails with `RecordNotFound` when nothing (or no wake time) is logged.
    pub fn plan_cycles(
        &self,
        user: &str,
        date: NaiveDate,
        overrides: &UserCycleSettings,
    ) -> Result<CyclePlan> {
        let wake_time = self
            .store
            .daily_record(user, date)
            .and_then(|record| record.wake_time)
            .ok_or(RhythmError::RecordNotFound { date })?;

        let stored = self.store.cycle_settings(user);
        let parameters =
            CycleParameters::resolve(wake_time, &self.settings.schedule, &stored, overrides)?;
        let cycles = CycleScheduler::generate(&parameters, date)?;

        tracing::info!(user, %date, cycles = cycles.len(), "Planned ultradian cycles");

        Ok(CyclePlan {
            date,
            wake_time,
            parameters,
            cycles,
        })
    }

    /// Vital index for `today`, `None` when history is too thin
    pub fn vital_index(&self, user: &str, today: NaiveDate) -> Option<VitalIndexResult> {
        let records = self.history(user, today);
        VitalIndexCalculator::new(self.settings.vital).calculate(&records, today)
    }

    /// Vibe score from the latest record, history baselines and weather
    ///
    /// An explicit `mood` wins over the mood stored on the record.
    pub fn vibe_score(
        &self,
        user: &str,
        today: NaiveDate,
        location: Location,
        mood: Option<&str>,
    ) -> VibeScoreResult {
        let records = self.history(user, today);
        let latest = records.first();

        let bio = latest
            .map(|r| BioInputs {
                hrv: r.hrv,
                resting_heart_rate: r.resting_heart_rate,
                sleep_duration_hours: r.sleep_duration_hours,
            })
            .unwrap_or_default();

        let evaluation_date = latest.map(|r| r.date).unwrap_or(today);
        let baseline = BaselineCalculator::new(self.settings.vital.baseline_config());
        let baselines = VibeBaselines {
            hrv: baseline.baseline(&records, Metric::Hrv, evaluation_date),
            resting_heart_rate: baseline.baseline(&records, Metric::RestingHeartRate, evaluation_date),
        };

        let mood = mood
            .or_else(|| latest.and_then(|r| r.mood.as_deref()))
            .unwrap_or("");

        let weather = resolve_weather(&self.weather, location);

        VibeScorer::new(self.settings.vibe.clone()).score(&bio, &baselines, &weather, mood)
    }
}

fn invalid_date(reason: &str) -> RhythmError {
    RhythmError::InvalidDate {
        reason: reason.to_string(),
    }
}

fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Validate a requested day, filling missing parts from `today`
pub fn resolve_target_date(
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    today: NaiveDate,
) -> Result<NaiveDate> {
    let month = month.unwrap_or_else(|| today.month());
    if !(1..=12).contains(&month) {
        return Err(invalid_date("Month must be between 1 and 12"));
    }

    let year = year.unwrap_or_else(|| today.year());
    if year < 1900 || year > today.year() {
        return Err(invalid_date("Year must be between 1900 and the current year"));
    }

    let day = day.unwrap_or_else(|| today.day());
    if !(1..=31).contains(&day) {
        return Err(invalid_date("Day must be between 1 and 31"));
    }
    if month == 2 && day > 29 {
        return Err(invalid_date("February cannot have more than 29 days"));
    }
    if matches!(month, 4 | 6 | 9 | 11) && day > 30 {
        return Err(invalid_date("This month cannot have more than 30 days"));
    }
    if month == 2 && day == 29 && !is_leap_year(year) {
        return Err(invalid_date("February 29 is only valid in leap years"));
    }

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| invalid_date("Invalid date format"))
}

//! Ultradian cycle scheduling
//!
//! Expands a wake time into an ordered run of alternating peak/trough
//! intervals. The first peak begins after a "morning grog" delay and each
//! cycle starts exactly where the previous trough ended.
//!
//! # Clock arithmetic
//!
//! Times are plain time-of-day values. A schedule that runs past midnight
//! wraps on the clock face (`23:50 + 20min = 00:10:00`) and keeps the
//! generation date; no date carry happens here.

use chrono::{Duration, NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, RhythmError};
use crate::models::UserCycleSettings;

/// Canonical wire format for every time field
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Short form accepted from collaborators that drop seconds
pub const SHORT_TIME_FORMAT: &str = "%H:%M";

/// Parse a wake time in `HH:MM:SS` or `HH:MM` form
pub fn parse_wake_time(input: &str) -> Result<NaiveTime> {
    let trimmed = input.trim();
    let parsed = NaiveTime::parse_from_str(trimmed, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(trimmed, SHORT_TIME_FORMAT))
        .map_err(|_| RhythmError::InvalidTimeFormat {
            input: input.to_string(),
        })?;

    // chrono represents :60 as a leap second; a wake time never has one
    if parsed.nanosecond() >= 1_000_000_000 {
        return Err(RhythmError::InvalidTimeFormat {
            input: input.to_string(),
        });
    }

    Ok(parsed)
}

/// Upper bound on cycles in one schedule (30-minute cycles around the clock)
pub const MAX_CYCLES: u32 = 48;

/// Add whole minutes on the 24h clock face, wrapping past midnight
fn add_minutes(time: NaiveTime, minutes: u32) -> NaiveTime {
    time.overflowing_add_signed(Duration::minutes(i64::from(minutes))).0
}

/// Reject cycle counts above [`MAX_CYCLES`]
pub fn check_cycle_count(requested: u32) -> Result<()> {
    if requested > MAX_CYCLES {
        return Err(RhythmError::TooManyCycles {
            requested,
            max: MAX_CYCLES,
        });
    }
    Ok(())
}

/// Configured cycle defaults used when a user has no stored preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleDefaults {
    /// Length of each peak phase in minutes (default: 90)
    pub peak_minutes: u32,

    /// Length of each trough phase in minutes (default: 20)
    pub trough_minutes: u32,

    /// Number of peak+trough pairs (default: 5)
    pub cycle_count: u32,

    /// Delay between waking and the first peak in minutes (default: 20)
    pub grog_minutes: u32,
}

impl Default for CycleDefaults {
    fn default() -> Self {
        Self {
            peak_minutes: 90,
            trough_minutes: 20,
            cycle_count: 5,
            grog_minutes: 20,
        }
    }
}

/// Fully resolved input for one schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleParameters {
    #[serde(with = "time_format")]
    pub wake_time: NaiveTime,
    pub peak_minutes: u32,
    pub trough_minutes: u32,
    pub cycle_count: u32,
    pub grog_minutes: u32,
}

impl CycleParameters {
    /// Parameters using the stock defaults for a given wake time
    pub fn new(wake_time: NaiveTime) -> Self {
        Self::from_defaults(wake_time, &CycleDefaults::default())
    }

    pub fn from_defaults(wake_time: NaiveTime, defaults: &CycleDefaults) -> Self {
        Self {
            wake_time,
            peak_minutes: defaults.peak_minutes,
            trough_minutes: defaults.trough_minutes,
            cycle_count: defaults.cycle_count,
            grog_minutes: defaults.grog_minutes,
        }
    }

    /// Layer explicit overrides over stored user settings over defaults
    ///
    /// Fails with `TooManyCycles` when the winning count exceeds [`MAX_CYCLES`].
    pub fn resolve(
        wake_time: NaiveTime,
        defaults: &CycleDefaults,
        stored: &UserCycleSettings,
        overrides: &UserCycleSettings,
    ) -> Result<Self> {
        let pick = |over: Option<u32>, user: Option<u32>, fallback: u32| {
            over.or(user).unwrap_or(fallback)
        };

        let params = Self {
            wake_time,
            peak_minutes: pick(overrides.peak_minutes, stored.peak_minutes, defaults.peak_minutes),
            trough_minutes: pick(
                overrides.trough_minutes,
                stored.trough_minutes,
                defaults.trough_minutes,
            ),
            cycle_count: pick(overrides.cycle_count, stored.cycle_count, defaults.cycle_count),
            grog_minutes: pick(overrides.grog_minutes, stored.grog_minutes, defaults.grog_minutes),
        };
        check_cycle_count(params.cycle_count)?;
        Ok(params)
    }

    /// Start of the first peak (wake time plus grog)
    pub fn first_peak_start(&self) -> NaiveTime {
        add_minutes(self.wake_time, self.grog_minutes)
    }
}

/// One peak+trough pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleEvent {
    /// 1-based position in the schedule
    #[serde(rename = "cycle")]
    pub cycle_index: u32,

    #[serde(with = "time_format")]
    pub peak_start: NaiveTime,

    #[serde(with = "time_format")]
    pub peak_end: NaiveTime,

    /// Always equal to `peak_end`
    #[serde(with = "time_format")]
    pub trough_start: NaiveTime,

    #[serde(with = "time_format")]
    pub trough_end: NaiveTime,

    /// Date the schedule was generated for
    pub date: NaiveDate,
}

impl CycleEvent {
    /// True if either phase wraps past midnight
    pub fn crosses_midnight(&self) -> bool {
        self.peak_end < self.peak_start || self.trough_end < self.trough_start
    }

    /// Split into its peak and trough phases
    pub fn phases(&self) -> [PhaseEvent; 2] {
        [
            PhaseEvent {
                cycle_index: self.cycle_index,
                kind: PhaseKind::Peak,
                start: self.peak_start,
                end: self.peak_end,
            },
            PhaseEvent {
                cycle_index: self.cycle_index,
                kind: PhaseKind::Trough,
                start: self.trough_start,
                end: self.trough_end,
            },
        ]
    }
}

/// Phase within a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    /// High-alertness interval
    Peak,
    /// Recovery interval
    Trough,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhaseKind::Peak => write!(f, "peak"),
            PhaseKind::Trough => write!(f, "trough"),
        }
    }
}

impl FromStr for PhaseKind {
    type Err = RhythmError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "peak" => Ok(PhaseKind::Peak),
            "trough" => Ok(PhaseKind::Trough),
            _ => Err(RhythmError::InvalidPhaseKind {
                kind: s.to_string(),
            }),
        }
    }
}

/// Single peak or trough interval, the unit the record store persists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseEvent {
    #[serde(rename = "cycle")]
    pub cycle_index: u32,

    #[serde(rename = "event_type")]
    pub kind: PhaseKind,

    #[serde(rename = "start_time", with = "time_format")]
    pub start: NaiveTime,

    #[serde(rename = "end_time", with = "time_format")]
    pub end: NaiveTime,
}

impl PhaseEvent {
    /// Whether `time` falls inside `[start, end)`, honouring midnight wrap
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

/// Flatten a schedule into alternating peak/trough phases
pub fn flatten_phases(cycles: &[CycleEvent]) -> Vec<PhaseEvent> {
    cycles.iter().flat_map(CycleEvent::phases).collect()
}

/// Find the cycle and phase containing `time`, if any
pub fn phase_at(cycles: &[CycleEvent], time: NaiveTime) -> Option<(u32, PhaseKind)> {
    cycles
        .iter()
        .flat_map(CycleEvent::phases)
        .find(|phase| phase.contains(time))
        .map(|phase| (phase.cycle_index, phase.kind))
}

/// Ultradian cycle generator
pub struct CycleScheduler;

impl CycleScheduler {
    /// Generate the schedule for resolved parameters
    ///
    /// Events are returned in index order and tile contiguously: each
    /// cycle's `peak_start` equals the previous cycle's `trough_end`.
    /// `cycle_count = 0` yields an empty schedule; counts above
    /// [`MAX_CYCLES`] fail with `TooManyCycles`.
    pub fn generate(params: &CycleParameters, date: NaiveDate) -> Result<Vec<CycleEvent>> {
        check_cycle_count(params.cycle_count)?;

        tracing::debug!(
            wake_time = %params.wake_time.format(TIME_FORMAT),
            peak = params.peak_minutes,
            trough = params.trough_minutes,
            cycles = params.cycle_count,
            grog = params.grog_minutes,
            "Generating ultradian cycles"
        );

        let mut cursor = params.first_peak_start();
        let mut events = Vec::new();

        for cycle_index in 1..=params.cycle_count {
            let peak_start = cursor;
            let peak_end = add_minutes(peak_start, params.peak_minutes);
            let trough_start = peak_end;
            let trough_end = add_minutes(trough_start, params.trough_minutes);

            events.push(CycleEvent {
                cycle_index,
                peak_start,
                peak_end,
                trough_start,
                trough_end,
                date,
            });

            cursor = trough_end;
        }

        Ok(events)
    }
}

/// Parse the wake time and generate a schedule in one call
pub fn generate_cycles(
    wake_time: &str,
    peak_minutes: u32,
    trough_minutes: u32,
    cycle_count: u32,
    grog_minutes: u32,
    date: NaiveDate,
) -> Result<Vec<CycleEvent>> {
    let params = CycleParameters {
        wake_time: parse_wake_time(wake_time)?,
        peak_minutes,
        trough_minutes,
        cycle_count,
        grog_minutes,
    };
    CycleScheduler::generate(&params, date)
}

// Serde helpers for HH:MM:SS time fields
pub(crate) mod time_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(super::TIME_FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_wake_time(&raw).map_err(serde::de::Error::custom)
    }
}

pub(crate) mod optional_time_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(time: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match time {
            Some(t) => serializer.collect_str(&t.format(super::TIME_FORMAT)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => super::parse_wake_time(s)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}

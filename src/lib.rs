// Library interface for RhythmRS modules
// Calculators are pure; storage, transport and the clock stay with the caller

pub mod baseline;
pub mod config;
pub mod cycles;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod planner;
pub mod vibe;
pub mod vital;
pub mod weather;

// Re-export commonly used types for convenience
pub use models::*;
pub use baseline::{BaselineCalculator, BaselineConfig, HrvFilter};
pub use cycles::{generate_cycles, CycleEvent, CycleParameters, CycleScheduler, PhaseKind};
pub use vital::{calculate_vital_index, VitalIndexCalculator, VitalIndexResult, VitalStatus};
pub use vibe::{calculate_vibe_score, VibeScoreResult, VibeScorer, Zone};
pub use planner::{DailyPlanner, InMemoryStore, RecordStore};
pub use weather::{Location, WeatherProvider};
pub use config::AppConfig;
pub use error::{RhythmError, Result};
pub use logging::{LogConfig, LogLevel, LogFormat};

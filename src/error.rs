//! Unified error hierarchy for RhythmRS
//!
//! Computation in this crate is pure, so the taxonomy is small: malformed
//! client input, programmer errors at call sites, and the collaborator
//! failures that the planner and importers can surface.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all RhythmRS operations
#[derive(Debug, Error)]
pub enum RhythmError {
    /// Wake time or phase time did not match `HH:MM:SS` / `HH:MM`
    #[error("Invalid time format: '{input}' (expected HH:MM:SS or HH:MM)")]
    InvalidTimeFormat { input: String },

    /// Baseline requested for a metric we do not track
    #[error("Unsupported metric: {name}")]
    UnsupportedMetric { name: String },

    /// Phase type other than peak/trough
    #[error("Invalid phase type: {kind}")]
    InvalidPhaseKind { kind: String },

    /// Schedule asked for more cycles than fit in a day
    #[error("Too many cycles: {requested} (at most {max})")]
    TooManyCycles { requested: u32, max: u32 },

    /// Requested calendar date failed validation
    #[error("Invalid date: {reason}")]
    InvalidDate { reason: String },

    /// No daily record (or no wake time) stored for the date
    #[error("No wake time logged for {date}")]
    RecordNotFound { date: NaiveDate },

    /// Weather lookup failed or returned an unreadable payload
    #[error("Weather lookup failed: {0}")]
    Weather(String),

    /// Import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Biometric history import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// Unsupported file extension
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Row or document could not be parsed
    #[error("Parse error in {format} at {location}: {reason}")]
    ParseError {
        format: String,
        location: String,
        reason: String,
    },

    /// Required column absent from the header
    #[error("Missing required column: {column}")]
    MissingColumn { column: String },

    /// File could not be opened
    #[error("Cannot read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Result type alias for RhythmRS operations
pub type Result<T> = std::result::Result<T, RhythmError>;

impl RhythmError {
    /// Whether the error was caused by caller-supplied input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            RhythmError::InvalidTimeFormat { .. }
                | RhythmError::InvalidPhaseKind { .. }
                | RhythmError::TooManyCycles { .. }
                | RhythmError::InvalidDate { .. }
                | RhythmError::RecordNotFound { .. }
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RhythmError::InvalidTimeFormat { .. } => ErrorSeverity::Warning,
            RhythmError::InvalidPhaseKind { .. } => ErrorSeverity::Warning,
            RhythmError::TooManyCycles { .. } => ErrorSeverity::Warning,
            RhythmError::InvalidDate { .. } => ErrorSeverity::Warning,
            RhythmError::RecordNotFound { .. } => ErrorSeverity::Info,
            RhythmError::Weather(_) => ErrorSeverity::Warning,
            RhythmError::UnsupportedMetric { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            RhythmError::InvalidTimeFormat { input } => {
                format!("'{}' is not a valid time. Use HH:MM:SS, e.g. 06:30:00", input)
            }
            RhythmError::RecordNotFound { date } => {
                format!("No wake time logged for {}. Log your wake time first.", date)
            }
            RhythmError::Weather(_) => {
                "Weather data is unavailable, typical conditions were assumed.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Programmer error that should have been caught at the call site
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

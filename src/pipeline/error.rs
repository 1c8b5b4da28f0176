//! Error types and reporting for pipeline stations.

use std::fmt;
use std::sync::Mutex;

/// Errors that can occur during station processing.
#[derive(Debug, Clone, PartialEq)]
pub enum StationError {
    /// Recoverable error that allows the station to continue processing.
    Recoverable(String),
    /// Fatal error that requires the station to shut down.
    Fatal(String),
}

impl StationError {
    /// Returns true for errors that end the stream.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StationError::Fatal(_))
    }
}

impl fmt::Display for StationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StationError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            StationError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for StationError {}

/// Trait for reporting station errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a station.
    fn report(&self, station: &str, error: &StationError);
}

/// Simple error reporter that logs to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, station: &str, error: &StationError) {
        eprintln!("[{}] {}", station, error);
    }
}

/// Reporter that discards everything (used with `--quiet`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;

impl ErrorReporter for SilentReporter {
    fn report(&self, _station: &str, _error: &StationError) {}
}

/// Reporter that keeps every report in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    reports: Mutex<Vec<(String, StationError)>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all reports received so far, in order.
    pub fn reports(&self) -> Vec<(String, StationError)> {
        match self.reports.lock() {
            Ok(reports) => reports.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.reports().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, station: &str, error: &StationError) {
        let entry = (station.to_string(), error.clone());
        match self.reports.lock() {
            Ok(mut reports) => reports.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

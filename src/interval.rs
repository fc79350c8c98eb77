//! Raw operation intervals and the analysis window
//!
//! An [`OperationInterval`] is one ISA-88 operation as it was recorded: a
//! start, an end that may still be open, and the unit and batch it ran on.
//! The engine never mutates these; normalization produces new segments.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors in the interval data or the requested window
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("Invalid analysis window: start {start} is not before end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Operation '{operation}' on unit '{unit_id}' (batch '{batch_id}') ends at {end}, before its start {start}")]
    EndBeforeStart {
        operation: String,
        unit_id: String,
        batch_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Operations '{first}' and '{second}' overlap on unit '{unit_id}' (batch '{batch_id}') at {at}")]
    OverlapRejected {
        unit_id: String,
        batch_id: String,
        first: String,
        second: String,
        at: DateTime<Utc>,
    },
}

/// One recorded operation on a unit
///
/// Field names on the wire follow the recording format
/// (`timestamp_start`, `timestamp_end`); a null or absent end means the
/// operation was still running when the data was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationInterval {
    #[serde(rename = "timestamp_start", alias = "start")]
    pub start: DateTime<Utc>,

    #[serde(rename = "timestamp_end", alias = "end", default)]
    pub end: Option<DateTime<Utc>>,

    pub operation: String,

    #[serde(default)]
    pub unit_id: String,

    #[serde(default)]
    pub batch_id: String,
}

impl OperationInterval {
    /// Closed interval on a unit
    pub fn new(
        operation: &str,
        unit_id: &str,
        batch_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Self {
        Self {
            start,
            end: Some(end),
            operation: operation.to_string(),
            unit_id: unit_id.to_string(),
            batch_id: batch_id.to_string(),
        }
    }

    /// Interval that has not finished yet
    pub fn open(operation: &str, unit_id: &str, batch_id: &str, start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            operation: operation.to_string(),
            unit_id: unit_id.to_string(),
            batch_id: batch_id.to_string(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end.is_none()
    }

    /// Key of the timeline this interval belongs to
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            unit_id: self.unit_id.clone(),
            batch_id: self.batch_id.clone(),
        }
    }
}

/// A (unit, batch) pair; each one gets its own partitioned timeline
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct GroupKey {
    pub unit_id: String,
    pub batch_id: String,
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.unit_id.is_empty(), self.batch_id.is_empty()) {
            (true, true) => write!(f, "(all)"),
            (false, true) => write!(f, "{}", self.unit_id),
            _ => write!(f, "{}/{}", self.unit_id, self.batch_id),
        }
    }
}

/// Half-open analysis window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnalysisWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl AnalysisWindow {
    /// # Errors
    /// `DataError::InvalidWindow` unless `start < end`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DataError> {
        if start >= end {
            return Err(DataError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn length(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// How an interval with no recorded end is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum EndPolicy {
    /// Historical analysis: open intervals run through the window end
    #[default]
    WindowEnd,

    /// Live process: open intervals run until `min(window_end, now)`
    Live { now: DateTime<Utc> },
}

impl EndPolicy {
    /// Concrete end for an interval, given the window it is analysed in
    pub fn resolve(&self, end: Option<DateTime<Utc>>, window: &AnalysisWindow) -> DateTime<Utc> {
        match (end, self) {
            (Some(end), _) => end,
            (None, EndPolicy::WindowEnd) => window.end(),
            (None, EndPolicy::Live { now }) => window.end().min(*now),
        }
    }
}

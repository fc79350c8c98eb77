//! Loss categorization of normalized segments
//!
//! Never fails: operations without a mapping are accounted as unplanned
//! stops and flagged so configuration gaps stay visible.

use crate::category::Category;
use crate::config::ConfigStore;
use crate::interval::GroupKey;
use crate::normalize::{Segment, UnitTimeline};
use chrono::{DateTime, TimeDelta, Utc};

/// A normalized interval with its resolved loss category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedInterval {
    pub unit_id: String,
    pub batch_id: String,
    pub operation: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration: TimeDelta,
    /// Category the time is accounted under (never `Unmapped`)
    pub category: Category,
    /// True when `category` came from the unmapped fallback
    pub unmapped: bool,
    /// Configured ideal duration, if any
    pub ideal_duration: Option<TimeDelta>,
    pub is_ongoing: bool,
    pub is_synthetic: bool,
}

impl NormalizedInterval {
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            unit_id: self.unit_id.clone(),
            batch_id: self.batch_id.clone(),
        }
    }

    /// Time spent beyond the ideal duration (zero when within it or unset)
    pub fn overrun(&self) -> TimeDelta {
        match self.ideal_duration {
            Some(ideal) if self.duration > ideal => self.duration - ideal,
            _ => TimeDelta::zero(),
        }
    }
}

/// Loss category for an operation
///
/// Unmapped operations resolve to [`Category::UnplannedStop`].
pub fn categorize(operation: &str, config: &ConfigStore) -> Category {
    config.category_for(operation).effective()
}

/// Attach categories to every segment of a timeline
///
/// A value-added segment keeps its full duration; the ideal duration is
/// carried alongside it rather than used to shorten it.
pub fn categorize_timeline(timeline: &UnitTimeline, config: &ConfigStore) -> Vec<NormalizedInterval> {
    timeline
        .segments
        .iter()
        .map(|segment| categorize_segment(&timeline.key, segment, config))
        .collect()
}

fn categorize_segment(key: &GroupKey, segment: &Segment, config: &ConfigStore) -> NormalizedInterval {
    let configured = config.category_for(&segment.operation);

    NormalizedInterval {
        unit_id: key.unit_id.clone(),
        batch_id: key.batch_id.clone(),
        operation: segment.operation.clone(),
        start: segment.start,
        end: segment.end,
        duration: segment.duration(),
        category: configured.effective(),
        unmapped: configured == Category::Unmapped,
        ideal_duration: config.ideal_duration_for(&segment.operation),
        is_ongoing: segment.is_ongoing,
        is_synthetic: segment.is_synthetic,
    }
}

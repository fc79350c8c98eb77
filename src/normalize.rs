//! Interval normalization: end resolution, clipping and gap synthesis
//!
//! Turns raw, possibly open-ended and out-of-window intervals into one
//! timeline per (unit, batch) that covers the analysis window exactly:
//!
//! 1. Open ends are resolved through the [`EndPolicy`].
//! 2. Every interval is clipped to the window; empty results are dropped.
//! 3. Overlaps within a timeline are handled by the [`OverlapPolicy`].
//! 4. Uncovered time is filled with synthetic idle segments.

use crate::interval::{AnalysisWindow, DataError, EndPolicy, GroupKey, OperationInterval};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Operation name given to synthesized gap segments
pub const IDLE_OPERATION: &str = "idle";

/// What to do when two intervals on the same timeline overlap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Keep both intervals as recorded and report the overlap
    #[default]
    Preserve,
    /// Fail the calculation on the first overlap
    Reject,
    /// The latest-starting interval wins wherever intervals overlap; an
    /// interrupted interval resumes once the later one ends
    LastWriteWins,
}

/// A clipped, resolved piece of a unit's timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub operation: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Recorded without an end timestamp
    pub is_ongoing: bool,
    /// Synthesized to fill a gap
    pub is_synthetic: bool,
}

impl Segment {
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }
}

/// Normalized timeline for one (unit, batch)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitTimeline {
    pub key: GroupKey,
    pub segments: Vec<Segment>,
}

impl UnitTimeline {
    /// Sum of segment durations; equals the window length unless overlaps
    /// were preserved
    pub fn covered(&self) -> TimeDelta {
        self.segments
            .iter()
            .fold(TimeDelta::zero(), |acc, s| acc + s.duration())
    }
}

/// Overlap between two intervals on one timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Overlap {
    pub key: GroupKey,
    pub first: String,
    pub second: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Open interval that was closed by the end policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOpenEnd {
    pub key: GroupKey,
    pub operation: String,
    pub start: DateTime<Utc>,
    pub resolved_end: DateTime<Utc>,
}

/// Output of [`IntervalNormalizer::normalize`]
#[derive(Debug, Clone, Default)]
pub struct Normalization {
    /// One timeline per group, ordered by key
    pub timelines: Vec<UnitTimeline>,
    pub overlaps: Vec<Overlap>,
    pub open_ends: Vec<ResolvedOpenEnd>,
}

/// Resolves, clips and gap-fills raw intervals against a window
#[derive(Debug, Clone)]
pub struct IntervalNormalizer {
    window: AnalysisWindow,
    end_policy: EndPolicy,
    overlap_policy: OverlapPolicy,
    idle_operation: String,
}

impl IntervalNormalizer {
    pub fn new(window: AnalysisWindow) -> Self {
        Self {
            window,
            end_policy: EndPolicy::default(),
            overlap_policy: OverlapPolicy::default(),
            idle_operation: IDLE_OPERATION.to_string(),
        }
    }

    pub fn with_end_policy(mut self, policy: EndPolicy) -> Self {
        self.end_policy = policy;
        self
    }

    pub fn with_overlap_policy(mut self, policy: OverlapPolicy) -> Self {
        self.overlap_policy = policy;
        self
    }

    pub fn with_idle_operation(mut self, operation: &str) -> Self {
        self.idle_operation = operation.to_string();
        self
    }

    /// Normalize a set of raw intervals into gap-free timelines
    ///
    /// The input is only read. An empty input yields a single unnamed
    /// timeline that is idle for the whole window.
    ///
    /// # Errors
    /// `EndBeforeStart` if any recorded end precedes its start (checked for
    /// every interval before anything is normalized), and `OverlapRejected`
    /// under [`OverlapPolicy::Reject`]. An open interval that starts after
    /// its resolved end is not an error; it lies outside the analysed time
    /// and is dropped by clipping.
    pub fn normalize(&self, intervals: &[OperationInterval]) -> Result<Normalization, DataError> {
        let resolved = self.resolve_ends(intervals)?;

        let mut groups: BTreeMap<GroupKey, Vec<Segment>> = BTreeMap::new();
        let mut open_ends = Vec::new();

        for (interval, end) in resolved {
            let key = interval.group_key();
            if interval.is_open() {
                open_ends.push(ResolvedOpenEnd {
                    key: key.clone(),
                    operation: interval.operation.clone(),
                    start: interval.start,
                    resolved_end: end,
                });
            }

            let timeline = groups.entry(key).or_default();
            if let Some(segment) = self.clip(interval, end) {
                timeline.push(segment);
            }
        }

        if groups.is_empty() {
            groups.insert(GroupKey::default(), Vec::new());
        }

        let mut normalization = Normalization {
            open_ends,
            ..Default::default()
        };

        for (key, mut segments) in groups {
            // Stable: ties keep input order
            segments.sort_by_key(|s| s.start);

            let segments = self.apply_overlap_policy(&key, segments, &mut normalization.overlaps)?;
            let segments = self.fill_gaps(segments);

            tracing::debug!(
                group = %key,
                segments = segments.len(),
                "Normalized timeline"
            );

            normalization.timelines.push(UnitTimeline { key, segments });
        }

        Ok(normalization)
    }

    /// Resolve every end up front so bad data fails before any work is done
    fn resolve_ends<'a>(
        &self,
        intervals: &'a [OperationInterval],
    ) -> Result<Vec<(&'a OperationInterval, DateTime<Utc>)>, DataError> {
        intervals
            .iter()
            .map(|interval| {
                let end = self.end_policy.resolve(interval.end, &self.window);
                if !interval.is_open() && end < interval.start {
                    return Err(DataError::EndBeforeStart {
                        operation: interval.operation.clone(),
                        unit_id: interval.unit_id.clone(),
                        batch_id: interval.batch_id.clone(),
                        start: interval.start,
                        end,
                    });
                }
                Ok((interval, end))
            })
            .collect()
    }

    /// Truncate to the window; `None` if nothing is left
    fn clip(&self, interval: &OperationInterval, end: DateTime<Utc>) -> Option<Segment> {
        let start = interval.start.max(self.window.start());
        let end = end.min(self.window.end());
        if end <= start {
            return None;
        }

        Some(Segment {
            operation: interval.operation.clone(),
            start,
            end,
            is_ongoing: interval.is_open(),
            is_synthetic: false,
        })
    }

    fn apply_overlap_policy(
        &self,
        key: &GroupKey,
        segments: Vec<Segment>,
        overlaps: &mut Vec<Overlap>,
    ) -> Result<Vec<Segment>, DataError> {
        let mut out: Vec<Segment> = Vec::with_capacity(segments.len());
        // Segment whose end is the furthest reached so far
        let mut reach: Option<usize> = None;

        for segment in segments {
            let Some(prev) = reach.map(|i| &out[i]) else {
                reach = Some(out.len());
                out.push(segment);
                continue;
            };

            if segment.start >= prev.end {
                if segment.end >= prev.end {
                    reach = Some(out.len());
                }
                out.push(segment);
                continue;
            }

            let overlap = Overlap {
                key: key.clone(),
                first: prev.operation.clone(),
                second: segment.operation.clone(),
                start: segment.start,
                end: segment.end.min(prev.end),
            };
            tracing::warn!(
                group = %key,
                first = %overlap.first,
                second = %overlap.second,
                at = %overlap.start,
                "Overlapping operations on one unit"
            );

            match self.overlap_policy {
                OverlapPolicy::Reject => {
                    return Err(DataError::OverlapRejected {
                        unit_id: key.unit_id.clone(),
                        batch_id: key.batch_id.clone(),
                        first: overlap.first,
                        second: overlap.second,
                        at: overlap.start,
                    });
                }
                OverlapPolicy::Preserve | OverlapPolicy::LastWriteWins => {
                    if segment.end > prev.end {
                        reach = Some(out.len());
                    }
                    out.push(segment);
                }
            }

            overlaps.push(overlap);
        }

        if self.overlap_policy == OverlapPolicy::LastWriteWins {
            return Ok(last_write_wins(out));
        }
        Ok(out)
    }

    /// Insert idle segments wherever the window is not covered
    fn fill_gaps(&self, segments: Vec<Segment>) -> Vec<Segment> {
        let mut filled = Vec::with_capacity(segments.len() * 2 + 1);
        let mut cursor = self.window.start();

        for segment in segments {
            if segment.start > cursor {
                filled.push(self.idle(cursor, segment.start));
            }
            cursor = cursor.max(segment.end);
            filled.push(segment);
        }

        if cursor < self.window.end() {
            filled.push(self.idle(cursor, self.window.end()));
        }

        filled
    }

    fn idle(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Segment {
        Segment {
            operation: self.idle_operation.clone(),
            start,
            end,
            is_ongoing: false,
            is_synthetic: true,
        }
    }
}

/// Flatten start-ordered segments so the latest-starting one is recorded at
/// every instant. Segments with equal starts keep input order, so the later
/// record wins.
fn last_write_wins(segments: Vec<Segment>) -> Vec<Segment> {
    let mut out = Vec::with_capacity(segments.len());
    // Segments still running; the top one is being recorded
    let mut active: Vec<Segment> = Vec::new();
    let mut cursor: Option<DateTime<Utc>> = None;

    for segment in segments {
        unwind(&mut active, &mut out, &mut cursor, Some(segment.start));
        active.push(segment);
    }
    unwind(&mut active, &mut out, &mut cursor, None);

    out
}

/// Emit the active stack up to `until`, or until it is exhausted
fn unwind(
    active: &mut Vec<Segment>,
    out: &mut Vec<Segment>,
    cursor: &mut Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) {
    while let Some(top) = active.last() {
        let from = cursor.map_or(top.start, |c| c.max(top.start));
        let to = until.map_or(top.end, |u| u.min(top.end));
        if to > from {
            out.push(Segment {
                start: from,
                end: to,
                ..top.clone()
            });
            *cursor = Some(to);
        }

        if until.is_some_and(|u| top.end > u) {
            break;
        }
        active.pop();
    }
}

//! OEE calculation entry point
//!
//! Runs the full pipeline over one set of intervals:
//! normalize → categorize → aggregate → metrics. Results are kept per
//! (unit, batch) grouping and also rolled up across all groupings.
//!
//! The calculation is a pure function of its inputs; it holds no state and
//! can run concurrently against one shared [`ConfigStore`].

use crate::breakdown::{aggregate, loss_pareto, minutes, OperationLoss, TimeBreakdown};
use crate::categorize::{categorize_timeline, NormalizedInterval};
use crate::config::ConfigStore;
use crate::interval::{AnalysisWindow, DataError, EndPolicy, GroupKey, OperationInterval};
use crate::metrics::{compute_metrics, LossSummary, OeeMetrics};
use crate::normalize::{IntervalNormalizer, Overlap, OverlapPolicy, ResolvedOpenEnd, IDLE_OPERATION};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Knobs for a calculation; the defaults suit historical analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculationOptions {
    pub end_policy: EndPolicy,
    pub overlap_policy: OverlapPolicy,
    /// Operation name for synthesized gap segments
    pub idle_operation: String,
}

impl Default for CalculationOptions {
    fn default() -> Self {
        Self {
            end_policy: EndPolicy::WindowEnd,
            overlap_policy: OverlapPolicy::Preserve,
            idle_operation: IDLE_OPERATION.to_string(),
        }
    }
}

/// Data-quality findings that did not stop the calculation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Operation with no loss mapping, accounted as an unplanned stop
    UnmappedOperation {
        operation: String,
        occurrences: usize,
        total: TimeDelta,
    },
    /// Two intervals on one unit overlap
    Overlap(Overlap),
    /// Interval without an end, closed by the end policy
    OngoingInterval(ResolvedOpenEnd),
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnmappedOperation {
                operation,
                occurrences,
                total,
            } => write!(
                f,
                "Unmapped operation '{}' ({} intervals, {:.1} min) counted as unplanned_stop; add it to loss_mappings",
                operation,
                occurrences,
                minutes(*total)
            ),
            Warning::Overlap(overlap) => write!(
                f,
                "'{}' overlaps '{}' on {} from {} to {}",
                overlap.second, overlap.first, overlap.key, overlap.start, overlap.end
            ),
            Warning::OngoingInterval(open) if open.resolved_end <= open.start => write!(
                f,
                "'{}' on {} has no end and starts at {}, after the analysed time; not counted",
                open.operation, open.key, open.start
            ),
            Warning::OngoingInterval(open) => write!(
                f,
                "'{}' on {} has no end; treated as running until {}",
                open.operation, open.key, open.resolved_end
            ),
        }
    }
}

/// Breakdown and metrics over some amount of window time
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    /// Window time this summary covers (window length × groupings)
    pub total_window: TimeDelta,
    pub breakdown: TimeBreakdown,
    pub metrics: OeeMetrics,
    pub losses: LossSummary,
}

impl GroupSummary {
    fn new<'a, I>(intervals: I, total_window: TimeDelta) -> Self
    where
        I: IntoIterator<Item = &'a NormalizedInterval> + Clone,
    {
        let breakdown = aggregate(intervals.clone());
        let metrics = compute_metrics(&breakdown, total_window);
        let losses = LossSummary::new(&breakdown, intervals);
        Self {
            total_window,
            breakdown,
            metrics,
            losses,
        }
    }
}

/// Result for one (unit, batch) grouping
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResult {
    pub key: GroupKey,
    pub summary: GroupSummary,
}

/// Everything a calculation produces
#[derive(Debug, Clone)]
pub struct CalculationResult {
    pub window: AnalysisWindow,
    /// Per-grouping results, ordered by key
    pub groups: Vec<GroupResult>,
    /// Sum over all groupings
    pub rollup: GroupSummary,
    /// Normalized, categorized intervals of every grouping, in order
    pub categorized_intervals: Vec<NormalizedInterval>,
    pub warnings: Vec<Warning>,
}

impl CalculationResult {
    /// Rollup time breakdown
    pub fn time_breakdown(&self) -> &TimeBreakdown {
        &self.rollup.breakdown
    }

    /// Rollup OEE metrics
    pub fn oee_metrics(&self) -> OeeMetrics {
        self.rollup.metrics
    }

    pub fn group(&self, unit_id: &str, batch_id: &str) -> Option<&GroupResult> {
        self.groups
            .iter()
            .find(|g| g.key.unit_id == unit_id && g.key.batch_id == batch_id)
    }

    /// Loss time ranked by operation across all groupings
    pub fn loss_pareto(&self) -> Vec<OperationLoss> {
        loss_pareto(&self.categorized_intervals)
    }

    pub fn unmapped_operations(&self) -> impl Iterator<Item = &str> {
        self.warnings.iter().filter_map(|w| match w {
            Warning::UnmappedOperation { operation, .. } => Some(operation.as_str()),
            _ => None,
        })
    }
}

/// Calculate OEE for a set of intervals over `[window_start, window_end)`
///
/// Uses [`CalculationOptions::default`]: open intervals run to the window
/// end and overlaps are kept and reported.
///
/// # Errors
/// `DataError::InvalidWindow` unless `window_start < window_end`, and
/// `DataError::EndBeforeStart` for an interval that ends before it starts.
///
/// # Example
/// ```
/// use batch_oee::calculation::calculate;
/// use batch_oee::config::ConfigStore;
/// use batch_oee::interval::OperationInterval;
/// use chrono::{TimeZone, Utc};
///
/// let config = ConfigStore::from_yaml_str("loss_mappings:\n  Mixing: value_added\n")?;
/// let start = Utc.with_ymd_and_hms(2024, 12, 15, 8, 0, 0).unwrap();
/// let end = Utc.with_ymd_and_hms(2024, 12, 15, 10, 0, 0).unwrap();
/// let intervals = vec![OperationInterval::open("Mixing", "R-101", "B-1", start)];
///
/// let result = calculate(&intervals, &config, start, end)?;
/// assert_eq!(result.oee_metrics().oee, 1.0);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn calculate(
    intervals: &[OperationInterval],
    config: &ConfigStore,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Result<CalculationResult, DataError> {
    calculate_with_options(
        intervals,
        config,
        window_start,
        window_end,
        &CalculationOptions::default(),
    )
}

/// [`calculate`] with explicit end and overlap policies
pub fn calculate_with_options(
    intervals: &[OperationInterval],
    config: &ConfigStore,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    options: &CalculationOptions,
) -> Result<CalculationResult, DataError> {
    let window = AnalysisWindow::new(window_start, window_end)?;

    let normalization = IntervalNormalizer::new(window)
        .with_end_policy(options.end_policy)
        .with_overlap_policy(options.overlap_policy)
        .with_idle_operation(&options.idle_operation)
        .normalize(intervals)?;

    let mut groups = Vec::with_capacity(normalization.timelines.len());
    let mut categorized_intervals = Vec::new();

    for timeline in &normalization.timelines {
        let categorized = categorize_timeline(timeline, config);
        let summary = GroupSummary::new(&categorized, window.length());

        tracing::debug!(
            group = %timeline.key,
            oee = summary.metrics.oee,
            "Computed group metrics"
        );

        groups.push(GroupResult {
            key: timeline.key.clone(),
            summary,
        });
        categorized_intervals.extend(categorized);
    }

    let rollup = GroupSummary::new(
        &categorized_intervals,
        window.length() * groups.len() as i32,
    );

    let mut warnings = unmapped_warnings(&categorized_intervals);
    warnings.extend(normalization.overlaps.into_iter().map(Warning::Overlap));
    warnings.extend(
        normalization
            .open_ends
            .into_iter()
            .map(Warning::OngoingInterval),
    );

    Ok(CalculationResult {
        window,
        groups,
        rollup,
        categorized_intervals,
        warnings,
    })
}

/// One warning per distinct unmapped operation, by name
fn unmapped_warnings(intervals: &[NormalizedInterval]) -> Vec<Warning> {
    let mut unmapped: BTreeMap<&str, (usize, TimeDelta)> = BTreeMap::new();
    for interval in intervals.iter().filter(|i| i.unmapped) {
        let entry = unmapped
            .entry(interval.operation.as_str())
            .or_insert((0, TimeDelta::zero()));
        entry.0 += 1;
        entry.1 += interval.duration;
    }

    unmapped
        .into_iter()
        .map(|(operation, (occurrences, total))| {
            tracing::warn!(
                operation,
                occurrences,
                "Unmapped operation counted as unplanned stop"
            );
            Warning::UnmappedOperation {
                operation: operation.to_string(),
                occurrences,
                total,
            }
        })
        .collect()
}

impl fmt::Display for CalculationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "=== OEE {} → {} ({:.1} min) ===",
            self.window.start(),
            self.window.end(),
            minutes(self.window.length())
        )?;
        writeln!(f, "{}", self.rollup.metrics)?;
        writeln!(f)?;

        writeln!(f, "Time breakdown:")?;
        for share in self.rollup.breakdown.shares() {
            writeln!(f, "  {}", share)?;
        }
        writeln!(f)?;

        writeln!(f, "Losses:")?;
        writeln!(f, "{}", self.rollup.losses)?;

        if self.groups.len() > 1 {
            writeln!(f)?;
            writeln!(f, "Per unit/batch:")?;
            for group in &self.groups {
                writeln!(f, "  {}: {}", group.key, group.summary.metrics)?;
            }
        }

        let pareto = self.loss_pareto();
        if !pareto.is_empty() {
            writeln!(f)?;
            writeln!(f, "Top losses:")?;
            for loss in pareto.iter().take(5) {
                writeln!(f, "  {}", loss.to_report_string())?;
            }
        }

        if !self.warnings.is_empty() {
            writeln!(f)?;
            writeln!(f, "Warnings:")?;
            for warning in &self.warnings {
                writeln!(f, "  ⚠ {}", warning)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::Category;
    use crate::config::ConfigDefinition;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 15, hour, minute, 0).unwrap()
    }

    fn config() -> ConfigStore {
        let definition = ConfigDefinition::default()
            .with_mapping("Heating", "speed_loss")
            .with_mapping("Cooling", "planned_stop")
            .with_mapping("Mixing", "value_added")
            .with_mapping("idle", "unplanned_stop")
            .with_value_added_time("Mixing", 45.0);
        ConfigStore::new(&definition).unwrap()
    }

    #[test]
    fn test_invalid_window_checked_before_data() {
        let intervals = vec![OperationInterval::new("Bad", "R", "B", at(9, 0), at(8, 0))];

        let err = calculate(&intervals, &config(), at(10, 0), at(10, 0)).unwrap_err();
        assert!(matches!(err, DataError::InvalidWindow { .. }));
    }

    #[test]
    fn test_per_group_and_rollup() {
        let intervals = vec![
            OperationInterval::new("Mixing", "R-101", "B-1", at(8, 0), at(10, 0)),
            OperationInterval::new("Heating", "R-102", "B-2", at(8, 0), at(10, 0)),
        ];

        let result = calculate(&intervals, &config(), at(8, 0), at(10, 0)).unwrap();

        assert_eq!(result.groups.len(), 2);
        let r101 = result.group("R-101", "B-1").unwrap();
        assert_eq!(r101.summary.metrics.oee, 1.0);
        let r102 = result.group("R-102", "B-2").unwrap();
        assert_eq!(r102.summary.metrics.performance, 0.0);

        assert_eq!(result.rollup.total_window, TimeDelta::minutes(240));
        assert_eq!(result.time_breakdown().total(), TimeDelta::minutes(240));
        assert_eq!(result.oee_metrics().performance, 0.5);
    }

    #[test]
    fn test_unmapped_operations_warned_once() {
        let intervals = vec![
            OperationInterval::new("Drying", "R-101", "B-1", at(8, 0), at(8, 10)),
            OperationInterval::new("Drying", "R-101", "B-1", at(8, 20), at(8, 30)),
        ];

        let result = calculate(&intervals, &config(), at(8, 0), at(10, 0)).unwrap();

        let unmapped: Vec<_> = result.unmapped_operations().collect();
        assert_eq!(unmapped, vec!["Drying"]);
        assert_eq!(
            result.warnings[0],
            Warning::UnmappedOperation {
                operation: "Drying".to_string(),
                occurrences: 2,
                total: TimeDelta::minutes(20),
            }
        );
        assert_eq!(
            result.time_breakdown().get(Category::UnplannedStop),
            TimeDelta::minutes(120)
        );
    }

    #[test]
    fn test_ongoing_interval_warning() {
        let intervals = vec![OperationInterval::open("Mixing", "R-101", "B-1", at(9, 0))];

        let result = calculate(&intervals, &config(), at(8, 0), at(10, 0)).unwrap();

        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, Warning::OngoingInterval(open) if open.resolved_end == at(10, 0))));
    }

    #[test]
    fn test_open_interval_after_window_not_counted() {
        let intervals = vec![
            OperationInterval::new("Mixing", "R", "", at(8, 0), at(9, 0)),
            OperationInterval::open("Mixing", "R", "", at(12, 0)),
        ];

        let result = calculate(&intervals, &config(), at(8, 0), at(10, 0)).unwrap();

        assert_eq!(result.time_breakdown().total(), TimeDelta::minutes(120));
        assert_eq!(
            result.time_breakdown().get(Category::ValueAdded),
            TimeDelta::minutes(60)
        );
        let warning = result
            .warnings
            .iter()
            .find(|w| matches!(w, Warning::OngoingInterval(_)))
            .unwrap();
        assert!(warning.to_string().contains("not counted"));
    }

    #[test]
    fn test_live_options() {
        let intervals = vec![OperationInterval::open("Mixing", "R-101", "B-1", at(8, 0))];
        let options = CalculationOptions {
            end_policy: EndPolicy::Live { now: at(9, 0) },
            ..Default::default()
        };

        let result =
            calculate_with_options(&intervals, &config(), at(8, 0), at(10, 0), &options).unwrap();

        assert_eq!(
            result.time_breakdown().get(Category::ValueAdded),
            TimeDelta::minutes(60)
        );
        assert_eq!(result.oee_metrics().availability, 0.5);
    }

    #[test]
    fn test_value_added_overrun_reported() {
        let intervals = vec![OperationInterval::new(
            "Mixing",
            "R-101",
            "B-1",
            at(8, 0),
            at(9, 0),
        )];

        let result = calculate(&intervals, &config(), at(8, 0), at(10, 0)).unwrap();

        assert_eq!(result.rollup.losses.value_added_overrun, TimeDelta::minutes(15));
        // Overrun does not shorten value-added time
        assert_eq!(result.rollup.losses.value_added_time, TimeDelta::minutes(60));
    }

    #[test]
    fn test_text_report() {
        let intervals = vec![
            OperationInterval::new("Heating", "R-101", "B-1", at(8, 0), at(8, 30)),
            OperationInterval::new("Drying", "R-101", "B-1", at(8, 30), at(9, 0)),
        ];

        let report = calculate(&intervals, &config(), at(8, 0), at(10, 0))
            .unwrap()
            .to_string();

        assert!(report.contains("Time breakdown:"));
        assert!(report.contains("Top losses:"));
        assert!(report.contains("Unmapped operation 'Drying'"));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: CalculationOptions =
            serde_json::from_str(r#"{"overlap_policy": "last_write_wins"}"#).unwrap();

        assert_eq!(options.overlap_policy, OverlapPolicy::LastWriteWins);
        assert_eq!(options.end_policy, EndPolicy::WindowEnd);
        assert_eq!(options.idle_operation, "idle");
    }
}

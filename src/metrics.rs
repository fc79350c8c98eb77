//! Availability, Performance, Quality and OEE from a time breakdown
//!
//! Duration-based analogue of the count-based OEE formula. Time is peeled
//! off in layers:
//!
//! ```text
//! window
//!  └─ run time          = window − planned stops
//!      └─ operating time = run time − (unplanned stops + startup losses)
//!          └─ net time    = operating time − (speed losses + small stops)
//! ```
//!
//! Availability = operating / run, Performance = net / operating, and
//! Quality = value-added / (value-added + rework/scrap).

use crate::breakdown::{minutes, TimeBreakdown};
use crate::categorize::NormalizedInterval;
use crate::category::Category;
use chrono::TimeDelta;
use serde::Serialize;
use std::fmt;

/// OEE ratios, each in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OeeMetrics {
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
}

impl fmt::Display for OeeMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Availability {:.1}% × Performance {:.1}% × Quality {:.1}% = OEE {:.1}%",
            self.availability * 100.0,
            self.performance * 100.0,
            self.quality * 100.0,
            self.oee * 100.0
        )
    }
}

/// Intermediate times the ratios are built from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeLayers {
    pub total_window: TimeDelta,
    pub planned_stop_time: TimeDelta,
    pub run_time: TimeDelta,
    pub unavailable_time: TimeDelta,
    pub operating_time: TimeDelta,
    pub degraded_time: TimeDelta,
    pub good_time: TimeDelta,
    pub scrap_time: TimeDelta,
}

impl TimeLayers {
    pub fn from_breakdown(breakdown: &TimeBreakdown, total_window: TimeDelta) -> Self {
        let planned_stop_time = breakdown.get(Category::PlannedStop);
        let run_time = total_window - planned_stop_time;
        let unavailable_time =
            breakdown.get(Category::UnplannedStop) + breakdown.get(Category::StartupLoss);

        Self {
            total_window,
            planned_stop_time,
            run_time,
            unavailable_time,
            operating_time: run_time - unavailable_time,
            degraded_time: breakdown.get(Category::SpeedLoss) + breakdown.get(Category::SmallStop),
            good_time: breakdown.get(Category::ValueAdded),
            scrap_time: breakdown.get(Category::ReworkScrap),
        }
    }
}

/// Derive OEE ratios from a breakdown over `total_window`
///
/// Availability and Performance are zero when their denominator is not
/// positive; Quality is 1.0 when no value-added or scrap time was seen.
///
/// # Example
/// ```
/// use batch_oee::breakdown::TimeBreakdown;
/// use batch_oee::category::Category;
/// use batch_oee::metrics::compute_metrics;
/// use chrono::TimeDelta;
///
/// let mut breakdown = TimeBreakdown::new();
/// breakdown.add(Category::ValueAdded, TimeDelta::minutes(90));
/// breakdown.add(Category::UnplannedStop, TimeDelta::minutes(30));
///
/// let metrics = compute_metrics(&breakdown, TimeDelta::minutes(120));
/// assert_eq!(metrics.availability, 0.75);
/// assert_eq!(metrics.oee, 0.75);
/// ```
pub fn compute_metrics(breakdown: &TimeBreakdown, total_window: TimeDelta) -> OeeMetrics {
    let layers = TimeLayers::from_breakdown(breakdown, total_window);

    let availability = ratio(layers.operating_time, layers.run_time);
    let performance = ratio(
        layers.operating_time - layers.degraded_time,
        layers.operating_time,
    );
    let quality = {
        let denominator = layers.good_time + layers.scrap_time;
        if denominator.is_zero() {
            1.0
        } else {
            ratio(layers.good_time, denominator)
        }
    };

    OeeMetrics {
        availability,
        performance,
        quality,
        oee: availability * performance * quality,
    }
}

/// `numerator / denominator` clamped to `[0, 1]`; zero for a non-positive
/// denominator
fn ratio(numerator: TimeDelta, denominator: TimeDelta) -> f64 {
    if denominator <= TimeDelta::zero() {
        return 0.0;
    }
    let value = numerator.num_milliseconds() as f64 / denominator.num_milliseconds() as f64;
    value.clamp(0.0, 1.0)
}

/// Where the window went, grouped by the OEE factor each loss hurts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LossSummary {
    pub planned_stop_time: TimeDelta,
    /// Unplanned stops and startup losses
    pub availability_losses: TimeDelta,
    /// Speed losses and small stops
    pub performance_losses: TimeDelta,
    /// Rework and scrap
    pub quality_losses: TimeDelta,
    pub value_added_time: TimeDelta,
    /// Value-added time beyond the configured ideal durations
    pub value_added_overrun: TimeDelta,
}

impl LossSummary {
    pub fn new<'a, I>(breakdown: &TimeBreakdown, intervals: I) -> Self
    where
        I: IntoIterator<Item = &'a NormalizedInterval>,
    {
        let value_added_overrun = intervals
            .into_iter()
            .filter(|i| i.category == Category::ValueAdded)
            .fold(TimeDelta::zero(), |acc, i| acc + i.overrun());

        let sum_where = |pred: fn(Category) -> bool| {
            breakdown
                .iter()
                .filter(|(c, _)| pred(*c))
                .fold(TimeDelta::zero(), |acc, (_, d)| acc + d)
        };

        Self {
            planned_stop_time: breakdown.get(Category::PlannedStop),
            availability_losses: sum_where(Category::is_availability_loss),
            performance_losses: sum_where(Category::is_performance_loss),
            quality_losses: sum_where(Category::is_quality_loss),
            value_added_time: breakdown.get(Category::ValueAdded),
            value_added_overrun,
        }
    }
}

impl fmt::Display for LossSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Planned stops:        {:>8.1} min", minutes(self.planned_stop_time))?;
        writeln!(f, "  Availability losses:  {:>8.1} min", minutes(self.availability_losses))?;
        writeln!(f, "  Performance losses:   {:>8.1} min", minutes(self.performance_losses))?;
        writeln!(f, "  Quality losses:       {:>8.1} min", minutes(self.quality_losses))?;
        writeln!(f, "  Value-added time:     {:>8.1} min", minutes(self.value_added_time))?;
        write!(f, "  Overrun vs ideal:     {:>8.1} min", minutes(self.value_added_overrun))
    }
}

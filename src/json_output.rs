//! JSON output format for OEE results
//!
//! Durations are reported in minutes, the unit the configuration uses.

use crate::breakdown::{minutes, TimeBreakdown};
use crate::calculation::{CalculationResult, GroupSummary, Warning};
use crate::categorize::NormalizedInterval;
use crate::category::Category;
use crate::metrics::OeeMetrics;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Analysis window
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub length_minutes: f64,
}

/// Loss totals grouped by OEE factor, in minutes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonLosses {
    pub planned_stop_time: f64,
    pub availability_losses: f64,
    pub performance_losses: f64,
    pub quality_losses: f64,
    pub value_added_time: f64,
    pub value_added_overrun: f64,
}

/// Breakdown and metrics for one grouping or the rollup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonSummary {
    /// Minutes per category name; every category is present
    pub time_breakdown: BTreeMap<String, f64>,
    pub oee_metrics: JsonMetrics,
    pub losses: JsonLosses,
}

/// OEE ratios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonMetrics {
    pub availability: f64,
    pub performance: f64,
    pub quality: f64,
    pub oee: f64,
}

/// Per unit/batch result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonGroup {
    pub unit_id: String,
    pub batch_id: String,
    #[serde(flatten)]
    pub summary: JsonSummary,
}

/// A categorized interval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonInterval {
    pub unit_id: String,
    pub batch_id: String,
    pub operation: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: f64,
    pub category: Category,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ideal_minutes: Option<f64>,
    /// Fell back to unplanned_stop because the operation is not mapped
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unmapped: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ongoing: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,
}

/// A data-quality warning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonWarning {
    /// unmapped_operation, overlap or ongoing_interval
    pub kind: String,
    pub message: String,
}

/// Complete calculation report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub window: JsonWindow,
    #[serde(flatten)]
    pub rollup: JsonSummary,
    pub groups: Vec<JsonGroup>,
    pub categorized_intervals: Vec<JsonInterval>,
    pub warnings: Vec<JsonWarning>,
}

impl JsonReport {
    pub fn from_result(result: &CalculationResult) -> Self {
        Self {
            window: JsonWindow {
                start: result.window.start(),
                end: result.window.end(),
                length_minutes: minutes(result.window.length()),
            },
            rollup: JsonSummary::from(&result.rollup),
            groups: result
                .groups
                .iter()
                .map(|group| JsonGroup {
                    unit_id: group.key.unit_id.clone(),
                    batch_id: group.key.batch_id.clone(),
                    summary: JsonSummary::from(&group.summary),
                })
                .collect(),
            categorized_intervals: result
                .categorized_intervals
                .iter()
                .map(JsonInterval::from)
                .collect(),
            warnings: result.warnings.iter().map(JsonWarning::from).collect(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn breakdown_minutes(breakdown: &TimeBreakdown) -> BTreeMap<String, f64> {
    Category::REPORTED
        .iter()
        .map(|&category| (category.to_string(), minutes(breakdown.get(category))))
        .collect()
}

impl From<&GroupSummary> for JsonSummary {
    fn from(summary: &GroupSummary) -> Self {
        Self {
            time_breakdown: breakdown_minutes(&summary.breakdown),
            oee_metrics: JsonMetrics::from(summary.metrics),
            losses: JsonLosses {
                planned_stop_time: minutes(summary.losses.planned_stop_time),
                availability_losses: minutes(summary.losses.availability_losses),
                performance_losses: minutes(summary.losses.performance_losses),
                quality_losses: minutes(summary.losses.quality_losses),
                value_added_time: minutes(summary.losses.value_added_time),
                value_added_overrun: minutes(summary.losses.value_added_overrun),
            },
        }
    }
}

impl From<OeeMetrics> for JsonMetrics {
    fn from(metrics: OeeMetrics) -> Self {
        Self {
            availability: metrics.availability,
            performance: metrics.performance,
            quality: metrics.quality,
            oee: metrics.oee,
        }
    }
}

impl From<&NormalizedInterval> for JsonInterval {
    fn from(interval: &NormalizedInterval) -> Self {
        Self {
            unit_id: interval.unit_id.clone(),
            batch_id: interval.batch_id.clone(),
            operation: interval.operation.clone(),
            start: interval.start,
            end: interval.end,
            duration_minutes: minutes(interval.duration),
            category: interval.category,
            ideal_minutes: interval.ideal_duration.map(minutes),
            unmapped: interval.unmapped,
            ongoing: interval.is_ongoing,
            synthetic: interval.is_synthetic,
        }
    }
}

impl From<&Warning> for JsonWarning {
    fn from(warning: &Warning) -> Self {
        let kind = match warning {
            Warning::UnmappedOperation { .. } => "unmapped_operation",
            Warning::Overlap(_) => "overlap",
            Warning::OngoingInterval(_) => "ongoing_interval",
        };
        Self {
            kind: kind.to_string(),
            message: warning.to_string(),
        }
    }
}

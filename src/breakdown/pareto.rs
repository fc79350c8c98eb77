// Loss Pareto: which operations account for the lost time
//
// Ranks every (operation, category) pair outside value-added time by total
// duration, with a running cumulative share, so the few operations behind
// most of the losses stand out.

use crate::breakdown::minutes;
use crate::categorize::NormalizedInterval;
use crate::category::Category;
use chrono::TimeDelta;
use std::collections::BTreeMap;

/// Loss time attributed to one operation
#[derive(Debug, Clone, PartialEq)]
pub struct OperationLoss {
    pub operation: String,

    pub category: Category,

    pub total_time: TimeDelta,

    pub occurrences: usize,

    /// Share of all loss time
    pub percentage: f64,

    /// Running share including every larger loss before this one
    pub cumulative_percentage: f64,

    /// Some occurrences fell back to the unmapped category
    pub unmapped: bool,
}

impl OperationLoss {
    /// Format as human-readable report line
    pub fn to_report_string(&self) -> String {
        let marker = if self.unmapped { " [unmapped]" } else { "" };
        format!(
            "{} ({}){}: {:.1} min over {} intervals, {:.1}% of losses (cumulative {:.1}%)",
            self.operation,
            self.category,
            marker,
            minutes(self.total_time),
            self.occurrences,
            self.percentage,
            self.cumulative_percentage
        )
    }
}

/// Rank loss time by operation, largest first
///
/// Value-added intervals are skipped. Synthetic idle segments count like any
/// other operation.
pub fn loss_pareto<'a, I>(intervals: I) -> Vec<OperationLoss>
where
    I: IntoIterator<Item = &'a NormalizedInterval>,
{
    let mut by_operation: BTreeMap<(String, Category), (TimeDelta, usize, bool)> = BTreeMap::new();

    for interval in intervals {
        if interval.category == Category::ValueAdded {
            continue;
        }
        let entry = by_operation
            .entry((interval.operation.clone(), interval.category))
            .or_insert((TimeDelta::zero(), 0, false));
        entry.0 += interval.duration;
        entry.1 += 1;
        entry.2 |= interval.unmapped;
    }

    let total_millis: i64 = by_operation
        .values()
        .map(|(time, _, _)| time.num_milliseconds())
        .sum();
    if total_millis == 0 {
        return Vec::new();
    }

    let mut losses: Vec<OperationLoss> = by_operation
        .into_iter()
        .filter(|(_, (time, _, _))| *time > TimeDelta::zero())
        .map(|((operation, category), (total_time, occurrences, unmapped))| OperationLoss {
            operation,
            category,
            total_time,
            occurrences,
            percentage: (total_time.num_milliseconds() as f64 / total_millis as f64) * 100.0,
            cumulative_percentage: 0.0,
            unmapped,
        })
        .collect();

    losses.sort_by(|a, b| b.total_time.cmp(&a.total_time));

    let mut running = 0.0;
    for loss in &mut losses {
        running += loss.percentage;
        loss.cumulative_percentage = running;
    }

    losses
}

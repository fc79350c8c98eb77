// Per-category aggregation of normalized intervals

use crate::categorize::NormalizedInterval;
use crate::category::Category;
use chrono::TimeDelta;
use std::collections::BTreeMap;
use std::fmt;

/// Total time per loss category
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeBreakdown {
    totals: BTreeMap<Category, TimeDelta>,
    counts: BTreeMap<Category, usize>,
}

impl TimeBreakdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account one interval's duration under its category
    pub fn add(&mut self, category: Category, duration: TimeDelta) {
        let category = category.effective();
        *self.totals.entry(category).or_insert_with(TimeDelta::zero) += duration;
        *self.counts.entry(category).or_default() += 1;
    }

    /// Fold another breakdown into this one
    pub fn merge(&mut self, other: &TimeBreakdown) {
        for (&category, &duration) in &other.totals {
            *self.totals.entry(category).or_insert_with(TimeDelta::zero) += duration;
        }
        for (&category, &count) in &other.counts {
            *self.counts.entry(category).or_default() += count;
        }
    }

    /// Total time in a category (zero if none was recorded)
    pub fn get(&self, category: Category) -> TimeDelta {
        self.totals
            .get(&category.effective())
            .copied()
            .unwrap_or_else(TimeDelta::zero)
    }

    /// Number of intervals accounted under a category
    pub fn count(&self, category: Category) -> usize {
        self.counts
            .get(&category.effective())
            .copied()
            .unwrap_or(0)
    }

    /// Sum over all categories
    pub fn total(&self) -> TimeDelta {
        self.totals
            .values()
            .fold(TimeDelta::zero(), |acc, d| acc + *d)
    }

    /// Categories with recorded time, in category order
    pub fn iter(&self) -> impl Iterator<Item = (Category, TimeDelta)> + '_ {
        self.totals.iter().map(|(c, d)| (*c, *d))
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }

    /// Share of the total per category, largest first
    ///
    /// Percentages are relative to [`total`](Self::total); an empty
    /// breakdown yields no shares.
    pub fn shares(&self) -> Vec<CategoryShare> {
        let total_millis = self.total().num_milliseconds();
        if total_millis == 0 {
            return Vec::new();
        }

        let mut shares: Vec<CategoryShare> = self
            .iter()
            .map(|(category, time)| {
                let interval_count = self.count(category);
                CategoryShare {
                    category,
                    total_time: time,
                    interval_count,
                    percentage: (time.num_milliseconds() as f64 / total_millis as f64) * 100.0,
                    avg_per_interval: if interval_count == 0 {
                        TimeDelta::zero()
                    } else {
                        time / interval_count as i32
                    },
                }
            })
            .collect();

        // Ties keep category order
        shares.sort_by(|a, b| b.total_time.cmp(&a.total_time));
        shares
    }
}

/// Sum interval durations per category
pub fn aggregate<'a, I>(intervals: I) -> TimeBreakdown
where
    I: IntoIterator<Item = &'a NormalizedInterval>,
{
    let mut breakdown = TimeBreakdown::new();
    for interval in intervals {
        breakdown.add(interval.category, interval.duration);
    }
    breakdown
}

/// One category's share of the analysed time
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryShare {
    pub category: Category,

    pub total_time: TimeDelta,

    /// Number of intervals in this category
    pub interval_count: usize,

    /// Percentage of total analysed time
    pub percentage: f64,

    pub avg_per_interval: TimeDelta,
}

impl fmt::Display for CategoryShare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.2}% ({} intervals, avg {:.1} min, total {:.1} min)",
            self.category,
            self.percentage,
            self.interval_count,
            minutes(self.avg_per_interval),
            minutes(self.total_time)
        )
    }
}

pub(crate) fn minutes(duration: TimeDelta) -> f64 {
    duration.num_milliseconds() as f64 / 60_000.0
}

//! CSV output format for categorized intervals and breakdowns
//!
//! For spreadsheet analysis and downstream reporting.

use crate::breakdown::{minutes, TimeBreakdown};
use crate::categorize::NormalizedInterval;
use crate::category::Category;
use chrono::SecondsFormat;

/// CSV formatter for categorized intervals
#[derive(Debug)]
pub struct CsvOutput<'a> {
    intervals: Vec<&'a NormalizedInterval>,
    include_flags: bool,
}

impl<'a> CsvOutput<'a> {
    /// Create a new CSV formatter; `include_flags` adds the
    /// unmapped/ongoing/synthetic columns
    pub fn new(include_flags: bool) -> Self {
        Self {
            intervals: Vec::new(),
            include_flags,
        }
    }

    pub fn add_interval(&mut self, interval: &'a NormalizedInterval) {
        self.intervals.push(interval);
    }

    pub fn extend<I>(&mut self, intervals: I)
    where
        I: IntoIterator<Item = &'a NormalizedInterval>,
    {
        self.intervals.extend(intervals);
    }

    fn header(&self) -> String {
        let mut headers = vec![
            "unit_id",
            "batch_id",
            "operation",
            "start",
            "end",
            "duration_minutes",
            "category",
            "ideal_minutes",
        ];

        if self.include_flags {
            headers.extend(["unmapped", "ongoing", "synthetic"]);
        }

        headers.join(",")
    }

    /// Escape CSV field (handle commas, quotes, newlines)
    fn escape_field(field: &str) -> String {
        if field.contains(',') || field.contains('"') || field.contains('\n') {
            format!("\"{}\"", field.replace('"', "\"\""))
        } else {
            field.to_string()
        }
    }

    fn format_interval(&self, interval: &NormalizedInterval) -> String {
        let mut fields = vec![
            Self::escape_field(&interval.unit_id),
            Self::escape_field(&interval.batch_id),
            Self::escape_field(&interval.operation),
            interval.start.to_rfc3339_opts(SecondsFormat::Secs, true),
            interval.end.to_rfc3339_opts(SecondsFormat::Secs, true),
            format_minutes(minutes(interval.duration)),
            interval.category.to_string(),
            interval
                .ideal_duration
                .map(|d| format_minutes(minutes(d)))
                .unwrap_or_default(),
        ];

        if self.include_flags {
            fields.push(interval.unmapped.to_string());
            fields.push(interval.is_ongoing.to_string());
            fields.push(interval.is_synthetic.to_string());
        }

        fields.join(",")
    }

    /// Generate CSV output as string
    pub fn to_csv(&self) -> String {
        let mut output = String::new();

        output.push_str(&self.header());
        output.push('\n');

        for interval in &self.intervals {
            output.push_str(&self.format_interval(interval));
            output.push('\n');
        }

        output
    }
}

/// Breakdown as `category,minutes` rows, every category included
pub fn breakdown_to_csv(breakdown: &TimeBreakdown) -> String {
    let mut output = String::from("category,minutes\n");
    for category in Category::REPORTED {
        output.push_str(category.as_str());
        output.push(',');
        output.push_str(&format_minutes(minutes(breakdown.get(category))));
        output.push('\n');
    }
    output
}

fn format_minutes(value: f64) -> String {
    format!("{:.3}", value)
}

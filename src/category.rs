//! Loss categories that operation time is bucketed into
//!
//! Seven categories partition a unit's time, plus the `Unmapped` fallback for
//! operations the configuration does not name. Unmapped time is counted as
//! unplanned stop time once it reaches the breakdown.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Loss category for an operation interval
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ValueAdded,
    UnplannedStop,
    PlannedStop,
    SpeedLoss,
    SmallStop,
    ReworkScrap,
    StartupLoss,
    /// Operation absent from the loss mappings
    Unmapped,
}

impl Category {
    /// The seven categories a breakdown is reported in
    pub const REPORTED: [Category; 7] = [
        Category::ValueAdded,
        Category::UnplannedStop,
        Category::PlannedStop,
        Category::SpeedLoss,
        Category::SmallStop,
        Category::ReworkScrap,
        Category::StartupLoss,
    ];

    /// Category the time is actually accounted under
    pub fn effective(self) -> Category {
        match self {
            Category::Unmapped => Category::UnplannedStop,
            other => other,
        }
    }

    /// Snake-case name used in configuration files and reports
    pub fn as_str(self) -> &'static str {
        match self {
            Category::ValueAdded => "value_added",
            Category::UnplannedStop => "unplanned_stop",
            Category::PlannedStop => "planned_stop",
            Category::SpeedLoss => "speed_loss",
            Category::SmallStop => "small_stop",
            Category::ReworkScrap => "rework_scrap",
            Category::StartupLoss => "startup_loss",
            Category::Unmapped => "unmapped",
        }
    }

    /// Whether time in this category counts against Availability
    pub fn is_availability_loss(self) -> bool {
        matches!(
            self.effective(),
            Category::UnplannedStop | Category::StartupLoss
        )
    }

    /// Whether time in this category counts against Performance
    pub fn is_performance_loss(self) -> bool {
        matches!(self, Category::SpeedLoss | Category::SmallStop)
    }

    /// Whether time in this category counts against Quality
    pub fn is_quality_loss(self) -> bool {
        matches!(self, Category::ReworkScrap)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    /// Parse a category name from configuration
    ///
    /// Case-insensitive. `-`, `/`, `_` and whitespace all act as word
    /// separators, so `Rework/Scrap`, `rework-scrap` and `REWORK_SCRAP`
    /// are the same name. A handful of synonyms are accepted as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .map(|c| match c {
                '-' | '/' | ' ' | '\t' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        let category = match normalized.as_str() {
            "value_added" | "valueadded" | "va" | "good" => Category::ValueAdded,
            "unplanned_stop" | "unplannedstop" | "unplanned" | "breakdown" | "downtime" => {
                Category::UnplannedStop
            }
            "planned_stop" | "plannedstop" | "planned" | "planned_downtime" => {
                Category::PlannedStop
            }
            "speed_loss" | "speedloss" | "reduced_speed" | "slow_cycle" | "delay" => {
                Category::SpeedLoss
            }
            "small_stop" | "smallstop" | "minor_stop" | "idling" => Category::SmallStop,
            "rework_scrap" | "reworkscrap" | "rework" | "scrap" | "quality_loss" => {
                Category::ReworkScrap
            }
            "startup_loss" | "startuploss" | "startup" | "setup" | "changeover" => {
                Category::StartupLoss
            }
            "unmapped" | "unclassified" => Category::Unmapped,
            _ => return Err(format!("unknown loss category '{}'", s)),
        };

        Ok(category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        for category in Category::REPORTED {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn test_parse_is_case_and_separator_insensitive() {
        assert_eq!("Rework/Scrap".parse::<Category>(), Ok(Category::ReworkScrap));
        assert_eq!("rework-scrap".parse::<Category>(), Ok(Category::ReworkScrap));
        assert_eq!("VALUE ADDED".parse::<Category>(), Ok(Category::ValueAdded));
        assert_eq!("  Planned_Stop ".parse::<Category>(), Ok(Category::PlannedStop));
    }

    #[test]
    fn test_parse_synonyms() {
        assert_eq!("scrap".parse::<Category>(), Ok(Category::ReworkScrap));
        assert_eq!("setup".parse::<Category>(), Ok(Category::StartupLoss));
        assert_eq!("delay".parse::<Category>(), Ok(Category::SpeedLoss));
        assert_eq!("unclassified".parse::<Category>(), Ok(Category::Unmapped));
    }

    #[test]
    fn test_parse_unknown() {
        let err = "coffee_break".parse::<Category>().unwrap_err();
        assert!(err.contains("coffee_break"));
    }

    #[test]
    fn test_unmapped_counts_as_unplanned_stop() {
        assert_eq!(Category::Unmapped.effective(), Category::UnplannedStop);
        assert_eq!(Category::SpeedLoss.effective(), Category::SpeedLoss);
        assert!(Category::Unmapped.is_availability_loss());
    }

    #[test]
    fn test_loss_groups_are_disjoint() {
        for category in Category::REPORTED {
            let memberships = [
                category.is_availability_loss(),
                category.is_performance_loss(),
                category.is_quality_loss(),
            ];
            assert!(memberships.iter().filter(|m| **m).count() <= 1);
        }
    }

    #[test]
    fn test_serde_snake_case() {
        let json = serde_json::to_string(&Category::SmallStop).unwrap();
        assert_eq!(json, "\"small_stop\"");
    }
}

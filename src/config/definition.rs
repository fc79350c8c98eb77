use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Classification configuration as it appears on disk
///
/// This is the raw, unvalidated shape. Category names are still strings and
/// durations are still minutes; [`ConfigStore`](super::ConfigStore) resolves
/// both when it is built.
///
/// # Example YAML
/// ```yaml
/// value_added_times:
///   Mixing: 15
///   Heating: 30
/// loss_mappings:
///   Mixing: value_added
///   Cooling: planned_stop
///   idle: unplanned_stop
/// ```
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ConfigDefinition {
    /// Ideal (value-added) duration per operation, in minutes
    #[serde(default)]
    pub value_added_times: BTreeMap<String, f64>,

    /// Loss category name per operation (e.g. "speed_loss", "Rework/Scrap")
    #[serde(default)]
    pub loss_mappings: BTreeMap<String, String>,
}

impl ConfigDefinition {
    /// Add a loss mapping, builder style
    pub fn with_mapping(mut self, operation: &str, category: &str) -> Self {
        self.loss_mappings
            .insert(operation.to_string(), category.to_string());
        self
    }

    /// Add an ideal duration in minutes, builder style
    pub fn with_value_added_time(mut self, operation: &str, minutes: f64) -> Self {
        self.value_added_times.insert(operation.to_string(), minutes);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_sections_default_to_empty() {
        let definition: ConfigDefinition = serde_json::from_str("{}").unwrap();
        assert!(definition.value_added_times.is_empty());
        assert!(definition.loss_mappings.is_empty());
    }

    #[test]
    fn test_builder() {
        let definition = ConfigDefinition::default()
            .with_mapping("Heating", "speed_loss")
            .with_value_added_time("Heating", 30.0);

        assert_eq!(definition.loss_mappings["Heating"], "speed_loss");
        assert_eq!(definition.value_added_times["Heating"], 30.0);
    }
}

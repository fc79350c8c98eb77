use crate::category::Category;
use crate::config::ConfigDefinition;
use chrono::TimeDelta;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or validating a classification configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unknown loss category '{category}' for operation '{operation}'")]
    UnknownCategory { operation: String, category: String },

    #[error("Invalid value-added time for operation '{operation}': {minutes} minutes (must be a non-negative number)")]
    InvalidDuration { operation: String, minutes: f64 },

    #[error("Failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} configuration: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("Unsupported config file extension: {} (expected .yaml, .yml, .toml or .json)", .path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// Validated, immutable view of the classification configuration
///
/// Built once and then only read, so one store can be shared by reference
/// across any number of concurrent calculations.
///
/// # Example Usage
/// ```
/// use batch_oee::category::Category;
/// use batch_oee::config::ConfigStore;
///
/// let store = ConfigStore::from_yaml_str(
///     "loss_mappings:\n  Heating: speed_loss\nvalue_added_times:\n  Mixing: 15\n",
/// )?;
/// assert_eq!(store.category_for("Heating"), Category::SpeedLoss);
/// assert_eq!(store.category_for("Unknown"), Category::Unmapped);
/// assert_eq!(store.ideal_duration_for("Mixing"), Some(chrono::TimeDelta::minutes(15)));
/// # Ok::<(), batch_oee::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    /// Operation name → resolved category
    categories: HashMap<String, Category>,

    /// Operation name → ideal value-added duration
    ideal_durations: HashMap<String, TimeDelta>,
}

impl ConfigStore {
    /// Validate a parsed definition and build the lookup tables
    ///
    /// # Errors
    /// `UnknownCategory` if a loss mapping names a category that does not
    /// exist, `InvalidDuration` if a value-added time is negative or not finite.
    pub fn new(definition: &ConfigDefinition) -> Result<Self, ConfigError> {
        let mut categories = HashMap::with_capacity(definition.loss_mappings.len());
        for (operation, name) in &definition.loss_mappings {
            let category =
                name.parse::<Category>()
                    .map_err(|_| ConfigError::UnknownCategory {
                        operation: operation.clone(),
                        category: name.clone(),
                    })?;
            categories.insert(operation.clone(), category);
        }

        let mut ideal_durations = HashMap::with_capacity(definition.value_added_times.len());
        for (operation, &minutes) in &definition.value_added_times {
            let duration = minutes_to_delta(minutes).ok_or_else(|| ConfigError::InvalidDuration {
                operation: operation.clone(),
                minutes,
            })?;
            ideal_durations.insert(operation.clone(), duration);
        }

        tracing::debug!(
            mappings = categories.len(),
            ideal_durations = ideal_durations.len(),
            "Loaded classification config"
        );

        Ok(Self {
            categories,
            ideal_durations,
        })
    }

    /// Parse and validate a YAML configuration
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let definition: ConfigDefinition =
            serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            })?;
        Self::new(&definition)
    }

    /// Parse and validate a TOML configuration
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let definition: ConfigDefinition =
            toml::from_str(content).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            })?;
        Self::new(&definition)
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let definition: ConfigDefinition =
            serde_json::from_str(content).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            })?;
        Self::new(&definition)
    }

    /// Load a configuration file, choosing the parser by extension
    ///
    /// # Errors
    /// Returns error if the file can't be read, the extension is not one of
    /// `.yaml`, `.yml`, `.toml`, `.json`, or the content fails validation.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        let parse: fn(&str) -> Result<Self, ConfigError> = match extension.as_deref() {
            Some("yaml") | Some("yml") => Self::from_yaml_str,
            Some("toml") => Self::from_toml_str,
            Some("json") => Self::from_json_str,
            _ => {
                return Err(ConfigError::UnsupportedFormat {
                    path: path.to_path_buf(),
                })
            }
        };

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        parse(&content)
    }

    /// Load the default mapping pack for ISA-88 batch phases
    ///
    /// Uses the embedded default-loss-mappings.toml, so it works without any
    /// configuration file.
    pub fn default_isa88() -> Result<Self, ConfigError> {
        const DEFAULT_TOML: &str = include_str!("../../config/default-loss-mappings.toml");
        Self::from_toml_str(DEFAULT_TOML)
    }

    /// Category configured for an operation, or `Unmapped` if there is none
    pub fn category_for(&self, operation: &str) -> Category {
        self.categories
            .get(operation)
            .copied()
            .unwrap_or(Category::Unmapped)
    }

    /// Ideal value-added duration configured for an operation
    pub fn ideal_duration_for(&self, operation: &str) -> Option<TimeDelta> {
        self.ideal_durations.get(operation).copied()
    }

    /// Whether the operation has an explicit loss mapping
    pub fn is_mapped(&self, operation: &str) -> bool {
        self.categories.contains_key(operation)
    }

    /// Number of operations with a loss mapping
    pub fn mapping_count(&self) -> usize {
        self.categories.len()
    }
}

/// Convert configured minutes to a millisecond-exact duration
fn minutes_to_delta(minutes: f64) -> Option<TimeDelta> {
    if !minutes.is_finite() || minutes < 0.0 {
        return None;
    }
    let millis = (minutes * 60_000.0).round();
    if millis > i64::MAX as f64 {
        return None;
    }
    TimeDelta::try_milliseconds(millis as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_to_delta() {
        assert_eq!(minutes_to_delta(15.0), Some(TimeDelta::minutes(15)));
        assert_eq!(minutes_to_delta(0.5), Some(TimeDelta::seconds(30)));
        assert_eq!(minutes_to_delta(0.0), Some(TimeDelta::zero()));
        assert_eq!(minutes_to_delta(-1.0), None);
        assert_eq!(minutes_to_delta(f64::NAN), None);
        assert_eq!(minutes_to_delta(f64::INFINITY), None);
    }

    #[test]
    fn test_default_pack_loads() {
        let store = ConfigStore::default_isa88().unwrap();
        assert_eq!(store.category_for("idle"), Category::UnplannedStop);
        assert_eq!(store.category_for("cleaning"), Category::PlannedStop);
        assert_eq!(store.ideal_duration_for("mixing"), Some(TimeDelta::minutes(30)));
        assert!(store.mapping_count() > 10);
    }
}

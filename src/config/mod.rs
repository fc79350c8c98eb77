// Classification configuration for loss categorization
//
// Operation names are resolved to loss categories through an explicit table
// built once when the configuration is loaded. Unknown category names are
// rejected up front, so a calculation never runs against a half-valid config.
//
// Supported file formats: YAML, TOML, JSON. All three share one schema:
//
//   value_added_times: { operation: minutes }
//   loss_mappings:     { operation: category_name }

mod definition;
mod store;

pub use definition::ConfigDefinition;
pub use store::{ConfigError, ConfigStore};

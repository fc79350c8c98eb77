//! batch-oee - Overall Equipment Effectiveness for batch manufacturing
//!
//! Computes a conserved time breakdown by loss category and the derived
//! Availability, Performance, Quality and OEE figures from ISA-88 operation
//! intervals (procedures, unit procedures and operations run on a unit as
//! part of a batch).
//!
//! The engine is pure: intervals, an immutable [`config::ConfigStore`] and an
//! analysis window go in, a [`calculation::CalculationResult`] comes out.

pub mod breakdown;
pub mod calculation;
pub mod categorize;
pub mod category;
pub mod cli;
pub mod config;
pub mod csv_output;
pub mod interval;
pub mod json_output;
pub mod metrics;
pub mod normalize;

pub use calculation::{calculate, calculate_with_options, CalculationOptions, CalculationResult};
pub use category::Category;
pub use config::{ConfigError, ConfigStore};
pub use interval::{DataError, OperationInterval};

// Time breakdown by loss category
//
// Sums normalized interval durations per category. Because each timeline
// partitions the analysis window, a single timeline's breakdown always adds
// up to the window length; a rollup over N timelines adds up to N windows.
//
// Also ranks where the loss time went (per-category shares and a per
// operation Pareto), so the biggest losses can be chased first.

mod aggregate;
mod pareto;

pub use aggregate::{aggregate, CategoryShare, TimeBreakdown};
pub(crate) use aggregate::minutes;
pub use pareto::{loss_pareto, OperationLoss};

//! Comparison of simulated curves against the analytical model.
//!
//! Both curves are brought onto the simulated frequency axis and shifted to a
//! 0 dB peak before any deviation is measured. Results are informational.

pub mod ac;
pub mod report;
pub mod tolerances;

pub use ac::{AlignedCurves, align_curves, compare_scenario};
pub use report::{ComparisonReport, ComparisonSummary, ScenarioComparison, WorstPointInfo};
pub use tolerances::{AcTolerances, relative_error};

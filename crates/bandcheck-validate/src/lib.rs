//! Cross-checks the analytical bandpass model against an external simulator.
//!
//! This crate provides infrastructure for:
//! - Rendering a SPICE netlist per scenario and running ngspice or LTspice
//! - Parsing the simulator's rawfile back into a normalized magnitude curve
//! - Comparing simulated and analytical curves on a common axis
//! - Collecting everything into a report for the rendering surface

pub mod compare;
pub mod config;
pub mod error;
pub mod netlist;
pub mod orchestrator;
pub mod reader;
pub mod render;
pub mod simulator;

pub use compare::{AcTolerances, ComparisonReport, ScenarioComparison};
pub use config::{
    ArtifactConfig, LineStyle, Scenario, SimulatorConfig, SimulatorKind, SweepConfig,
    ValidationConfig,
};
pub use error::{Error as ValidationError, Result as ValidationResult};
pub use orchestrator::{
    ArtifactPaths, Orchestrator, RunReport, ScenarioOutcome, Stage, StageFailure,
};
pub use reader::{NoData, ResultReader, SimulatedCurve};
pub use render::{JsonExport, ReportSink, TextSummary};
pub use simulator::{ProcessSimulator, SimulationRun, Simulator};

//! External simulator integration.
//!
//! This module runs netlists through ngspice or LTspice and parses the
//! rawfiles they leave behind.

pub mod rawfile;
pub mod runner;
pub mod types;

pub use rawfile::parse_rawfile;
pub use runner::{
    ProcessSimulator, SimulationRun, Simulator, console_path, is_simulator_available,
    resolve_executable,
};
pub use types::{AcTrace, AnalysisType, RawVariable, RawfileData, RawfileHeader};

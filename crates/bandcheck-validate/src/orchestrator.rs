//! Scenario orchestration.
//!
//! Each scenario moves through GENERATE_NETLIST, RUN_SIMULATION, READ_RESULT,
//! COMPUTE_ANALYTICAL and COLLECT in that order. A failure in the simulator
//! chain is recorded against the scenario and the chain stops there; the
//! analytical curve is computed regardless. Only configuration and derivation
//! errors, all raised by [`Orchestrator::new`], are fatal.

use std::fmt;
use std::path::{Path, PathBuf};

use bandcheck_core::{
    AnalyticalCurve, CircuitParams, CircuitTopology, FrequencySweep, NumericCoefficients,
    SymbolicTransferFunction, derive_transfer_function, frequency_response,
};
use serde::Serialize;

use crate::compare::{ComparisonReport, ScenarioComparison, compare_scenario};
use crate::config::{Scenario, ValidationConfig};
use crate::error::Result;
use crate::netlist::{render_netlist, write_netlist};
use crate::reader::{self, NoData, ResultReader, SimulatedCurve};
use crate::simulator::{ProcessSimulator, Simulator, console_path};

/// Per-scenario pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    GenerateNetlist,
    RunSimulation,
    ReadResult,
    ComputeAnalytical,
    Collect,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::GenerateNetlist => "GENERATE_NETLIST",
            Stage::RunSimulation => "RUN_SIMULATION",
            Stage::ReadResult => "READ_RESULT",
            Stage::ComputeAnalytical => "COMPUTE_ANALYTICAL",
            Stage::Collect => "COLLECT",
        };
        f.write_str(name)
    }
}

/// A recoverable failure, scoped to one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub stage: Stage,
    pub message: String,
}

/// Simulator files for one scenario, all sharing the scenario's stem.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactPaths {
    pub netlist: PathBuf,
    pub rawfile: PathBuf,
    /// Console output captured by the runner.
    pub console: PathBuf,
    /// Log the simulator writes itself (LTspice), when present.
    pub simulator_log: PathBuf,
}

impl ArtifactPaths {
    fn for_netlist(netlist: PathBuf) -> Self {
        Self {
            rawfile: netlist.with_extension("raw"),
            console: console_path(&netlist),
            simulator_log: netlist.with_extension("log"),
            netlist,
        }
    }

    fn existing(&self) -> impl Iterator<Item = &Path> {
        [
            &self.netlist,
            &self.rawfile,
            &self.console,
            &self.simulator_log,
        ]
            .into_iter()
            .map(PathBuf::as_path)
            .filter(|p| p.exists())
    }

    /// Delete whichever artifacts exist. Failures are logged, never returned.
    fn remove(&self) {
        for path in self.existing() {
            if let Err(e) = std::fs::remove_file(path) {
                log::warn!("could not remove {}: {}", path.display(), e);
            }
        }
    }
}

/// Everything collected for one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: Scenario,
    pub params: CircuitParams,
    /// Theoretical quality factor, for labelling only.
    pub quality_factor: f64,
    pub coefficients: NumericCoefficients,
    pub analytical: AnalyticalCurve,
    pub simulated: Option<SimulatedCurve>,
    pub comparison: Option<ScenarioComparison>,
    /// Present when artifacts were written and retained.
    pub artifacts: Option<ArtifactPaths>,
    pub failures: Vec<StageFailure>,
}

impl ScenarioOutcome {
    /// Legend label, e.g. `R=1.0Ω (Q=1000.0)`.
    pub fn display_label(&self) -> String {
        format!(
            "R={:.1}Ω (Q={:.1})",
            self.scenario.resistance, self.quality_factor
        )
    }

    pub fn failed_at(&self, stage: Stage) -> bool {
        self.failures.iter().any(|f| f.stage == stage)
    }
}

/// Result of a whole run, handed to the rendering surface.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// `1/(2*pi*sqrt(L*C))`, shared by every scenario.
    pub resonant_frequency_hz: f64,
    /// One entry per scenario, in configuration order.
    pub outcomes: Vec<ScenarioOutcome>,
    pub comparison: ComparisonReport,
    /// Whether simulated results could be read at all in this run.
    pub reader_available: bool,
}

impl RunReport {
    /// Number of scenarios with a simulated curve.
    pub fn simulated_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.simulated.is_some()).count()
    }
}

/// A scenario with its coefficients resolved at startup.
#[derive(Debug, Clone)]
struct PreparedScenario {
    scenario: Scenario,
    params: CircuitParams,
    coefficients: NumericCoefficients,
}

/// Drives every scenario through the pipeline, one at a time.
pub struct Orchestrator {
    config: ValidationConfig,
    topology: CircuitTopology,
    transfer: SymbolicTransferFunction,
    sweep: FrequencySweep,
    scenarios: Vec<PreparedScenario>,
    simulator: Box<dyn Simulator>,
    reader: Option<Box<dyn ResultReader>>,
}

impl Orchestrator {
    /// Validate the configuration, derive `H(s)` and resolve every scenario.
    ///
    /// Any error returned here is fatal; no scenario has run yet.
    pub fn new(config: ValidationConfig) -> Result<Self> {
        config.validate()?;

        let topology = CircuitTopology::series_rlc_bandpass();
        let transfer = derive_transfer_function(&topology)?;
        log::debug!(
            "H(s) numerator [{}], denominator [{}]",
            join(transfer.numerator()),
            join(transfer.denominator())
        );

        let sweep = config.analytical_sweep()?;

        let scenarios = config
            .scenarios
            .iter()
            .map(|scenario| {
                let params = config.params_for(scenario)?;
                let coefficients = transfer.resolve(&params.bindings())?;
                Ok(PreparedScenario {
                    scenario: scenario.clone(),
                    params,
                    coefficients,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let reader = reader::detect(config.read_results);
        match &reader {
            Some(r) => log::debug!("result reader: {}", r.name()),
            None if config.read_results => {
                log::warn!("rawfile support not compiled in, simulated curves will be skipped")
            }
            None => log::info!("result reading disabled, running analytical curves only"),
        }

        let simulator = Box::new(ProcessSimulator::new(config.simulator.clone()));

        Ok(Self {
            config,
            topology,
            transfer,
            sweep,
            scenarios,
            simulator,
            reader,
        })
    }

    /// Replace the simulator process runner.
    pub fn with_simulator(mut self, simulator: Box<dyn Simulator>) -> Self {
        self.simulator = simulator;
        self
    }

    /// Replace the result reader selected at startup.
    pub fn with_reader(mut self, reader: Option<Box<dyn ResultReader>>) -> Self {
        self.reader = reader;
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    pub fn transfer_function(&self) -> &SymbolicTransferFunction {
        &self.transfer
    }

    pub fn sweep(&self) -> &FrequencySweep {
        &self.sweep
    }

    pub fn reader_available(&self) -> bool {
        self.reader.is_some()
    }

    /// Run every scenario in order. Never fails; see [`StageFailure`].
    pub fn run(&self) -> RunReport {
        let mut comparison = ComparisonReport::new("AC magnitude (normalized)");
        let mut outcomes = Vec::with_capacity(self.scenarios.len());

        for prepared in &self.scenarios {
            let outcome = self.run_scenario(prepared);
            match &outcome.comparison {
                Some(c) => comparison.add_comparison(c.clone()),
                None => comparison.add_skipped(&prepared.scenario.to_string()),
            }
            outcomes.push(outcome);
        }
        comparison.finalize();

        let resonant_frequency_hz = self
            .scenarios
            .first()
            .map_or(f64::NAN, |p| p.params.resonant_frequency_hz());

        RunReport {
            resonant_frequency_hz,
            outcomes,
            comparison,
            reader_available: self.reader.is_some(),
        }
    }

    fn run_scenario(&self, prepared: &PreparedScenario) -> ScenarioOutcome {
        let scenario = &prepared.scenario;
        let mut failures = Vec::new();
        let mut fail = |stage: Stage, message: String| {
            log::warn!("{}: {} failed: {}", scenario, stage, message);
            failures.push(StageFailure { stage, message });
        };

        let mut simulated = None;
        let mut artifacts = None;

        if self.config.read_results {
            let paths = ArtifactPaths::for_netlist(self.config.netlist_path(scenario));

            // GENERATE_NETLIST
            let netlist = render_netlist(
                &self.topology,
                &prepared.params,
                &self.config.signal,
                &self.config.sweep,
            );
            match write_netlist(&paths.netlist, &netlist) {
                Err(e) => fail(Stage::GenerateNetlist, e.to_string()),
                Ok(()) => {
                    // RUN_SIMULATION
                    match self.simulator.simulate(&paths.netlist) {
                        Err(e) => fail(Stage::RunSimulation, e.to_string()),
                        Ok(run) => {
                            log::info!(
                                "{}: {} finished in {:.2?}",
                                scenario,
                                self.simulator.name(),
                                run.elapsed
                            );
                            // READ_RESULT
                            match reader::read_simulated(
                                self.reader.as_deref(),
                                &run.rawfile,
                                &self.config.signal,
                            ) {
                                Ok(curve) => simulated = Some(curve),
                                Err(NoData::ReaderUnavailable) => {}
                                Err(reason) => fail(Stage::ReadResult, reason.to_string()),
                            }
                        }
                    }

                    if self.config.artifacts.retain {
                        artifacts = Some(paths);
                    } else {
                        paths.remove();
                    }
                }
            }
        }

        // COMPUTE_ANALYTICAL
        let analytical = frequency_response(&prepared.coefficients, &self.sweep);

        // COLLECT
        let comparison = simulated.as_ref().and_then(|sim| {
            compare_scenario(
                &scenario.to_string(),
                scenario.resistance,
                &prepared.coefficients,
                sim,
                &self.config.tolerances,
            )
        });

        let outcome = ScenarioOutcome {
            scenario: scenario.clone(),
            params: prepared.params,
            quality_factor: prepared.params.quality_factor(),
            coefficients: prepared.coefficients.clone(),
            analytical,
            simulated,
            comparison,
            artifacts,
            failures,
        };

        match outcome.analytical.peak() {
            Some((f, db)) => log::info!(
                "{}: analytical peak {:.3} dB at {:.2} Hz{}",
                outcome.display_label(),
                db,
                f,
                if outcome.simulated.is_some() {
                    ", simulated curve collected"
                } else {
                    ""
                }
            ),
            None => log::warn!("{}: analytical curve has no finite samples", outcome.display_label()),
        }

        outcome
    }
}

fn join(exprs: &[bandcheck_core::Expr]) -> String {
    exprs
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

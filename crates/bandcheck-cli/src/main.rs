//! Bandcheck command-line interface.

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use bandcheck_core::units::format_value;
use bandcheck_validate::{
    JsonExport, Orchestrator, ReportSink, SimulatorKind, TextSummary, ValidationConfig,
};
use clap::{Parser, ValueEnum};

#[derive(Parser)]
#[command(name = "bandcheck")]
#[command(
    about = "Validate the analytical RLC bandpass response against a SPICE simulator",
    long_about = None
)]
#[command(version)]
struct Cli {
    /// JSON configuration file (defaults are used for missing fields)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Simulator executable path or name on PATH
    #[arg(long, value_name = "PATH")]
    simulator: Option<String>,

    /// Simulator flavour
    #[arg(long, value_enum)]
    kind: Option<KindArg>,

    /// Simulator timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Directory for netlists, rawfiles and simulator logs
    #[arg(long, value_name = "DIR")]
    artifacts_dir: Option<PathBuf>,

    /// Delete simulator artifacts after each scenario
    #[arg(long)]
    cleanup: bool,

    /// Skip the simulator and only compute analytical curves
    #[arg(long)]
    analytical_only: bool,

    /// Also write curves and comparison results as JSON
    #[arg(long, value_name = "FILE")]
    json: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Ngspice,
    Ltspice,
}

impl From<KindArg> for SimulatorKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Ngspice => SimulatorKind::Ngspice,
            KindArg::Ltspice => SimulatorKind::Ltspice,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = load_config(&cli)?;
    log::info!(
        "L={}, C={}, {} scenarios, simulator {} ({})",
        format_value(config.inductance, "H"),
        format_value(config.capacitance, "F"),
        config.scenarios.len(),
        config.simulator.executable,
        config.simulator.kind
    );

    let orchestrator = Orchestrator::new(config).context("failed to set up validation run")?;
    let report = orchestrator.run();

    TextSummary::new(io::stdout().lock())
        .render(&report)
        .context("failed to write summary")?;

    if let Some(ref path) = cli.json {
        JsonExport::new(path)
            .render(&report)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    Ok(())
}

/// Load the configuration file, if any, and apply command-line overrides.
fn load_config(cli: &Cli) -> Result<ValidationConfig> {
    let mut config = match cli.config {
        Some(ref path) => ValidationConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ValidationConfig::default(),
    };

    if let Some(kind) = cli.kind {
        let kind = SimulatorKind::from(kind);
        // Follow the kind's executable unless one was configured explicitly.
        if config.simulator.executable == config.simulator.kind.default_executable() {
            config.simulator.executable = kind.default_executable().to_string();
        }
        config.simulator.kind = kind;
    }
    if let Some(ref executable) = cli.simulator {
        config.simulator.executable = executable.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.simulator.timeout_secs = timeout;
    }
    if let Some(ref dir) = cli.artifacts_dir {
        config.artifacts.directory = dir.clone();
    }
    if cli.cleanup {
        config.artifacts.retain = false;
    }
    if cli.analytical_only {
        config.read_results = false;
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

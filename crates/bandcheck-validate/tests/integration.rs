//! Integration tests for bandcheck-validate.
//!
//! Most tests drive the full pipeline against stand-in simulators: small shell
//! scripts that accept the real command lines and copy a prepared rawfile into
//! place. The test at the bottom needs a real ngspice.

use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bandcheck_core::{
    CircuitParams, CircuitTopology, FrequencySweep, NumericCoefficients, derive_transfer_function,
};
use bandcheck_validate::simulator::is_simulator_available;
use bandcheck_validate::{
    Orchestrator, RunReport, Scenario, SimulatorConfig, SimulatorKind, Stage, ValidationConfig,
};
use num_complex::Complex;

/// Writing an executable while another test forks can make exec fail with
/// "text file busy", so script tests run one at a time.
static SCRIPT_LOCK: Mutex<()> = Mutex::new(());

fn coefficients(resistance: f64) -> NumericCoefficients {
    let params = CircuitParams::new(resistance, 10e-3, 10e-9).unwrap();
    derive_transfer_function(&CircuitTopology::series_rlc_bandpass())
        .unwrap()
        .resolve(&params.bindings())
        .unwrap()
}

/// ASCII AC rawfile holding the exact response at `.ac dec 1000 1 1Meg`.
fn exact_rawfile(resistance: f64) -> String {
    let coeffs = coefficients(resistance);
    let sweep = FrequencySweep::logarithmic(1.0, 1e6, 6001).unwrap();

    let mut out = format!(
        "Title: * RLC bandpass filter\nDate: today\nPlotname: AC Analysis\nFlags: complex\n\
         No. Variables: 2\nNo. Points: {}\nVariables:\n\t0\tfrequency\tfrequency grid=3\n\
         \t1\tv(nout)\tvoltage\nValues:\n",
        sweep.len()
    );
    for (i, &f) in sweep.frequencies_hz().iter().enumerate() {
        let h = coeffs.evaluate(Complex::new(0.0, 2.0 * PI * f));
        out.push_str(&format!(" {}\t{:e},{:e}\n\t{:e},{:e}\n", i, f, 0.0, h.re, h.im));
    }
    out
}

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn artifacts(&self) -> PathBuf {
        let dir = self.path("artifacts");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Prepare one exact rawfile per scenario, named after its artifact stem.
    fn rawfiles(&self, scenarios: &[Scenario]) -> PathBuf {
        let dir = self.path("fixtures");
        std::fs::create_dir_all(&dir).unwrap();
        for scenario in scenarios {
            std::fs::write(
                dir.join(format!("{}.raw", scenario.artifact_stem())),
                exact_rawfile(scenario.resistance),
            )
            .unwrap();
        }
        dir
    }

    #[cfg(unix)]
    fn script(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.path(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn config(&self, executable: &Path, kind: SimulatorKind) -> ValidationConfig {
        let mut config = ValidationConfig::default();
        config.simulator = SimulatorConfig {
            executable: executable.to_string_lossy().into_owned(),
            kind,
            timeout_secs: 20,
        };
        config.artifacts.directory = self.artifacts();
        config.sweep.analytical_points = 2000;
        config
    }
}

fn run(config: ValidationConfig) -> RunReport {
    Orchestrator::new(config).unwrap().run()
}

#[cfg(unix)]
fn ngspice_stand_in(fixture: &Fixture, config: &ValidationConfig) -> PathBuf {
    // ngspice -b -r <raw> <netlist>
    let fixtures = fixture.rawfiles(&config.scenarios);
    fixture.script(
        "ngspice",
        &format!(
            "stem=$(basename \"$4\" .net)\necho \"stand-in ngspice: $stem\"\ncp \"{}/$stem.raw\" \"$3\"",
            fixtures.display()
        ),
    )
}

#[cfg(all(unix, feature = "rawfile"))]
#[test]
fn test_end_to_end_with_stand_in_simulator() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let fixture = Fixture::new();
    let mut config = fixture.config(Path::new("/unused"), SimulatorKind::Ngspice);
    let script = ngspice_stand_in(&fixture, &config);
    config.simulator.executable = script.to_string_lossy().into_owned();

    let report = run(config);

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.simulated_count(), 3);
    assert!(report.comparison.passed, "{}", report.comparison.to_text());
    assert_eq!(report.comparison.summary.total_scenarios, 3);

    let f0 = 1.0 / (2.0 * PI * (10e-3_f64 * 10e-9).sqrt());
    assert!((report.resonant_frequency_hz - f0).abs() < 1e-6);
    assert!((f0 - 15_915.494).abs() < 1e-3);

    for outcome in &report.outcomes {
        assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);

        let simulated = outcome.simulated.as_ref().unwrap();
        assert_eq!(simulated.len(), 6001);
        let (f_peak, db_peak) = simulated.peak().unwrap();
        assert_eq!(db_peak, 0.0);
        assert!((f_peak - f0).abs() / f0 < 0.0025, "peak at {}", f_peak);

        let comparison = outcome.comparison.as_ref().unwrap();
        assert!(comparison.max_deviation_db < 1e-6);

        let artifacts = outcome.artifacts.as_ref().unwrap();
        assert!(artifacts.netlist.exists());
        assert!(artifacts.rawfile.exists());
        let console = std::fs::read_to_string(&artifacts.console).unwrap();
        assert!(console.contains(&outcome.scenario.artifact_stem()));
    }
}

#[cfg(all(unix, feature = "rawfile"))]
#[test]
fn test_lower_resistance_gives_sharper_simulated_peak() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let fixture = Fixture::new();
    let mut config = fixture.config(Path::new("/unused"), SimulatorKind::Ngspice);
    config.scenarios.remove(1);
    let script = ngspice_stand_in(&fixture, &config);
    config.simulator.executable = script.to_string_lossy().into_owned();

    let report = run(config);
    let high_q = &report.outcomes[0];
    let low_q = &report.outcomes[1];
    assert!(high_q.quality_factor > low_q.quality_factor);

    // Points within 3 dB of the peak: fewer for the sharper resonance.
    let passband = |db: &[f64]| db.iter().filter(|&&v| v >= -3.0).count();
    let high = passband(&high_q.simulated.as_ref().unwrap().magnitude_db);
    let low = passband(&low_q.simulated.as_ref().unwrap().magnitude_db);
    assert!(high < low, "high Q passband {} vs low Q {}", high, low);

    let (f_high, _) = high_q.simulated.as_ref().unwrap().peak().unwrap();
    let (f_low, _) = low_q.simulated.as_ref().unwrap().peak().unwrap();
    assert!((f_high - f_low).abs() / f_high < 0.005);
}

#[cfg(all(unix, feature = "rawfile"))]
#[test]
fn test_ltspice_command_line_and_rawfile_location() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let fixture = Fixture::new();
    let mut config = fixture.config(Path::new("/unused"), SimulatorKind::Ltspice);
    config.scenarios.truncate(1);
    let fixtures = fixture.rawfiles(&config.scenarios);
    // LTspice -b <netlist>: rawfile and its own log beside the netlist
    let script = fixture.script(
        "LTspice",
        &format!(
            "[ \"$1\" = \"-b\" ] || exit 2\nstem=$(basename \"$2\" .net)\necho \"stand-in LTspice: $stem\"\n\
             echo \"Circuit: bandpass\" > \"${{2%.net}}.log\"\ncp \"{}/$stem.raw\" \"${{2%.net}}.raw\"",
            fixtures.display()
        ),
    );
    config.simulator.executable = script.to_string_lossy().into_owned();

    let report = run(config);
    let outcome = &report.outcomes[0];
    assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
    assert!(outcome.simulated.is_some());

    // Console capture and the simulator's own log do not overwrite each other.
    let artifacts = outcome.artifacts.as_ref().unwrap();
    let console = std::fs::read_to_string(&artifacts.console).unwrap();
    assert!(console.contains("stand-in LTspice"));
    let simulator_log = std::fs::read_to_string(&artifacts.simulator_log).unwrap();
    assert_eq!(simulator_log, "Circuit: bandpass\n");
}

#[cfg(all(unix, not(feature = "rawfile")))]
#[test]
fn test_simulator_runs_without_result_reader() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let fixture = Fixture::new();
    let mut config = fixture.config(Path::new("/unused"), SimulatorKind::Ngspice);
    let script = ngspice_stand_in(&fixture, &config);
    config.simulator.executable = script.to_string_lossy().into_owned();

    let report = run(config);

    assert!(!report.reader_available);
    assert_eq!(report.simulated_count(), 0);
    for outcome in &report.outcomes {
        assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
        assert!(outcome.simulated.is_none());
        assert!(outcome.comparison.is_none());
        // The simulator still ran and left its rawfile.
        assert!(outcome.artifacts.as_ref().unwrap().rawfile.exists());
        assert!(!outcome.analytical.is_empty());
    }
}

#[cfg(unix)]
#[test]
fn test_simulator_failure_keeps_analytical_curves() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let fixture = Fixture::new();
    let script = fixture.script(
        "ngspice",
        "echo \"Error: singular matrix\" >&2\nexit 1",
    );
    let report = run(fixture.config(&script, SimulatorKind::Ngspice));

    assert_eq!(report.simulated_count(), 0);
    assert_eq!(report.comparison.summary.skipped_scenarios, 3);
    for outcome in &report.outcomes {
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].stage, Stage::RunSimulation);
        assert!(outcome.failures[0].message.contains("singular matrix"));
        assert_eq!(outcome.analytical.len(), 2000);
    }
}

#[cfg(unix)]
#[test]
fn test_simulator_timeout_is_scenario_scoped() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let fixture = Fixture::new();
    let script = fixture.script("ngspice", "exec sleep 30");
    let mut config = fixture.config(&script, SimulatorKind::Ngspice);
    config.simulator.timeout_secs = 1;
    config.scenarios.truncate(1);

    let report = run(config);
    let outcome = &report.outcomes[0];
    assert!(outcome.failed_at(Stage::RunSimulation));
    assert!(outcome.failures[0].message.contains("timed out"));
    assert!(!outcome.analytical.is_empty());
}

#[test]
fn test_missing_simulator_still_gives_analytical_curves() {
    let fixture = Fixture::new();
    let config = fixture.config(&fixture.path("no-such-ngspice"), SimulatorKind::Ngspice);
    let report = run(config);

    assert_eq!(report.outcomes.len(), 3);
    for outcome in &report.outcomes {
        assert!(outcome.failed_at(Stage::RunSimulation));
        assert!(outcome.failures[0].message.contains("simulator not found"));
        assert!(outcome.simulated.is_none());
        let (f_peak, _) = outcome.analytical.peak().unwrap();
        assert!((f_peak - 15_915.494).abs() / 15_915.494 < 0.01);
    }
}

#[cfg(unix)]
#[test]
fn test_unwritable_netlist_skips_only_that_scenario() {
    let _guard = SCRIPT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let fixture = Fixture::new();
    let mut config = fixture.config(Path::new("/unused"), SimulatorKind::Ngspice);
    let script = ngspice_stand_in(&fixture, &config);
    config.simulator.executable = script.to_string_lossy().into_owned();
    // A directory where the R=10 netlist should go makes that write fail.
    std::fs::create_dir_all(config.netlist_path(&config.scenarios[1])).unwrap();

    let report = run(config);

    assert_eq!(report.outcomes.len(), 3);
    let blocked = &report.outcomes[1];
    assert_eq!(blocked.scenario.resistance, 10.0);
    assert_eq!(blocked.failures.len(), 1);
    assert_eq!(blocked.failures[0].stage, Stage::GenerateNetlist);
    assert!(blocked.simulated.is_none());
    assert!(!blocked.analytical.is_empty());

    for outcome in [&report.outcomes[0], &report.outcomes[2]] {
        assert!(outcome.failures.is_empty(), "{:?}", outcome.failures);
        assert_eq!(outcome.simulated.is_some(), cfg!(feature = "rawfile"));
    }
    if cfg!(feature = "rawfile") {
        assert_eq!(report.simulated_count(), 2);
    }
}

#[test]
fn test_unwritable_artifact_directory_skips_only_the_simulator_chain() {
    let fixture = Fixture::new();
    let mut config = fixture.config(&fixture.path("no-such-ngspice"), SimulatorKind::Ngspice);
    config.artifacts.directory = fixture.path("does").join("not").join("exist");
    let report = run(config);

    assert_eq!(report.outcomes.len(), 3);
    for outcome in &report.outcomes {
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].stage, Stage::GenerateNetlist);
        assert!(outcome.artifacts.is_none());
        assert!(!outcome.analytical.is_empty());
    }
}

#[test]
fn test_quality_factor_ordering() {
    let config = ValidationConfig {
        read_results: false,
        ..Default::default()
    };
    let report = run(config);
    let q: Vec<f64> = report.outcomes.iter().map(|o| o.quality_factor).collect();
    assert!(q[0] > q[1] && q[1] > q[2], "{:?}", q);
    assert!((q[0] - 1000.0).abs() < 1e-6);
}

#[test]
#[ignore = "requires ngspice"]
fn test_real_ngspice() {
    if !is_simulator_available(&SimulatorConfig::default()) {
        eprintln!("ngspice not available, skipping test");
        return;
    }

    let fixture = Fixture::new();
    let config = fixture.config(Path::new("ngspice"), SimulatorKind::Ngspice);
    let report = run(config);

    println!("Report:\n{}", report.comparison.to_text());
    assert_eq!(report.simulated_count(), 3);
    for outcome in &report.outcomes {
        let comparison = outcome.comparison.as_ref().unwrap();
        assert!(comparison.peak_frequency_error < 0.01);
    }
}

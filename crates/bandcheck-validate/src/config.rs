//! Run configuration.
//!
//! Everything here is fixed at startup. Values load from JSON; any field left
//! out falls back to the defaults below, which reproduce the reference
//! 10 mH / 10 nF filter at three quality factors.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use bandcheck_core::units::parse_value;
use bandcheck_core::{CircuitParams, CircuitTopology, FrequencySweep};
use serde::{Deserialize, Deserializer, Serialize};

use crate::compare::AcTolerances;
use crate::error::{Error, Result};

/// Minimum simulated sweep density needed to resolve a Q=1000 peak.
pub const MIN_SIMULATED_POINTS_PER_DECADE: usize = 1000;

/// External simulator flavour. Selects the batch-mode command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulatorKind {
    /// `ngspice -b -r <raw> <netlist>`
    #[default]
    Ngspice,
    /// `LTspice -b <netlist>`; the rawfile lands beside the netlist.
    Ltspice,
}

impl SimulatorKind {
    pub fn default_executable(self) -> &'static str {
        match self {
            SimulatorKind::Ngspice => "ngspice",
            SimulatorKind::Ltspice => "LTspice",
        }
    }
}

impl fmt::Display for SimulatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulatorKind::Ngspice => f.write_str("ngspice"),
            SimulatorKind::Ltspice => f.write_str("ltspice"),
        }
    }
}

/// Configuration for the simulator runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Executable path, or a bare name looked up on `PATH`.
    pub executable: String,
    pub kind: SimulatorKind,
    /// Timeout for one simulation in seconds.
    pub timeout_secs: u64,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            executable: SimulatorKind::Ngspice.default_executable().to_string(),
            kind: SimulatorKind::Ngspice,
            timeout_secs: 60,
        }
    }
}

/// Line style handed to the rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
}

/// One quality-factor case under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Load resistance (Ohm). Accepts numbers or SPICE strings like `"4.7k"`.
    #[serde(deserialize_with = "spice_value")]
    pub resistance: f64,
    pub label: String,
    pub color: String,
    pub line_style: LineStyle,
}

impl Scenario {
    pub fn new(resistance: f64, label: &str, color: &str, line_style: LineStyle) -> Self {
        Self {
            resistance,
            label: label.to_string(),
            color: color.to_string(),
            line_style,
        }
    }

    /// File stem shared by this scenario's netlist, rawfile and log.
    pub fn artifact_stem(&self) -> String {
        format!("bandpass_R_{:.1}", self.resistance)
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R={:.1}Ω ({})", self.resistance, self.label)
    }
}

/// Frequency range and densities for both curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    #[serde(deserialize_with = "spice_value")]
    pub fstart: f64,
    #[serde(deserialize_with = "spice_value")]
    pub fstop: f64,
    /// Total analytical samples, log-spaced.
    pub analytical_points: usize,
    /// Simulator `.ac dec` density.
    pub simulated_points_per_decade: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            fstart: 1.0,
            fstop: 1e6,
            analytical_points: 5000,
            simulated_points_per_decade: MIN_SIMULATED_POINTS_PER_DECADE,
        }
    }
}

/// Where simulator artifacts go and whether they survive the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub directory: PathBuf,
    pub retain: bool,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            retain: true,
        }
    }
}

/// Complete validation run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub simulator: SimulatorConfig,
    /// Series inductance (H).
    #[serde(deserialize_with = "spice_value")]
    pub inductance: f64,
    /// Series capacitance (F).
    #[serde(deserialize_with = "spice_value")]
    pub capacitance: f64,
    pub scenarios: Vec<Scenario>,
    pub sweep: SweepConfig,
    /// Simulator signal holding the output voltage.
    pub signal: String,
    pub artifacts: ArtifactConfig,
    /// Read simulator output. When false the run is analytical-only.
    pub read_results: bool,
    pub tolerances: AcTolerances,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            simulator: SimulatorConfig::default(),
            inductance: 10e-3,
            capacitance: 10e-9,
            scenarios: vec![
                Scenario::new(1.0, "High Q", "red", LineStyle::Solid),
                Scenario::new(10.0, "Medium Q", "blue", LineStyle::Dashed),
                Scenario::new(100.0, "Low Q", "green", LineStyle::Dotted),
            ],
            sweep: SweepConfig::default(),
            signal: CircuitTopology::series_rlc_bandpass().output_signal(),
            artifacts: ArtifactConfig::default(),
            read_results: true,
            tolerances: AcTolerances::default(),
        }
    }
}

impl ValidationConfig {
    /// Load and validate a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate a JSON configuration string.
    pub fn from_json(content: &str) -> Result<Self> {
        let config: ValidationConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value the run depends on. Any error here is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.scenarios.is_empty() {
            return Err(Error::InvalidConfig("no scenarios configured".to_string()));
        }

        let mut stems = HashSet::new();
        for scenario in &self.scenarios {
            self.params_for(scenario)?;
            if !stems.insert(scenario.artifact_stem()) {
                return Err(Error::InvalidConfig(format!(
                    "scenarios share artifact name {}",
                    scenario.artifact_stem()
                )));
            }
        }

        self.analytical_sweep()?;
        if self.sweep.simulated_points_per_decade < MIN_SIMULATED_POINTS_PER_DECADE {
            return Err(Error::InvalidConfig(format!(
                "simulated sweep needs at least {} points per decade, got {}",
                MIN_SIMULATED_POINTS_PER_DECADE, self.sweep.simulated_points_per_decade
            )));
        }

        if self.signal.trim().is_empty() {
            return Err(Error::InvalidConfig("output signal name is empty".to_string()));
        }
        if self.simulator.executable.trim().is_empty() {
            return Err(Error::InvalidConfig("simulator executable is empty".to_string()));
        }
        if self.simulator.timeout_secs == 0 {
            return Err(Error::InvalidConfig("simulator timeout must be positive".to_string()));
        }
        if !self.tolerances.is_valid() {
            return Err(Error::InvalidConfig(
                "tolerances must be finite and non-negative".to_string(),
            ));
        }

        Ok(())
    }

    /// Circuit values for one scenario.
    pub fn params_for(&self, scenario: &Scenario) -> Result<CircuitParams> {
        Ok(CircuitParams::new(
            scenario.resistance,
            self.inductance,
            self.capacitance,
        )?)
    }

    /// The shared analytical sweep.
    pub fn analytical_sweep(&self) -> Result<FrequencySweep> {
        Ok(FrequencySweep::logarithmic(
            self.sweep.fstart,
            self.sweep.fstop,
            self.sweep.analytical_points,
        )?)
    }

    /// Netlist location for a scenario inside the artifact directory.
    pub fn netlist_path(&self, scenario: &Scenario) -> PathBuf {
        self.artifacts
            .directory
            .join(format!("{}.net", scenario.artifact_stem()))
    }
}

/// Deserialize a number or a SPICE value string (`"10m"`, `"1Meg"`).
fn spice_value<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(v) => Ok(v),
        Raw::Text(s) => parse_value(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid value: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ValidationConfig::default();
        config.validate().unwrap();
        assert_eq!(config.scenarios.len(), 3);
        assert_eq!(config.signal, "V(Nout)");
        assert_eq!(config.simulator.executable, "ngspice");
        assert_eq!(config.simulator.timeout_secs, 60);
        assert!(config.artifacts.retain);
        assert_eq!(config.sweep.analytical_points, 5000);
    }

    #[test]
    fn test_artifact_stem() {
        let scenario = Scenario::new(1.0, "High Q", "red", LineStyle::Solid);
        assert_eq!(scenario.artifact_stem(), "bandpass_R_1.0");
        let scenario = Scenario::new(100.0, "Low Q", "green", LineStyle::Dotted);
        assert_eq!(scenario.artifact_stem(), "bandpass_R_100.0");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "inductance": "10m",
            "capacitance": 1e-8,
            "scenarios": [
                {"resistance": "4.7", "label": "A", "color": "black", "line_style": "solid"},
                {"resistance": 47, "label": "B", "color": "gray", "line_style": "dashed"}
            ],
            "simulator": {"kind": "ltspice", "executable": "/opt/ltspice/LTspice"}
        }"#;
        let config = ValidationConfig::from_json(json).unwrap();
        assert!((config.inductance - 10e-3).abs() < 1e-15);
        assert_eq!(config.scenarios.len(), 2);
        assert!((config.scenarios[0].resistance - 4.7).abs() < 1e-12);
        assert_eq!(config.simulator.kind, SimulatorKind::Ltspice);
        assert_eq!(config.simulator.timeout_secs, 60);
        assert_eq!(config.sweep.simulated_points_per_decade, 1000);
    }

    #[test]
    fn test_rejects_empty_scenarios() {
        let config = ValidationConfig {
            scenarios: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_duplicate_resistance() {
        let mut config = ValidationConfig::default();
        config.scenarios[1].resistance = 1.0;
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_sparse_simulated_sweep() {
        let mut config = ValidationConfig::default();
        config.sweep.simulated_points_per_decade = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_component() {
        let config = ValidationConfig {
            capacitance: -1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Model(_))));
    }

    #[test]
    fn test_rejects_bad_value_string() {
        let json = r#"{"inductance": "ten millihenry"}"#;
        assert!(matches!(ValidationConfig::from_json(json), Err(Error::Json(_))));
    }
}

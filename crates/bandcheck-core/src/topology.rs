//! The fixed series R-L-C bandpass topology and its parameter values.
//!
//! ```text
//!  Nin ──L1── N1 ──C1── Nout
//!   │                    │
//!   V1 (AC 1)            R1   <- output taken across R1
//!   │                    │
//!  GND ─────────────────GND
//! ```

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::symbolic::{Bindings, Symbol};

/// Kind of a two-terminal passive element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Resistor,
    Inductor,
    Capacitor,
}

impl ElementKind {
    /// The parameter symbol that sets this element's value.
    pub fn symbol(self) -> Symbol {
        match self {
            ElementKind::Resistor => Symbol::Resistance,
            ElementKind::Inductor => Symbol::Inductance,
            ElementKind::Capacitor => Symbol::Capacitance,
        }
    }
}

/// One element of the series chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesElement {
    /// SPICE instance name, e.g. `L1`.
    pub name: &'static str,
    pub kind: ElementKind,
    pub from: &'static str,
    pub to: &'static str,
}

/// Structural description of the filter. Only parameter values vary between
/// scenarios; the structure is fixed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitTopology {
    source_name: &'static str,
    input_node: &'static str,
    ground_node: &'static str,
    elements: [SeriesElement; 3],
    output_index: usize,
}

impl CircuitTopology {
    /// Series inductor, series capacitor, resistive output load.
    pub const fn series_rlc_bandpass() -> Self {
        Self {
            source_name: "V1",
            input_node: "Nin",
            ground_node: "0",
            elements: [
                SeriesElement {
                    name: "L1",
                    kind: ElementKind::Inductor,
                    from: "Nin",
                    to: "N1",
                },
                SeriesElement {
                    name: "C1",
                    kind: ElementKind::Capacitor,
                    from: "N1",
                    to: "Nout",
                },
                SeriesElement {
                    name: "R1",
                    kind: ElementKind::Resistor,
                    from: "Nout",
                    to: "0",
                },
            ],
            output_index: 2,
        }
    }

    pub fn source_name(&self) -> &'static str {
        self.source_name
    }

    pub fn input_node(&self) -> &'static str {
        self.input_node
    }

    pub fn ground_node(&self) -> &'static str {
        self.ground_node
    }

    /// Elements in order from the source to ground.
    pub fn elements(&self) -> &[SeriesElement] {
        &self.elements
    }

    /// The element the output voltage is measured across.
    pub fn output_element(&self) -> &SeriesElement {
        &self.elements[self.output_index]
    }

    /// Node carrying the output voltage.
    pub fn output_node(&self) -> &'static str {
        self.output_element().from
    }

    /// Simulator expression for the output voltage, e.g. `V(Nout)`.
    pub fn output_signal(&self) -> String {
        format!("V({})", self.output_node())
    }
}

impl Default for CircuitTopology {
    fn default() -> Self {
        Self::series_rlc_bandpass()
    }
}

/// Concrete component values for one evaluation of the topology.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircuitParams {
    /// Load resistance (Ohm).
    pub resistance: f64,
    /// Series inductance (H).
    pub inductance: f64,
    /// Series capacitance (F).
    pub capacitance: f64,
}

impl CircuitParams {
    pub fn new(resistance: f64, inductance: f64, capacitance: f64) -> Result<Self> {
        let params = Self {
            resistance,
            inductance,
            capacitance,
        };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("resistance", self.resistance),
            ("inductance", self.inductance),
            ("capacitance", self.capacitance),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    /// Symbol bindings for coefficient resolution.
    pub fn bindings(&self) -> Bindings {
        Bindings::new()
            .with(Symbol::Resistance, self.resistance)
            .with(Symbol::Inductance, self.inductance)
            .with(Symbol::Capacitance, self.capacitance)
    }

    /// Resonant angular frequency `1/sqrt(LC)` (rad/s).
    pub fn resonant_angular_frequency(&self) -> f64 {
        1.0 / (self.inductance * self.capacitance).sqrt()
    }

    /// Resonant frequency `1/(2*pi*sqrt(LC))` (Hz).
    pub fn resonant_frequency_hz(&self) -> f64 {
        self.resonant_angular_frequency() / (2.0 * PI)
    }

    /// Damping rate `R/L` (rad/s).
    pub fn damping_rate(&self) -> f64 {
        self.resistance / self.inductance
    }

    /// Theoretical quality factor `w0 / (R/L)`.
    pub fn quality_factor(&self) -> f64 {
        self.resonant_angular_frequency() / self.damping_rate()
    }
}

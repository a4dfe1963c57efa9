//! Netlist generation for the external simulator.

use std::fmt::Write as _;
use std::path::Path;

use bandcheck_core::units::format_spice_value;
use bandcheck_core::{CircuitParams, CircuitTopology, ElementKind};

use crate::config::SweepConfig;
use crate::error::{Error, Result};

/// Render the simulator input for one scenario.
///
/// The deck drives the input with a unit AC source, saves only the output
/// signal, and sweeps the same decade range as the analytical curve.
pub fn render_netlist(
    topology: &CircuitTopology,
    params: &CircuitParams,
    signal: &str,
    sweep: &SweepConfig,
) -> String {
    let mut out = String::new();

    // The first line of a SPICE deck is always the title.
    let _ = writeln!(
        out,
        "* RLC bandpass filter, R={} (output {})",
        format_spice_value(params.resistance),
        signal
    );
    let _ = writeln!(
        out,
        "{} {} {} AC 1",
        topology.source_name(),
        topology.input_node(),
        topology.ground_node()
    );

    for element in topology.elements() {
        let value = match element.kind {
            ElementKind::Resistor => params.resistance,
            ElementKind::Inductor => params.inductance,
            ElementKind::Capacitor => params.capacitance,
        };
        let _ = writeln!(
            out,
            "{} {} {} {}",
            element.name,
            element.from,
            element.to,
            format_spice_value(value)
        );
    }

    let _ = writeln!(out, ".save {}", signal);
    let _ = writeln!(
        out,
        ".ac dec {} {} {}",
        sweep.simulated_points_per_decade,
        format_spice_value(sweep.fstart),
        format_spice_value(sweep.fstop)
    );
    out.push_str(".end\n");

    out
}

/// Write a rendered netlist, creating or overwriting `path`.
pub fn write_netlist(path: &Path, netlist: &str) -> Result<()> {
    std::fs::write(path, netlist).map_err(|source| Error::NetlistWrite {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("wrote netlist {}", path.display());
    Ok(())
}

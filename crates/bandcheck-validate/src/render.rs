//! Rendering surfaces for a finished run.
//!
//! Plotting is left to whatever consumes the JSON export; the sinks here only
//! summarize or serialize.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use bandcheck_core::AnalyticalCurve;
use bandcheck_core::units::format_value;
use serde::Serialize;

use crate::compare::ComparisonReport;
use crate::config::{LineStyle, Scenario};
use crate::error::Result;
use crate::orchestrator::{RunReport, ScenarioOutcome, StageFailure};
use crate::reader::SimulatedCurve;

/// Consumer of a finished run.
pub trait ReportSink {
    fn render(&mut self, report: &RunReport) -> Result<()>;
}

/// Human-readable summary.
pub struct TextSummary<W: Write> {
    out: W,
}

impl<W: Write> TextSummary<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_outcome(&mut self, outcome: &ScenarioOutcome) -> Result<()> {
        write!(
            self.out,
            "  {} [{}]",
            outcome.display_label(),
            outcome.scenario.label
        )?;
        match outcome.analytical.peak() {
            Some((f, db)) => write!(
                self.out,
                ": analytical peak {:.3} dB at {}",
                db,
                format_value(f, "Hz")
            )?,
            None => write!(self.out, ": analytical curve empty")?,
        }
        match (&outcome.simulated, &outcome.comparison) {
            (Some(_), Some(c)) => writeln!(
                self.out,
                ", simulated {} ({:.3} dB max deviation)",
                if c.passed { "PASS" } else { "FAIL" },
                c.max_deviation_db
            )?,
            (Some(sim), None) => writeln!(self.out, ", simulated {} points", sim.len())?,
            (None, _) => writeln!(self.out, ", no simulated data")?,
        }

        for StageFailure { stage, message } in &outcome.failures {
            let first_line = message.lines().next().unwrap_or_default();
            writeln!(self.out, "    {} failed: {}", stage, first_line)?;
        }
        Ok(())
    }
}

impl<W: Write> ReportSink for TextSummary<W> {
    fn render(&mut self, report: &RunReport) -> Result<()> {
        writeln!(
            self.out,
            "Series RLC bandpass, resonant frequency {}",
            format_value(report.resonant_frequency_hz, "Hz")
        )?;
        if !report.reader_available {
            writeln!(self.out, "Simulated results not read (analytical only)")?;
        }
        writeln!(self.out)?;

        for outcome in &report.outcomes {
            self.write_outcome(outcome)?;
        }

        if report.reader_available {
            writeln!(self.out)?;
            self.out.write_all(report.comparison.to_text().as_bytes())?;
        }
        self.out.flush()?;
        Ok(())
    }
}

/// One plotted series with its display metadata.
#[derive(Debug, Serialize)]
struct ExportedScenario<'a> {
    label: String,
    scenario: &'a Scenario,
    color: &'a str,
    line_style: LineStyle,
    quality_factor: f64,
    analytical: &'a AnalyticalCurve,
    simulated: Option<&'a SimulatedCurve>,
    failures: &'a [StageFailure],
}

#[derive(Debug, Serialize)]
struct Export<'a> {
    /// Reference marker for the plot.
    resonant_frequency_hz: f64,
    reader_available: bool,
    scenarios: Vec<ExportedScenario<'a>>,
    comparison: &'a ComparisonReport,
}

/// Writes curves, display metadata and the comparison as pretty JSON.
#[derive(Debug, Clone)]
pub struct JsonExport {
    path: PathBuf,
}

impl JsonExport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportSink for JsonExport {
    fn render(&mut self, report: &RunReport) -> Result<()> {
        let export = Export {
            resonant_frequency_hz: report.resonant_frequency_hz,
            reader_available: report.reader_available,
            scenarios: report
                .outcomes
                .iter()
                .map(|o| ExportedScenario {
                    label: o.display_label(),
                    scenario: &o.scenario,
                    color: &o.scenario.color,
                    line_style: o.scenario.line_style,
                    quality_factor: o.quality_factor,
                    analytical: &o.analytical,
                    simulated: o.simulated.as_ref(),
                    failures: &o.failures,
                })
                .collect(),
            comparison: &report.comparison,
        };

        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &export)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        log::info!("wrote {}", self.path.display());
        Ok(())
    }
}

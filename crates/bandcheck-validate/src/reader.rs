//! Reading simulated curves back from simulator artifacts.
//!
//! Whether rawfiles can be read at all is decided once, at startup, by
//! [`detect`]. Everything after that either yields a [`SimulatedCurve`] or a
//! [`NoData`] reason; nothing read from disk can abort a run.

use std::fmt;
use std::path::Path;

use bandcheck_core::peak_of;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::simulator::AcTrace;

/// Lowest normalized magnitude kept in a simulated curve (dB).
///
/// Zero-magnitude samples would otherwise be `-inf`, which JSON cannot carry.
pub const MAGNITUDE_FLOOR_DB: f64 = -400.0;

/// Optional capability that extracts one AC signal from a result file.
pub trait ResultReader {
    /// Short name for log messages.
    fn name(&self) -> &'static str;

    /// Extract `signal` from the result file at `path`.
    fn read_trace(&self, path: &Path, signal: &str) -> Result<AcTrace>;
}

/// Reads ngspice and LTspice rawfiles.
#[cfg(feature = "rawfile")]
#[derive(Debug, Clone, Copy, Default)]
pub struct RawfileReader;

#[cfg(feature = "rawfile")]
impl ResultReader for RawfileReader {
    fn name(&self) -> &'static str {
        "rawfile"
    }

    fn read_trace(&self, path: &Path, signal: &str) -> Result<AcTrace> {
        let bytes = std::fs::read(path)?;
        if bytes.is_empty() {
            return Err(crate::error::Error::RawfileParseError(
                "simulator produced empty rawfile".to_string(),
            ));
        }
        let data = crate::simulator::parse_rawfile(&bytes)?;
        AcTrace::from_rawfile(&data, signal)
    }
}

/// Select the result reader for this run.
///
/// Returns `None` when reading is switched off or no reader was compiled in;
/// the run is then analytical-only.
pub fn detect(enabled: bool) -> Option<Box<dyn ResultReader>> {
    if !enabled {
        return None;
    }

    #[cfg(feature = "rawfile")]
    {
        Some(Box::new(RawfileReader))
    }
    #[cfg(not(feature = "rawfile"))]
    {
        None
    }
}

/// Simulated magnitude, shifted so its peak is exactly 0 dB.
///
/// Samples below [`MAGNITUDE_FLOOR_DB`] are clamped to it. A NaN sample stays
/// NaN; it is exported as `null` and skipped by the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedCurve {
    /// Signal name as found in the result file.
    pub signal: String,
    /// Frequency samples (Hz).
    pub frequencies_hz: Vec<f64>,
    /// Normalized magnitude (dB).
    pub magnitude_db: Vec<f64>,
}

impl SimulatedCurve {
    /// Convert a trace to dB and subtract its maximum from every sample.
    pub fn from_trace(trace: &AcTrace) -> std::result::Result<Self, NoData> {
        if trace.is_empty() {
            return Err(NoData::EmptySignal(trace.name.clone()));
        }

        let raw_db = trace.magnitude_db();
        let (_, peak) = peak_of(&trace.frequencies, &raw_db).ok_or(NoData::NoFinitePeak)?;

        Ok(Self {
            signal: trace.name.clone(),
            frequencies_hz: trace.frequencies.clone(),
            magnitude_db: raw_db
                .iter()
                .map(|db| {
                    let normalized = db - peak;
                    if normalized.is_nan() {
                        normalized
                    } else {
                        normalized.max(MAGNITUDE_FLOOR_DB)
                    }
                })
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.frequencies_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }

    /// Sample with the largest magnitude, as `(frequency_hz, magnitude_db)`.
    pub fn peak(&self) -> Option<(f64, f64)> {
        peak_of(&self.frequencies_hz, &self.magnitude_db)
    }
}

/// Why a scenario has no simulated curve.
#[derive(Debug, Clone, PartialEq)]
pub enum NoData {
    /// No result reader for this run.
    ReaderUnavailable,
    /// The simulator left no result file.
    MissingArtifact(String),
    /// The result file could not be parsed or lacks the signal.
    Unreadable(String),
    /// The signal exists but has no samples.
    EmptySignal(String),
    /// Every sample is zero or non-finite.
    NoFinitePeak,
}

impl fmt::Display for NoData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoData::ReaderUnavailable => f.write_str("result reader unavailable"),
            NoData::MissingArtifact(path) => write!(f, "no result file at {}", path),
            NoData::Unreadable(reason) => write!(f, "unreadable result file: {}", reason),
            NoData::EmptySignal(name) => write!(f, "signal {} has no samples", name),
            NoData::NoFinitePeak => f.write_str("signal has no finite magnitude"),
        }
    }
}

/// Read and normalize one scenario's simulated curve.
pub fn read_simulated(
    reader: Option<&dyn ResultReader>,
    path: &Path,
    signal: &str,
) -> std::result::Result<SimulatedCurve, NoData> {
    let reader = reader.ok_or(NoData::ReaderUnavailable)?;
    if !path.is_file() {
        return Err(NoData::MissingArtifact(path.display().to_string()));
    }

    let trace = reader
        .read_trace(path, signal)
        .map_err(|e| NoData::Unreadable(e.to_string()))?;
    SimulatedCurve::from_trace(&trace)
}

/// Like [`read_simulated`], logging the reason when there is no data.
pub fn read_simulated_curve(
    reader: Option<&dyn ResultReader>,
    path: &Path,
    signal: &str,
) -> Option<SimulatedCurve> {
    match read_simulated(reader, path, signal) {
        Ok(curve) => {
            log::debug!(
                "read {} samples of {} from {}",
                curve.len(),
                curve.signal,
                path.display()
            );
            Some(curve)
        }
        Err(NoData::ReaderUnavailable) => None,
        Err(reason) => {
            log::warn!("no simulated data for {}: {}", path.display(), reason);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;

    fn trace(values: &[f64]) -> AcTrace {
        AcTrace {
            name: "v(nout)".to_string(),
            frequencies: (1..=values.len()).map(|i| i as f64 * 10.0).collect(),
            values: values.iter().map(|&v| Complex::new(v, 0.0)).collect(),
        }
    }

    #[test]
    fn test_normalized_peak_is_zero_db() {
        for scale in [1e-6, 0.5, 1.0, 3.0, 1e6] {
            let t = trace(&[0.1 * scale, 0.7 * scale, 0.2 * scale]);
            let curve = SimulatedCurve::from_trace(&t).unwrap();
            let (f, db) = curve.peak().unwrap();
            assert_eq!(f, 20.0);
            assert_eq!(db, 0.0);
            assert!(curve.magnitude_db.iter().all(|&v| v <= 0.0));
        }
    }

    #[test]
    fn test_shape_is_preserved() {
        let curve = SimulatedCurve::from_trace(&trace(&[0.1, 1.0])).unwrap();
        assert!((curve.magnitude_db[0] + 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_samples_clamp_to_floor() {
        let curve = SimulatedCurve::from_trace(&trace(&[0.0, 1.0, 0.2])).unwrap();
        assert_eq!(curve.magnitude_db[0], MAGNITUDE_FLOOR_DB);
        assert_eq!(curve.magnitude_db[1], 0.0);
        assert!(curve.magnitude_db.iter().all(|v| v.is_finite()));

        let json = serde_json::to_value(&curve).unwrap();
        assert_eq!(json["magnitude_db"][0], MAGNITUDE_FLOOR_DB);
        let back: SimulatedCurve = serde_json::from_value(json).unwrap();
        assert_eq!(back, curve);
    }

    #[test]
    fn test_all_zero_signal_is_no_data() {
        assert_eq!(
            SimulatedCurve::from_trace(&trace(&[0.0, 0.0])),
            Err(NoData::NoFinitePeak)
        );
    }

    #[test]
    fn test_empty_signal_is_no_data() {
        assert!(matches!(
            SimulatedCurve::from_trace(&trace(&[])),
            Err(NoData::EmptySignal(_))
        ));
    }

    #[test]
    fn test_missing_artifact_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bandpass_R_1.0.raw");
        let reader = detect(true);
        let result = read_simulated(reader.as_deref(), &path, "V(Nout)");
        if reader.is_some() {
            assert!(matches!(result, Err(NoData::MissingArtifact(_))));
        } else {
            assert_eq!(result, Err(NoData::ReaderUnavailable));
        }
        assert!(read_simulated_curve(reader.as_deref(), &path, "V(Nout)").is_none());
    }

    #[test]
    fn test_disabled_reader() {
        assert!(detect(false).is_none());
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            read_simulated(None, dir.path(), "V(Nout)"),
            Err(NoData::ReaderUnavailable)
        );
    }

    #[cfg(feature = "rawfile")]
    #[test]
    fn test_corrupt_artifact_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.raw");
        std::fs::write(&path, b"this is not a rawfile").unwrap();
        assert!(matches!(
            read_simulated(Some(&RawfileReader), &path, "V(Nout)"),
            Err(NoData::Unreadable(_))
        ));

        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            read_simulated(Some(&RawfileReader), &path, "V(Nout)"),
            Err(NoData::Unreadable(_))
        ));
    }

    #[cfg(feature = "rawfile")]
    #[test]
    fn test_reads_ascii_rawfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.raw");
        std::fs::write(
            &path,
            "Title: x\nPlotname: AC Analysis\nFlags: complex\nNo. Variables: 2\nNo. Points: 2\n\
             Variables:\n\t0\tfrequency\tfrequency\n\t1\tv(nout)\tvoltage\nValues:\n\
             0\t1e3,0\n\t0.5,0\n1\t1e4,0\n\t0,0.05\n",
        )
        .unwrap();

        let curve = read_simulated(Some(&RawfileReader), &path, "V(Nout)").unwrap();
        assert_eq!(curve.frequencies_hz, vec![1e3, 1e4]);
        assert_eq!(curve.magnitude_db[0], 0.0);
        assert!((curve.magnitude_db[1] + 20.0).abs() < 1e-9);

        assert!(matches!(
            read_simulated(Some(&RawfileReader), &path, "V(N1)"),
            Err(NoData::Unreadable(_))
        ));
    }
}

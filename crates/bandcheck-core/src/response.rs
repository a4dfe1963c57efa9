//! Analytical frequency response of a rational transfer function.

use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::sweep::FrequencySweep;
use crate::transfer::NumericCoefficients;

/// Magnitude and phase of `H(j*w)` over a sweep, for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticalCurve {
    /// Frequency samples (Hz).
    pub frequencies_hz: Vec<f64>,
    /// Absolute magnitude (dB), not normalized.
    pub magnitude_db: Vec<f64>,
    /// Unwrapped phase (degrees).
    pub phase_deg: Vec<f64>,
}

impl AnalyticalCurve {
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

/// `(frequency, value)` at the maximum finite value of a series.
pub fn peak_of(frequencies_hz: &[f64], values: &[f64]) -> Option<(f64, f64)> {
    frequencies_hz
        .iter()
        .zip(values)
        .filter(|(_, v)| v.is_finite())
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(&f, &v)| (f, v))
}

/// Magnitude of `H(j*2*pi*f)` in dB.
///
/// Computed as `20*log10|N| - 20*log10|D|` so that very small or very large
/// ratios never pass through a linear-domain quotient.
pub fn magnitude_db_at(coeffs: &NumericCoefficients, frequency_hz: f64) -> f64 {
    let s = Complex::new(0.0, 2.0 * std::f64::consts::PI * frequency_hz);
    let (n, d) = coeffs.evaluate_parts(s);
    20.0 * (n.norm().log10() - d.norm().log10())
}

/// Evaluate magnitude (dB) and phase (degrees) at every sweep point.
pub fn frequency_response(coeffs: &NumericCoefficients, sweep: &FrequencySweep) -> AnalyticalCurve {
    let mut magnitude_db = Vec::with_capacity(sweep.len());
    let mut phase_deg = Vec::with_capacity(sweep.len());

    for omega in sweep.angular() {
        let (n, d) = coeffs.evaluate_parts(Complex::new(0.0, omega));
        magnitude_db.push(20.0 * (n.norm().log10() - d.norm().log10()));
        phase_deg.push((n.arg() - d.arg()).to_degrees());
    }

    unwrap_phase_deg(&mut phase_deg);

    AnalyticalCurve {
        frequencies_hz: sweep.frequencies_hz().to_vec(),
        magnitude_db,
        phase_deg,
    }
}

/// Remove 360 degree jumps between consecutive samples.
fn unwrap_phase_deg(phase: &mut [f64]) {
    let Some(&first) = phase.first() else {
        return;
    };
    let mut prev_raw = first;
    let mut offset = 0.0;
    for p in phase.iter_mut().skip(1) {
        let raw = *p;
        offset -= ((raw - prev_raw) / 360.0).round() * 360.0;
        prev_raw = raw;
        *p = raw + offset;
    }
}

//! AC magnitude comparison.

use bandcheck_core::{NumericCoefficients, magnitude_db_at, peak_of};

use crate::compare::report::{ScenarioComparison, WorstPointInfo};
use crate::compare::tolerances::{AcTolerances, relative_error};
use crate::reader::SimulatedCurve;

/// Analytical and simulated magnitude on a shared axis, both peaking at 0 dB.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedCurves {
    pub frequencies_hz: Vec<f64>,
    pub analytical_db: Vec<f64>,
    pub simulated_db: Vec<f64>,
}

impl AlignedCurves {
    pub fn len(&self) -> usize {
        self.frequencies_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }
}

/// Put the analytical response on the simulated curve's frequency axis and
/// magnitude scale.
///
/// The transfer function is evaluated at exactly the simulated frequencies,
/// so no interpolation is involved. Samples where either side is not finite
/// are dropped. Returns `None` if nothing is left.
pub fn align_curves(coeffs: &NumericCoefficients, simulated: &SimulatedCurve) -> Option<AlignedCurves> {
    let mut frequencies_hz = Vec::with_capacity(simulated.len());
    let mut analytical_db = Vec::with_capacity(simulated.len());
    let mut simulated_db = Vec::with_capacity(simulated.len());

    for (&f, &sim) in simulated.frequencies_hz.iter().zip(&simulated.magnitude_db) {
        let ana = magnitude_db_at(coeffs, f);
        if f.is_finite() && f > 0.0 && ana.is_finite() && sim.is_finite() {
            frequencies_hz.push(f);
            analytical_db.push(ana);
            simulated_db.push(sim);
        }
    }

    let (_, peak) = peak_of(&frequencies_hz, &analytical_db)?;
    for db in &mut analytical_db {
        *db -= peak;
    }

    Some(AlignedCurves {
        frequencies_hz,
        analytical_db,
        simulated_db,
    })
}

/// Compare one scenario's simulated curve against its transfer function.
///
/// Returns `None` when the curves share no usable samples.
pub fn compare_scenario(
    scenario: &str,
    resistance: f64,
    coeffs: &NumericCoefficients,
    simulated: &SimulatedCurve,
    tolerances: &AcTolerances,
) -> Option<ScenarioComparison> {
    let aligned = align_curves(coeffs, simulated)?;

    let mut worst: Option<WorstPointInfo> = None;
    let mut sum_sq = 0.0;
    for ((&f, &ana), &sim) in aligned
        .frequencies_hz
        .iter()
        .zip(&aligned.analytical_db)
        .zip(&aligned.simulated_db)
    {
        let error = (sim - ana).abs();
        sum_sq += error * error;
        if worst.as_ref().is_none_or(|w| error > w.error) {
            worst = Some(WorstPointInfo {
                at: f,
                expected: ana,
                actual: sim,
                error,
            });
        }
    }

    let max_deviation_db = worst.as_ref().map_or(0.0, |w| w.error);
    let rms_deviation_db = (sum_sq / aligned.len() as f64).sqrt();

    let (analytical_peak_hz, _) = peak_of(&aligned.frequencies_hz, &aligned.analytical_db)?;
    let (simulated_peak_hz, _) = peak_of(&aligned.frequencies_hz, &aligned.simulated_db)?;
    let peak_frequency_error = relative_error(analytical_peak_hz, simulated_peak_hz);

    let passed = max_deviation_db <= tolerances.magnitude_db
        && peak_frequency_error <= tolerances.peak_frequency_rel;

    Some(ScenarioComparison {
        scenario: scenario.to_string(),
        resistance,
        passed,
        points: aligned.len(),
        max_deviation_db,
        rms_deviation_db,
        analytical_peak_hz,
        simulated_peak_hz,
        peak_frequency_error,
        worst_point: worst,
    })
}

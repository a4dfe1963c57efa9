//! Tolerances for comparing simulated and analytical curves.

use serde::{Deserialize, Serialize};

/// Tolerances for AC magnitude comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcTolerances {
    /// Magnitude tolerance (dB), after both curves are shifted to a 0 dB peak.
    pub magnitude_db: f64,
    /// Peak frequency tolerance (fraction).
    pub peak_frequency_rel: f64,
}

impl Default for AcTolerances {
    fn default() -> Self {
        Self {
            magnitude_db: 0.1,
            peak_frequency_rel: 0.01,
        }
    }
}

impl AcTolerances {
    /// Check that both tolerances are usable.
    pub fn is_valid(&self) -> bool {
        self.magnitude_db.is_finite()
            && self.magnitude_db >= 0.0
            && self.peak_frequency_rel.is_finite()
            && self.peak_frequency_rel >= 0.0
    }
}

/// Calculate relative error between two values.
pub fn relative_error(expected: f64, actual: f64) -> f64 {
    if expected.abs() < 1e-15 {
        if actual.abs() < 1e-15 {
            0.0
        } else {
            f64::INFINITY
        }
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

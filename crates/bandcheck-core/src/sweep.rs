//! Frequency sweep generation.

use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Ordered frequency samples shared read-only by every scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySweep {
    frequencies_hz: Vec<f64>,
}

impl FrequencySweep {
    /// `points` samples spaced evenly in log10(f) from `fstart` to `fstop`,
    /// both endpoints included.
    pub fn logarithmic(fstart: f64, fstop: f64, points: usize) -> Result<Self> {
        check_bounds(fstart, fstop)?;
        if points < 2 {
            return Err(Error::InvalidSweep(format!(
                "need at least 2 points, got {}",
                points
            )));
        }

        let log_start = fstart.log10();
        let step = (fstop.log10() - log_start) / (points as f64 - 1.0);
        let mut frequencies_hz: Vec<f64> = (0..points)
            .map(|i| 10.0_f64.powf(log_start + step * i as f64))
            .collect();
        // Pin the endpoints so they are exact rather than rounded.
        frequencies_hz[0] = fstart;
        frequencies_hz[points - 1] = fstop;

        Ok(Self { frequencies_hz })
    }

    pub fn len(&self) -> usize {
        self.frequencies_hz.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies_hz.is_empty()
    }

    pub fn frequencies_hz(&self) -> &[f64] {
        &self.frequencies_hz
    }

    /// Angular frequencies `2*pi*f` (rad/s).
    pub fn angular(&self) -> impl Iterator<Item = f64> + '_ {
        self.frequencies_hz.iter().map(|f| 2.0 * PI * f)
    }
}

fn check_bounds(fstart: f64, fstop: f64) -> Result<()> {
    if !(fstart.is_finite() && fstop.is_finite()) || fstart <= 0.0 {
        return Err(Error::InvalidSweep(format!(
            "bounds must be positive and finite: {} .. {}",
            fstart, fstop
        )));
    }
    if fstop <= fstart {
        return Err(Error::InvalidSweep(format!(
            "stop frequency {} must exceed start frequency {}",
            fstop, fstart
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logarithmic_endpoints() {
        let sweep = FrequencySweep::logarithmic(1.0, 1e6, 5000).unwrap();
        assert_eq!(sweep.len(), 5000);
        assert_eq!(sweep.frequencies_hz()[0], 1.0);
        assert_eq!(sweep.frequencies_hz()[4999], 1e6);
        assert!(sweep.frequencies_hz().windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn test_logarithmic_constant_ratio() {
        let sweep = FrequencySweep::logarithmic(10.0, 1000.0, 21).unwrap();
        let f = sweep.frequencies_hz();
        let ratio = f[1] / f[0];
        for w in f.windows(2) {
            assert!((w[1] / w[0] - ratio).abs() < 1e-9);
        }
        assert!((f[10] - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_angular() {
        let sweep = FrequencySweep::logarithmic(1.0, 10.0, 2).unwrap();
        let w: Vec<f64> = sweep.angular().collect();
        assert!((w[0] - 2.0 * PI).abs() < 1e-12);
        assert!((w[1] - 20.0 * PI).abs() < 1e-12);
    }

    #[test]
    fn test_matches_spice_decade_grid() {
        // `.ac dec 1000 1 1Meg` samples at 1 Hz * 10^(i/1000)
        let sweep = FrequencySweep::logarithmic(1.0, 1e6, 6001).unwrap();
        for (i, &f) in sweep.frequencies_hz().iter().enumerate().step_by(250) {
            let expected = 10.0_f64.powf(i as f64 / 1000.0);
            assert!((f - expected).abs() / expected < 1e-12, "{} vs {}", f, expected);
        }
    }

    #[test]
    fn test_invalid_bounds() {
        assert!(FrequencySweep::logarithmic(0.0, 1e6, 100).is_err());
        assert!(FrequencySweep::logarithmic(1e6, 1.0, 100).is_err());
        assert!(FrequencySweep::logarithmic(1.0, 1e6, 1).is_err());
    }
}

//! Comparison report generation.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Comparison result for a single scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioComparison {
    /// Scenario display name (e.g., "R=1.0Ω (High Q)").
    pub scenario: String,
    pub resistance: f64,
    /// Whether this scenario passed comparison.
    pub passed: bool,
    /// Number of frequency samples compared.
    pub points: usize,
    /// Maximum magnitude deviation (dB).
    pub max_deviation_db: f64,
    /// RMS magnitude deviation (dB).
    pub rms_deviation_db: f64,
    /// Frequency of the analytical peak on the common axis (Hz).
    pub analytical_peak_hz: f64,
    /// Frequency of the simulated peak (Hz).
    pub simulated_peak_hz: f64,
    /// Relative error between the two peak frequencies.
    pub peak_frequency_error: f64,
    /// Worst case deviation point.
    pub worst_point: Option<WorstPointInfo>,
}

/// Information about the worst deviation point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorstPointInfo {
    /// Frequency (Hz).
    pub at: f64,
    /// Analytical magnitude at this point (dB, normalized).
    pub expected: f64,
    /// Simulated magnitude at this point (dB, normalized).
    pub actual: f64,
    /// Error at this point.
    pub error: f64,
}

/// Summary statistics for a comparison.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Scenarios with a simulated curve that were compared.
    pub total_scenarios: usize,
    pub passed_scenarios: usize,
    pub failed_scenarios: usize,
    /// Scenarios without simulated data.
    pub skipped_scenarios: usize,
    /// Largest per-scenario maximum deviation (dB).
    pub max_error: f64,
    /// Mean of the per-scenario maximum deviations (dB).
    pub avg_error: f64,
}

/// Complete comparison report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    /// Analysis type.
    pub analysis_type: String,
    /// Whether every compared scenario passed.
    pub passed: bool,
    /// Per-scenario comparison results.
    pub comparisons: Vec<ScenarioComparison>,
    /// Scenarios that had nothing to compare.
    pub skipped: Vec<String>,
    /// Overall summary statistics.
    pub summary: ComparisonSummary,
}

impl ComparisonReport {
    /// Create a new report.
    pub fn new(analysis_type: &str) -> Self {
        Self {
            analysis_type: analysis_type.to_string(),
            passed: true,
            comparisons: Vec::new(),
            skipped: Vec::new(),
            summary: ComparisonSummary::default(),
        }
    }

    /// Add a scenario comparison result.
    pub fn add_comparison(&mut self, comp: ScenarioComparison) {
        if !comp.passed {
            self.passed = false;
            self.summary.failed_scenarios += 1;
        } else {
            self.summary.passed_scenarios += 1;
        }
        self.summary.total_scenarios += 1;
        self.comparisons.push(comp);
    }

    /// Record a scenario that had no simulated curve.
    pub fn add_skipped(&mut self, scenario: &str) {
        self.summary.skipped_scenarios += 1;
        self.skipped.push(scenario.to_string());
    }

    /// Finalize the report by computing summary statistics.
    pub fn finalize(&mut self) {
        if self.comparisons.is_empty() {
            return;
        }

        let errors = self.comparisons.iter().map(|c| c.max_deviation_db);
        self.summary.max_error = errors.clone().fold(0.0, f64::max);
        self.summary.avg_error = errors.sum::<f64>() / self.comparisons.len() as f64;
    }

    /// Format as human-readable text.
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "Comparison Report: {}", self.analysis_type);
        let status = if self.summary.total_scenarios == 0 {
            "NO DATA"
        } else if self.passed {
            "PASS"
        } else {
            "FAIL"
        };
        let _ = writeln!(out, "Status: {}", status);
        let _ = writeln!(
            out,
            "Scenarios: {}/{} passed, {} without simulated data\n",
            self.summary.passed_scenarios,
            self.summary.total_scenarios,
            self.summary.skipped_scenarios
        );

        for comp in &self.comparisons {
            let status = if comp.passed { "PASS" } else { "FAIL" };
            let _ = writeln!(
                out,
                "  {}: {} [{:.3} dB max, {:.3} dB rms over {} points]",
                comp.scenario, status, comp.max_deviation_db, comp.rms_deviation_db, comp.points
            );
            let _ = writeln!(
                out,
                "    Peak:     analytical {:.2} Hz, simulated {:.2} Hz ({:.3}%)",
                comp.analytical_peak_hz,
                comp.simulated_peak_hz,
                comp.peak_frequency_error * 100.0
            );

            if let Some(ref worst) = comp.worst_point {
                let _ = writeln!(
                    out,
                    "    Worst at: {:.6e} Hz (expected={:.4} dB, actual={:.4} dB, error={:.4} dB)",
                    worst.at, worst.expected, worst.actual, worst.error
                );
            }
        }

        for name in &self.skipped {
            let _ = writeln!(out, "  {}: NO DATA", name);
        }

        if !self.passed {
            out.push_str("\nFailed scenarios:\n");
            for comp in &self.comparisons {
                if !comp.passed {
                    let _ = writeln!(out, "  - {}", comp.scenario);
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison(name: &str, passed: bool, max: f64) -> ScenarioComparison {
        ScenarioComparison {
            scenario: name.to_string(),
            resistance: 1.0,
            passed,
            points: 10,
            max_deviation_db: max,
            rms_deviation_db: max / 2.0,
            analytical_peak_hz: 15915.5,
            simulated_peak_hz: 15915.5,
            peak_frequency_error: 0.0,
            worst_point: None,
        }
    }

    #[test]
    fn test_summary() {
        let mut report = ComparisonReport::new("AC magnitude");
        report.add_comparison(comparison("a", true, 0.02));
        report.add_comparison(comparison("b", false, 0.5));
        report.add_skipped("c");
        report.finalize();

        assert!(!report.passed);
        assert_eq!(report.summary.total_scenarios, 2);
        assert_eq!(report.summary.passed_scenarios, 1);
        assert_eq!(report.summary.failed_scenarios, 1);
        assert_eq!(report.summary.skipped_scenarios, 1);
        assert_eq!(report.summary.max_error, 0.5);
        assert!((report.summary.avg_error - 0.26).abs() < 1e-12);

        let text = report.to_text();
        assert!(text.contains("Status: FAIL"));
        assert!(text.contains("c: NO DATA"));
        assert!(text.contains("  - b"));
    }

    #[test]
    fn test_empty_report_has_no_data_status() {
        let mut report = ComparisonReport::new("AC magnitude");
        report.add_skipped("a");
        report.finalize();
        assert!(report.to_text().contains("Status: NO DATA"));
        assert_eq!(report.summary.max_error, 0.0);
    }
}

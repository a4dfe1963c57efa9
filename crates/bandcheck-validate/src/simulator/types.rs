//! Types for simulator results.

use num_complex::Complex;

use crate::error::{Error, Result};

/// Analysis type parsed from rawfile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisType {
    /// DC operating point.
    DcOp,
    /// DC sweep.
    DcSweep,
    /// AC analysis.
    Ac,
    /// Transient analysis.
    Transient,
    /// Anything else (noise, transfer function, ...).
    Other,
}

/// A variable in the rawfile (column in the data).
#[derive(Debug, Clone, PartialEq)]
pub struct RawVariable {
    /// Variable index (0-based).
    pub index: usize,
    /// Variable name (e.g., "frequency", "V(nout)").
    pub name: String,
    /// Variable type (e.g., "voltage", "current", "frequency").
    pub var_type: String,
}

/// Parsed rawfile header information.
#[derive(Debug, Clone, PartialEq)]
pub struct RawfileHeader {
    /// Title of the simulation.
    pub title: String,
    /// Plot name (e.g., "AC Analysis").
    pub plotname: String,
    /// Flags (e.g., "complex", "real forward", "complex forward log").
    pub flags: String,
    /// Number of variables.
    pub num_variables: usize,
    /// Number of data points.
    pub num_points: usize,
    /// Variable definitions.
    pub variables: Vec<RawVariable>,
    /// Whether data is complex (AC analysis).
    pub is_complex: bool,
    /// Whether data is binary format.
    pub is_binary: bool,
    /// Whether the file came from LTspice (UTF-16 header or LTspice command line).
    pub is_ltspice: bool,
}

impl RawfileHeader {
    /// Byte width of each variable in one binary point.
    ///
    /// Complex values are two f64. Real values are f64, except LTspice real
    /// plots without the `double` flag, which store only the first variable
    /// (time) as f64 and the rest as f32.
    pub fn binary_widths(&self) -> Vec<usize> {
        if self.is_complex {
            return vec![16; self.num_variables];
        }
        let packed = self.is_ltspice && !self.flags.to_lowercase().contains("double");
        (0..self.num_variables)
            .map(|i| if packed && i > 0 { 4 } else { 8 })
            .collect()
    }
}

/// Result of parsing a rawfile.
#[derive(Debug, Clone)]
pub struct RawfileData {
    /// Header information.
    pub header: RawfileHeader,
    /// Real data values (num_points x num_variables).
    /// For complex data, this contains only the real parts.
    pub real_data: Vec<Vec<f64>>,
    /// Imaginary data values (only for complex data).
    pub imag_data: Option<Vec<Vec<f64>>>,
}

impl RawfileData {
    /// Get the analysis type from the plotname.
    pub fn analysis_type(&self) -> AnalysisType {
        let plotname = self.header.plotname.to_lowercase();
        if plotname.contains("operating point") {
            AnalysisType::DcOp
        } else if plotname.contains("dc transfer") || plotname.contains("dc analysis") {
            AnalysisType::DcSweep
        } else if plotname.contains("ac analysis") {
            AnalysisType::Ac
        } else if plotname.contains("transient") {
            AnalysisType::Transient
        } else {
            AnalysisType::Other
        }
    }

    pub fn num_points(&self) -> usize {
        self.real_data.len()
    }

    /// Find a variable by name (case-insensitive).
    ///
    /// `V(node)` also matches a bare `node` column and vice versa, since
    /// simulators disagree on how they name saved node voltages.
    pub fn find_variable(&self, name: &str) -> Option<&RawVariable> {
        let wanted = name.trim().to_lowercase();
        let bare = strip_voltage_wrapper(&wanted);

        self.header
            .variables
            .iter()
            .find(|v| v.name.to_lowercase() == wanted)
            .or_else(|| {
                self.header.variables.iter().find(|v| {
                    let candidate = v.name.to_lowercase();
                    strip_voltage_wrapper(&candidate) == bare
                })
            })
    }

    /// Index of the independent frequency variable.
    pub fn frequency_index(&self) -> usize {
        self.header
            .variables
            .iter()
            .find(|v| v.var_type.eq_ignore_ascii_case("frequency"))
            .map(|v| v.index)
            .unwrap_or(0)
    }

    /// Get real values for a variable across all points.
    pub fn get_real_values(&self, var_index: usize) -> Option<Vec<f64>> {
        if var_index >= self.header.num_variables {
            return None;
        }
        self.real_data
            .iter()
            .map(|row| row.get(var_index).copied())
            .collect()
    }

    /// Get complex values for a variable across all points.
    ///
    /// Real-valued plots yield a zero imaginary part.
    pub fn get_complex_values(&self, var_index: usize) -> Option<Vec<Complex<f64>>> {
        let re = self.get_real_values(var_index)?;
        match &self.imag_data {
            Some(imag) => re
                .into_iter()
                .zip(imag)
                .map(|(r, im_row)| im_row.get(var_index).map(|&i| Complex::new(r, i)))
                .collect(),
            None => Some(re.into_iter().map(|r| Complex::new(r, 0.0)).collect()),
        }
    }
}

fn strip_voltage_wrapper(name: &str) -> &str {
    name.strip_prefix("v(")
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(name)
}

/// One complex signal from an AC analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct AcTrace {
    /// Signal name as found in the rawfile.
    pub name: String,
    /// Frequencies (Hz).
    pub frequencies: Vec<f64>,
    /// Complex values at each frequency.
    pub values: Vec<Complex<f64>>,
}

impl AcTrace {
    /// Extract `signal` from an AC rawfile.
    pub fn from_rawfile(data: &RawfileData, signal: &str) -> Result<Self> {
        if data.analysis_type() != AnalysisType::Ac {
            return Err(Error::UnsupportedRawfileFormat(format!(
                "expected an AC analysis, found plot '{}'",
                data.header.plotname
            )));
        }

        let variable = data
            .find_variable(signal)
            .ok_or_else(|| Error::VariableNotFound(signal.to_string()))?;

        let frequencies: Vec<f64> = data
            .get_complex_values(data.frequency_index())
            .ok_or_else(|| Error::RawfileParseError("frequency column is ragged".to_string()))?
            .into_iter()
            .map(|c| c.re)
            .collect();

        let values = data.get_complex_values(variable.index).ok_or_else(|| {
            Error::RawfileParseError(format!("column '{}' is ragged", variable.name))
        })?;

        Ok(Self {
            name: variable.name.clone(),
            frequencies,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Get magnitude in dB.
    pub fn magnitude_db(&self) -> Vec<f64> {
        self.values.iter().map(|c| 20.0 * c.norm().log10()).collect()
    }
}

//! Analytical model of a series R-L-C bandpass filter.
//!
//! This crate provides:
//! - The fixed circuit topology and its parameter values
//! - Symbolic derivation of the transfer function `H(s)` as a ratio of
//!   polynomials in `s`, with coefficients in `R`, `L`, `C`
//! - Resolution of the symbolic coefficients for concrete parameter values
//! - Logarithmic frequency sweeps and the analytical magnitude/phase response
//! - SPICE engineering-unit parsing and formatting

pub mod error;
pub mod response;
pub mod sweep;
pub mod symbolic;
pub mod topology;
pub mod transfer;
pub mod units;

pub use error::{Error, Result};
pub use response::{AnalyticalCurve, frequency_response, magnitude_db_at, peak_of};
pub use sweep::FrequencySweep;
pub use symbolic::{Bindings, Expr, Symbol};
pub use topology::{CircuitParams, CircuitTopology, ElementKind, SeriesElement};
pub use transfer::{NumericCoefficients, SymbolicTransferFunction, derive_transfer_function};

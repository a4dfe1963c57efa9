//! Error types for bandcheck-core.

use thiserror::Error;

use crate::symbolic::Symbol;

#[derive(Debug, Error)]
pub enum Error {
    #[error("transfer function derivation failed: {0}")]
    Derivation(String),

    #[error("unresolved symbol after substitution: {0}")]
    UnresolvedSymbol(Symbol),

    #[error("no value bound for {}", .0.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", "))]
    UnboundSymbols(Vec<Symbol>),

    #[error("coefficient {index} evaluated to non-finite value {value}")]
    NonFiniteCoefficient { index: usize, value: f64 },

    #[error("invalid circuit parameter {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("invalid frequency sweep: {0}")]
    InvalidSweep(String),
}

pub type Result<T> = std::result::Result<T, Error>;

//! Transfer function derivation and per-scenario coefficient resolution.

use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::symbolic::{Bindings, Expr, Poly, Rational, Symbol};
use crate::topology::{CircuitTopology, ElementKind};

/// `H(s) = N(s) / D(s)` with symbolic coefficients, highest power first.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolicTransferFunction {
    numerator: Vec<Expr>,
    denominator: Vec<Expr>,
}

impl SymbolicTransferFunction {
    pub fn numerator(&self) -> &[Expr] {
        &self.numerator
    }

    pub fn denominator(&self) -> &[Expr] {
        &self.denominator
    }

    /// Symbols used by any coefficient, in `Symbol::ALL` order.
    pub fn free_symbols(&self) -> Vec<Symbol> {
        let used: Vec<Symbol> = self
            .numerator
            .iter()
            .chain(&self.denominator)
            .flat_map(Expr::free_symbols)
            .collect();
        Symbol::ALL
            .into_iter()
            .filter(|s| used.contains(s))
            .collect()
    }

    /// Substitute concrete values into every coefficient.
    ///
    /// Order and length of both lists are preserved. Symbols left without a
    /// binding are all reported together; any non-finite result is an error.
    pub fn resolve(&self, bindings: &Bindings) -> Result<NumericCoefficients> {
        let unbound: Vec<Symbol> = self
            .free_symbols()
            .into_iter()
            .filter(|&s| bindings.get(s).is_none())
            .collect();
        if !unbound.is_empty() {
            return Err(Error::UnboundSymbols(unbound));
        }

        let resolve_all = |exprs: &[Expr], offset: usize| -> Result<Vec<f64>> {
            exprs
                .iter()
                .enumerate()
                .map(|(i, expr)| {
                    let value = expr.evaluate(bindings)?;
                    if value.is_finite() {
                        Ok(value)
                    } else {
                        Err(Error::NonFiniteCoefficient {
                            index: offset + i,
                            value,
                        })
                    }
                })
                .collect()
        };

        Ok(NumericCoefficients {
            numerator: resolve_all(&self.numerator, 0)?,
            denominator: resolve_all(&self.denominator, self.numerator.len())?,
        })
    }
}

/// Impedance of one element as a rational function of `s`.
fn impedance(kind: ElementKind) -> Result<Rational> {
    let value = Expr::symbol(kind.symbol());
    match kind {
        ElementKind::Resistor => Ok(Rational::from_poly(Poly::constant(value))),
        ElementKind::Inductor => Ok(Rational::from_poly(Poly::monomial(value, 1))),
        ElementKind::Capacitor => {
            Rational::new(Poly::constant(Expr::constant(1.0)), Poly::monomial(value, 1))
        }
    }
}

/// Derive `H(s) = Z_out / Z_series` for the topology's voltage divider.
///
/// The reactive `1/(sC)` fraction is cleared by rational arithmetic, so both
/// returned coefficient lists are plain polynomials in `s`.
pub fn derive_transfer_function(topology: &CircuitTopology) -> Result<SymbolicTransferFunction> {
    let mut total: Option<Rational> = None;
    for element in topology.elements() {
        let z = impedance(element.kind)?;
        total = Some(match total {
            Some(acc) => acc.add(&z)?,
            None => z,
        });
    }
    let total = total.ok_or_else(|| Error::Derivation("topology has no elements".to_string()))?;

    let output = impedance(topology.output_element().kind)?;
    let h = output.div(&total)?;

    if h.denominator.degree().is_none() {
        return Err(Error::Derivation(
            "denominator reduced to zero polynomial".to_string(),
        ));
    }
    if h.numerator.is_zero() {
        return Err(Error::Derivation("numerator reduced to zero".to_string()));
    }

    Ok(SymbolicTransferFunction {
        numerator: h.numerator.coefficients_descending(),
        denominator: h.denominator.coefficients_descending(),
    })
}

/// Numeric polynomial coefficients for one scenario, highest power first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericCoefficients {
    pub numerator: Vec<f64>,
    pub denominator: Vec<f64>,
}

impl NumericCoefficients {
    /// Evaluate `N(s)` and `D(s)` separately.
    pub fn evaluate_parts(&self, s: Complex<f64>) -> (Complex<f64>, Complex<f64>) {
        (horner(&self.numerator, s), horner(&self.denominator, s))
    }

    /// Evaluate `H(s)`.
    pub fn evaluate(&self, s: Complex<f64>) -> Complex<f64> {
        let (n, d) = self.evaluate_parts(s);
        n / d
    }
}

fn horner(coeffs: &[f64], s: Complex<f64>) -> Complex<f64> {
    coeffs
        .iter()
        .fold(Complex::new(0.0, 0.0), |acc, &c| acc * s + c)
}

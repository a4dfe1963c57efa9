//! Minimal symbolic algebra over the circuit parameters.
//!
//! An [`Expr`] is a sum of monomials `k * C^a * L^b * R^c`. A [`Poly`] is a
//! polynomial in the complex frequency `s` whose coefficients are expressions,
//! and a [`Rational`] is a ratio of two such polynomials. This is exactly the
//! algebra needed to reduce a series impedance divider to polynomial form.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Circuit parameter symbol.
///
/// Declaration order is alphabetical by display name, which keeps printed
/// monomials in a stable `C*L*R` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Symbol {
    /// Capacitance `C`.
    Capacitance,
    /// Inductance `L`.
    Inductance,
    /// Resistance `R`.
    Resistance,
}

impl Symbol {
    pub const ALL: [Symbol; 3] = [Symbol::Capacitance, Symbol::Inductance, Symbol::Resistance];

    fn slot(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Symbol::Capacitance => "C",
            Symbol::Inductance => "L",
            Symbol::Resistance => "R",
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Exponent of each symbol, indexed by [`Symbol::slot`].
type Exponents = [u32; 3];

/// Concrete values substituted for symbols.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: BTreeMap<Symbol, f64>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a symbol to a value, replacing any previous binding.
    pub fn with(mut self, symbol: Symbol, value: f64) -> Self {
        self.values.insert(symbol, value);
        self
    }

    pub fn get(&self, symbol: Symbol) -> Option<f64> {
        self.values.get(&symbol).copied()
    }
}

/// A polynomial in the circuit parameters with real coefficients.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Expr {
    terms: BTreeMap<Exponents, f64>,
}

impl Expr {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn constant(k: f64) -> Self {
        let mut expr = Self::zero();
        expr.accumulate([0; 3], k);
        expr
    }

    pub fn symbol(symbol: Symbol) -> Self {
        let mut exps = [0; 3];
        exps[symbol.slot()] = 1;
        let mut expr = Self::zero();
        expr.accumulate(exps, 1.0);
        expr
    }

    pub fn is_zero(&self) -> bool {
        self.terms.is_empty()
    }

    fn accumulate(&mut self, exps: Exponents, k: f64) {
        let entry = self.terms.entry(exps).or_insert(0.0);
        *entry += k;
        if *entry == 0.0 {
            self.terms.remove(&exps);
        }
    }

    pub fn add(&self, other: &Expr) -> Expr {
        let mut out = self.clone();
        for (&exps, &k) in &other.terms {
            out.accumulate(exps, k);
        }
        out
    }

    pub fn mul(&self, other: &Expr) -> Expr {
        let mut out = Expr::zero();
        for (a_exps, &a_k) in &self.terms {
            for (b_exps, &b_k) in &other.terms {
                let exps = [
                    a_exps[0] + b_exps[0],
                    a_exps[1] + b_exps[1],
                    a_exps[2] + b_exps[2],
                ];
                out.accumulate(exps, a_k * b_k);
            }
        }
        out
    }

    /// Symbols appearing with a non-zero exponent in any term.
    pub fn free_symbols(&self) -> Vec<Symbol> {
        Symbol::ALL
            .into_iter()
            .filter(|s| self.terms.keys().any(|exps| exps[s.slot()] > 0))
            .collect()
    }

    /// Substitute bound values and evaluate to a number.
    pub fn evaluate(&self, bindings: &Bindings) -> Result<f64> {
        let mut total = 0.0;
        for (exps, &k) in &self.terms {
            let mut term = k;
            for symbol in Symbol::ALL {
                let power = exps[symbol.slot()];
                if power == 0 {
                    continue;
                }
                let value = bindings
                    .get(symbol)
                    .ok_or(Error::UnresolvedSymbol(symbol))?;
                term *= value.powi(power as i32);
            }
            total += term;
        }
        Ok(total)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("0");
        }

        // Highest total degree first, like a computer algebra system would print.
        let mut terms: Vec<_> = self.terms.iter().collect();
        terms.sort_by(|a, b| {
            let da: u32 = a.0.iter().sum();
            let db: u32 = b.0.iter().sum();
            db.cmp(&da).then(a.0.cmp(b.0))
        });

        for (i, (exps, k)) in terms.into_iter().enumerate() {
            let mut factors = Vec::new();
            for symbol in Symbol::ALL {
                match exps[symbol.slot()] {
                    0 => {}
                    1 => factors.push(symbol.name().to_string()),
                    n => factors.push(format!("{}**{}", symbol.name(), n)),
                }
            }

            let (sign, magnitude) = if *k < 0.0 { ("-", -k) } else { ("+", *k) };
            if i == 0 {
                if sign == "-" {
                    f.write_str("-")?;
                }
            } else {
                write!(f, " {} ", sign)?;
            }

            if factors.is_empty() {
                write!(f, "{}", magnitude)?;
            } else if magnitude == 1.0 {
                f.write_str(&factors.join("*"))?;
            } else {
                write!(f, "{}*{}", magnitude, factors.join("*"))?;
            }
        }
        Ok(())
    }
}

/// Polynomial in `s` with symbolic coefficients, stored lowest power first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Poly {
    coeffs: Vec<Expr>,
}

impl Poly {
    pub fn constant(expr: Expr) -> Self {
        Self::monomial(expr, 0)
    }

    /// `expr * s^power`.
    pub fn monomial(expr: Expr, power: usize) -> Self {
        let mut coeffs = vec![Expr::zero(); power + 1];
        coeffs[power] = expr;
        Self { coeffs }.trimmed()
    }

    fn trimmed(mut self) -> Self {
        while self.coeffs.last().is_some_and(Expr::is_zero) {
            self.coeffs.pop();
        }
        self
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.is_empty()
    }

    /// Degree in `s`, or `None` for the zero polynomial.
    pub fn degree(&self) -> Option<usize> {
        self.coeffs.len().checked_sub(1)
    }

    pub fn add(&self, other: &Poly) -> Poly {
        let len = self.coeffs.len().max(other.coeffs.len());
        let coeffs = (0..len)
            .map(|i| match (self.coeffs.get(i), other.coeffs.get(i)) {
                (Some(a), Some(b)) => a.add(b),
                (Some(a), None) => a.clone(),
                (None, Some(b)) => b.clone(),
                (None, None) => Expr::zero(),
            })
            .collect();
        Poly { coeffs }.trimmed()
    }

    pub fn mul(&self, other: &Poly) -> Poly {
        if self.is_zero() || other.is_zero() {
            return Poly::default();
        }
        let mut coeffs = vec![Expr::zero(); self.coeffs.len() + other.coeffs.len() - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            for (j, b) in other.coeffs.iter().enumerate() {
                coeffs[i + j] = coeffs[i + j].add(&a.mul(b));
            }
        }
        Poly { coeffs }.trimmed()
    }

    /// Lowest power of `s` with a non-zero coefficient.
    fn lowest_power(&self) -> Option<usize> {
        self.coeffs.iter().position(|c| !c.is_zero())
    }

    fn shift_down(&self, by: usize) -> Poly {
        Poly {
            coeffs: self.coeffs[by.min(self.coeffs.len())..].to_vec(),
        }
    }

    /// Coefficients from the highest power of `s` down to the constant term.
    pub fn coefficients_descending(&self) -> Vec<Expr> {
        self.coeffs.iter().rev().cloned().collect()
    }
}

/// Ratio of two polynomials in `s`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rational {
    pub numerator: Poly,
    pub denominator: Poly,
}

impl Rational {
    pub fn new(numerator: Poly, denominator: Poly) -> Result<Self> {
        if denominator.is_zero() {
            return Err(Error::Derivation("zero denominator".to_string()));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn from_poly(poly: Poly) -> Self {
        Self {
            numerator: poly,
            denominator: Poly::constant(Expr::constant(1.0)),
        }
    }

    /// `a/b + c/d = (a*d + c*b) / (b*d)`.
    pub fn add(&self, other: &Rational) -> Result<Rational> {
        let numerator = self
            .numerator
            .mul(&other.denominator)
            .add(&other.numerator.mul(&self.denominator));
        let denominator = self.denominator.mul(&other.denominator);
        Rational::new(numerator, denominator).map(Rational::cancel_powers_of_s)
    }

    /// `(a/b) / (c/d) = (a*d) / (b*c)`.
    pub fn div(&self, other: &Rational) -> Result<Rational> {
        if other.numerator.is_zero() {
            return Err(Error::Derivation("division by zero expression".to_string()));
        }
        let numerator = self.numerator.mul(&other.denominator);
        let denominator = self.denominator.mul(&other.numerator);
        Rational::new(numerator, denominator).map(Rational::cancel_powers_of_s)
    }

    /// Remove a common `s^k` factor from numerator and denominator.
    fn cancel_powers_of_s(self) -> Rational {
        let common = match (self.numerator.lowest_power(), self.denominator.lowest_power()) {
            (Some(a), Some(b)) => a.min(b),
            _ => 0,
        };
        if common == 0 {
            return self;
        }
        Rational {
            numerator: self.numerator.shift_down(common),
            denominator: self.denominator.shift_down(common),
        }
    }
}

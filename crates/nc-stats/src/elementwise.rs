//! Element-wise math on a flat sample (numpy ufunc equivalents).
//!
//! numpy returns `nan` / `inf` with a runtime warning when an input leaves the
//! real domain (`sqrt(-1)`, `log(0)`, `arcsin(2)`) or a result overflows
//! (`exp(1000)`). Here the same situations are reported as
//! [`StatsError::Domain`](crate::StatsError::Domain).

use crate::{Result, StatsError};
use crate::error::ensure_all_finite;

fn map(x: &[f64], op: &str, f: impl Fn(f64) -> f64) -> Result<Vec<f64>> {
    ensure_all_finite(op, x.iter().map(|&v| f(v)).collect())
}

pub fn abs(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "absolute", f64::abs)
}

pub fn sqrt(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "sqrt", f64::sqrt)
}

pub fn log(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "log", f64::ln)
}

pub fn log10(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "log10", f64::log10)
}

pub fn exp(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "exp", f64::exp)
}

pub fn floor(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "floor", f64::floor)
}

pub fn ceil(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "ceil", f64::ceil)
}

/// Largest `|decimals|` accepted by [`round`]; beyond it every finite double is
/// either unchanged or rounds to zero.
pub const MAX_DECIMALS: i32 = 400;

/// numpy `round`: half-to-even at `decimals` places (negative rounds to tens, ...).
pub fn round(x: &[f64], decimals: i32) -> Result<Vec<f64>> {
    if !(-MAX_DECIMALS..=MAX_DECIMALS).contains(&decimals) {
        return Err(StatsError::argument(
            "decimals",
            format!("must be between {} and {MAX_DECIMALS}, got {decimals}", -MAX_DECIMALS),
        ));
    }
    map(x, "round", |v| round_decimals(v, decimals))
}

pub fn sin(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "sin", f64::sin)
}

pub fn cos(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "cos", f64::cos)
}

pub fn tan(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "tan", f64::tan)
}

pub fn arcsin(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "arcsin", f64::asin)
}

pub fn arccos(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "arccos", f64::acos)
}

pub fn arctan(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "arctan", f64::atan)
}

pub fn square(x: &[f64]) -> Result<Vec<f64>> {
    map(x, "square", |v| v * v)
}

/// Scalar form of [`round`]: `rint(v * 10^d) / 10^d`.
pub fn round_decimals(v: f64, decimals: i32) -> f64 {
    if decimals >= 0 {
        let scale = 10f64.powi(decimals);
        let scaled = v * scale;
        // scaling overflowed or there is nothing left to round
        if !scaled.is_finite() {
            return v;
        }
        scaled.round_ties_even() / scale
    } else {
        let scale = 10f64.powi(decimals.saturating_neg());
        // every finite value is below one unit of the rounding place
        if !scale.is_finite() {
            return 0.0 * v;
        }
        (v / scale).round_ties_even() * scale
    }
}

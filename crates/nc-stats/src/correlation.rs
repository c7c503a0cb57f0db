//! Correlation coefficients with significance tests.

use statrs::function::beta::checked_beta_reg;

use crate::dist::{t_cdf, t_sf};
use crate::rank::rankdata;
use crate::{Alternative, Result, StatsError, TestResult};

fn check_pair(x: &[f64], y: &[f64]) -> Result<()> {
    if x.len() != y.len() {
        return Err(StatsError::invalid(format!(
            "x and y must have the same length (got {} and {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(StatsError::invalid("x and y must have length at least 2"));
    }
    Ok(())
}

/// Pearson's r of two equally long samples; NaN for a constant input.
pub(crate) fn pearson_r(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len() as f64;
    let xm = x.iter().sum::<f64>() / n;
    let ym = y.iter().sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        let (dx, dy) = (a - xm, b - ym);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return f64::NAN;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Pearson correlation. The p-value uses the exact null distribution of r, a
/// Beta(n/2 - 1, n/2 - 1) on [-1, 1].
pub fn pearsonr(x: &[f64], y: &[f64], alternative: Alternative) -> Result<TestResult> {
    check_pair(x, y)?;
    let r = pearson_r(x, y);
    let n = x.len() as f64;
    if r.is_nan() {
        return Ok(TestResult::new(f64::NAN, f64::NAN));
    }
    if x.len() == 2 {
        return Ok(TestResult::new(r, 1.0));
    }
    let ab = n / 2.0 - 1.0;
    let cdf = checked_beta_reg(ab, ab, (1.0 + r) / 2.0).unwrap_or(f64::NAN);
    let sf = checked_beta_reg(ab, ab, (1.0 - r) / 2.0).unwrap_or(f64::NAN);
    Ok(TestResult::new(r, alternative.p_value(cdf, sf).clamp(0.0, 1.0)))
}

/// Spearman rank correlation; p-value from the t approximation with n - 2 df.
pub fn spearmanr(x: &[f64], y: &[f64], alternative: Alternative) -> Result<TestResult> {
    check_pair(x, y)?;
    let rho = pearson_r(&rankdata(x), &rankdata(y));
    if rho.is_nan() {
        return Ok(TestResult::new(f64::NAN, f64::NAN));
    }
    let df = x.len() as f64 - 2.0;
    if df <= 0.0 {
        return Ok(TestResult::new(rho, f64::NAN));
    }
    if rho.abs() == 1.0 {
        let p = match alternative {
            Alternative::TwoSided => 0.0,
            Alternative::Greater => if rho > 0.0 { 0.0 } else { 1.0 },
            Alternative::Less => if rho < 0.0 { 0.0 } else { 1.0 },
        };
        return Ok(TestResult::new(rho, p));
    }
    let t = rho * (df / ((rho + 1.0) * (1.0 - rho))).sqrt();
    Ok(TestResult::new(rho, alternative.p_value(t_cdf(t, df), t_sf(t, df))))
}

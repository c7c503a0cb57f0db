//! Tests of normality.
//!
//! - [`normaltest`]: D'Agostino & Pearson (1973) omnibus K² test, combining the
//!   skewness z-score (D'Agostino 1970) and kurtosis z-score (Anscombe & Glynn 1983).
//!   K² ~ χ²(2) under H₀.
//! - [`shapiro`]: Shapiro–Wilk W with Royston's (1995) AS R94 coefficients and
//!   p-value approximation.
//! - [`anderson`]: Anderson–Darling A² against a normal with estimated mean and
//!   standard deviation, with Stephens' (1974) small-sample adjusted critical values.

use statrs::function::erf::erfc;

use crate::descriptive::{central_moment, kurtosis, skew, sorted};
use crate::dist::{chi2_sf, normal_ppf, normal_sf};
use crate::elementwise::round_decimals;
use crate::{Result, StatsError, TestResult};

// ---------------------------------------------------------------------------
// D'Agostino–Pearson
// ---------------------------------------------------------------------------

pub fn normaltest(x: &[f64]) -> Result<TestResult> {
    let s = skewtest_z(x)?;
    let k = kurtosistest_z(x)?;
    let k2 = s * s + k * k;
    Ok(TestResult::new(k2, chi2_sf(k2, 2.0)))
}

fn skewtest_z(x: &[f64]) -> Result<f64> {
    let n = x.len();
    if n < 8 {
        return Err(StatsError::invalid(format!(
            "skewtest is not valid with less than 8 samples; {n} samples were given"
        )));
    }
    let n = n as f64;
    let b2 = skew(x, true)?;
    let mut y = b2 * ((n + 1.0) * (n + 3.0) / (6.0 * (n - 2.0))).sqrt();
    let beta2 = 3.0 * (n * n + 27.0 * n - 70.0) * (n + 1.0) * (n + 3.0)
        / ((n - 2.0) * (n + 5.0) * (n + 7.0) * (n + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    if y == 0.0 {
        y = 1.0;
    }
    let ya = y / alpha;
    Ok(delta * (ya + (ya * ya + 1.0).sqrt()).ln())
}

fn kurtosistest_z(x: &[f64]) -> Result<f64> {
    let n = x.len();
    if n < 5 {
        return Err(StatsError::invalid(format!(
            "kurtosistest requires at least 5 observations; {n} observations were given"
        )));
    }
    let n = n as f64;
    let b2 = kurtosis(x, false, true)?;
    let e = 3.0 * (n - 1.0) / (n + 1.0);
    let varb2 =
        24.0 * n * (n - 2.0) * (n - 3.0) / ((n + 1.0) * (n + 1.0) * (n + 3.0) * (n + 5.0));
    let xs = (b2 - e) / varb2.sqrt();
    let sqrtbeta1 = 6.0 * (n * n - 5.0 * n + 2.0) / ((n + 7.0) * (n + 9.0))
        * (6.0 * (n + 3.0) * (n + 5.0) / (n * (n - 2.0) * (n - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrtbeta1 * (2.0 / sqrtbeta1 + (1.0 + 4.0 / (sqrtbeta1 * sqrtbeta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + xs * (2.0 / (a - 4.0)).sqrt();
    let term2 = if denom == 0.0 {
        f64::NAN
    } else {
        denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt()
    };
    Ok((term1 - term2) / (2.0 / (9.0 * a)).sqrt())
}

// ---------------------------------------------------------------------------
// Shapiro–Wilk (AS R94)
// ---------------------------------------------------------------------------

const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// Polynomial with ascending coefficients.
fn poly(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Lower-half Shapiro–Wilk coefficients `a_1 .. a_{n/2}` (all positive).
fn swilk_coefficients(n: usize) -> Vec<f64> {
    let nn2 = n / 2;
    if n == 3 {
        return vec![std::f64::consts::FRAC_1_SQRT_2];
    }
    let an = n as f64;
    let an25 = an + 0.25;
    let m: Vec<f64> =
        (1..=nn2).map(|i| normal_ppf((i as f64 - 0.375) / an25)).collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;

    let mut a = vec![0.0; nn2];
    a[0] = a1;
    let (first, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
            / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
            .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
        (1, fac)
    };
    for i in first..nn2 {
        a[i] = -m[i] / fac;
    }
    a
}

/// Shapiro–Wilk test; `statistic` is W. A zero-range sample gives `W = 1, p = 1`.
pub fn shapiro(x: &[f64]) -> Result<TestResult> {
    let n = x.len();
    if n < 3 {
        return Err(StatsError::invalid("data must be at least length 3"));
    }
    let s = sorted(x);
    let range = s[n - 1] - s[0];
    if range < 1e-19 {
        return Ok(TestResult::new(1.0, 1.0));
    }

    let a = swilk_coefficients(n);
    // scale by the range for numerical stability; W is scale-invariant
    let scaled: Vec<f64> = s.iter().map(|v| v / range).collect();
    let numer: f64 = a
        .iter()
        .enumerate()
        .map(|(i, &ai)| ai * (scaled[n - 1 - i] - scaled[i]))
        .sum();
    let ssq = central_moment(&scaled, 2) * n as f64;
    let w = (numer * numer / ssq).min(1.0);

    Ok(TestResult::new(w, swilk_pvalue(w, n)))
}

fn swilk_pvalue(w: f64, n: usize) -> f64 {
    if n == 3 {
        const PI6: f64 = 6.0 / std::f64::consts::PI;
        const STQR: f64 = std::f64::consts::FRAC_PI_3;
        return (PI6 * (w.sqrt().asin() - STQR)).max(0.0);
    }
    let an = n as f64;
    let mut y = (1.0 - w).ln();
    let (m, s) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return 1e-99;
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let xx = an.ln();
        (poly(&C5, xx), poly(&C6, xx).exp())
    };
    normal_sf((y - m) / s)
}

// ---------------------------------------------------------------------------
// Anderson–Darling (normal)
// ---------------------------------------------------------------------------

const AVALS_NORM: [f64; 5] = [0.576, 0.656, 0.787, 0.918, 1.092];
const SIGNIFICANCE: [f64; 5] = [15.0, 10.0, 5.0, 2.5, 1.0];

/// Anderson–Darling statistic with critical values at [`SIGNIFICANCE`] percent.
#[derive(Debug, Clone, PartialEq)]
pub struct AndersonResult {
    pub statistic: f64,
    pub critical_values: Vec<f64>,
    pub significance_level: Vec<f64>,
}

pub fn anderson(x: &[f64]) -> Result<AndersonResult> {
    let n = x.len();
    if n < 2 {
        return Err(StatsError::invalid("anderson requires at least 2 observations"));
    }
    let y = sorted(x);
    let nf = n as f64;
    let mean = y.iter().sum::<f64>() / nf;
    let sd = (y.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (nf - 1.0)).sqrt();
    let w: Vec<f64> = y.iter().map(|v| (v - mean) / sd).collect();

    // log Φ(w) and log(1 - Φ(w)) via erfc, accurate in both tails
    let logcdf = |z: f64| (0.5 * erfc(-z / std::f64::consts::SQRT_2)).ln();
    let logsf = |z: f64| (0.5 * erfc(z / std::f64::consts::SQRT_2)).ln();

    let s: f64 = (0..n)
        .map(|i| (2.0 * (i + 1) as f64 - 1.0) / nf * (logcdf(w[i]) + logsf(w[n - 1 - i])))
        .sum();
    let a2 = -nf - s;

    let adjust = 1.0 + 4.0 / nf - 25.0 / (nf * nf);
    let critical_values = AVALS_NORM.iter().map(|&v| round_decimals(v / adjust, 3)).collect();

    Ok(AndersonResult {
        statistic: a2,
        critical_values,
        significance_level: SIGNIFICANCE.to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const SAMPLE: [f64; 20] = [
        148.0, 154.0, 158.0, 160.0, 161.0, 162.0, 166.0, 170.0, 182.0, 195.0, 236.0, 156.0,
        172.0, 163.0, 171.0, 165.0, 159.0, 168.0, 175.0, 180.0,
    ];

    #[test]
    fn test_normaltest_requires_eight_samples() {
        assert!(normaltest(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]).is_err());
    }

    #[test]
    fn test_normaltest_flags_outlier_heavy_sample() {
        let r = normaltest(&SAMPLE).unwrap();
        assert!(r.statistic > 10.0, "K2 = {}", r.statistic);
        assert!(r.pvalue < 0.01, "p = {}", r.pvalue);
    }

    #[test]
    fn test_shapiro_uniform_grid() {
        // scipy.stats.shapiro(range(1, 11)) -> W ≈ 0.9702, p ≈ 0.8924
        let x: Vec<f64> = (1..=10).map(f64::from).collect();
        let r = shapiro(&x).unwrap();
        assert_abs_diff_eq!(r.statistic, 0.9702, epsilon = 1e-3);
        assert_abs_diff_eq!(r.pvalue, 0.8924, epsilon = 1e-2);
    }

    #[test]
    fn test_shapiro_three_points_exact() {
        // equally spaced triple is perfectly "normal": W = 1, p = 1
        let r = shapiro(&[1.0, 2.0, 3.0]).unwrap();
        assert_abs_diff_eq!(r.statistic, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.pvalue, 1.0, epsilon = 1e-6);
        assert!(shapiro(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_shapiro_rejects_skewed_sample() {
        let r = shapiro(&SAMPLE).unwrap();
        assert!(r.pvalue < 0.05, "p = {}", r.pvalue);
    }

    #[test]
    fn test_anderson_critical_values() {
        let r = anderson(&SAMPLE).unwrap();
        // n = 20: 0.576 / (1 + 0.2 - 0.0625) = 0.5064...
        assert_eq!(r.critical_values, vec![0.506, 0.577, 0.692, 0.807, 0.96]);
        assert_eq!(r.significance_level, SIGNIFICANCE.to_vec());
        assert!(r.statistic > r.critical_values[2], "A2 = {}", r.statistic);
    }

    #[test]
    fn test_poly_ascending() {
        assert_eq!(poly(&[1.0, 2.0, 3.0], 2.0), 17.0);
    }
}

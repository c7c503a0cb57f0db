//! Descriptive statistics over a single flat sample.
//!
//! Reductions mirror numpy (`sum`, `mean`, `std`, `percentile`, ...) and the moment
//! based statistics mirror scipy.stats (`skew`, `kurtosis`, `mode`, `zscore`,
//! `describe`). Routines that numpy would answer with `nan` plus a runtime warning
//! (empty input, `ddof >= n`) return [`StatsError::InvalidInput`] instead; results
//! that overflow return [`StatsError::Domain`].

use statrs::statistics::Statistics;

use crate::error::{ensure_all_finite, ensure_finite};
use crate::{Result, StatsError};

fn require_nonempty(x: &[f64], op: &str) -> Result<()> {
    if x.is_empty() {
        return Err(StatsError::invalid(format!(
            "zero-size array to reduction operation {op} which has no identity"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Reductions
// ---------------------------------------------------------------------------

pub fn sum(x: &[f64]) -> Result<f64> {
    ensure_finite("sum", x.iter().sum())
}

pub fn prod(x: &[f64]) -> Result<f64> {
    ensure_finite("prod", x.iter().product())
}

pub fn mean(x: &[f64]) -> Result<f64> {
    require_nonempty(x, "mean")?;
    ensure_finite("mean", x.iter().mean())
}

pub fn min(x: &[f64]) -> Result<f64> {
    require_nonempty(x, "minimum")?;
    Ok(Statistics::min(x.iter()))
}

pub fn max(x: &[f64]) -> Result<f64> {
    require_nonempty(x, "maximum")?;
    Ok(Statistics::max(x.iter()))
}

/// Variance with `ddof` delta degrees of freedom (numpy default `ddof = 0`).
pub fn var(x: &[f64], ddof: f64) -> Result<f64> {
    require_nonempty(x, "var")?;
    if x.len() as f64 - ddof <= 0.0 {
        return Err(StatsError::invalid(format!(
            "degrees of freedom <= 0 for slice (n={}, ddof={ddof})",
            x.len()
        )));
    }
    ensure_finite("var", variance_ddof(x, ddof))
}

pub fn std(x: &[f64], ddof: f64) -> Result<f64> {
    var(x, ddof).map(f64::sqrt)
}

pub fn median(x: &[f64]) -> Result<f64> {
    require_nonempty(x, "median")?;
    Ok(quantile_sorted(&sorted(x), 0.5))
}

/// `q`-th percentile (`0 <= q <= 100`) with numpy's default linear interpolation.
pub fn percentile(x: &[f64], q: f64) -> Result<f64> {
    if !(0.0..=100.0).contains(&q) {
        return Err(StatsError::argument("q", "percentiles must be in the range [0, 100]"));
    }
    require_nonempty(x, "percentile")?;
    Ok(quantile_sorted(&sorted(x), q / 100.0))
}

// ---------------------------------------------------------------------------
// Cumulative / differencing
// ---------------------------------------------------------------------------

pub fn cumsum(x: &[f64]) -> Result<Vec<f64>> {
    let out = x
        .iter()
        .scan(0.0, |acc, &v| {
            *acc += v;
            Some(*acc)
        })
        .collect();
    ensure_all_finite("cumsum", out)
}

pub fn cumprod(x: &[f64]) -> Result<Vec<f64>> {
    let out = x
        .iter()
        .scan(1.0, |acc, &v| {
            *acc *= v;
            Some(*acc)
        })
        .collect();
    ensure_all_finite("cumprod", out)
}

/// `n`-th discrete difference along the sample (numpy `diff`).
pub fn diff(x: &[f64], n: usize) -> Result<Vec<f64>> {
    let mut out = x.to_vec();
    for _ in 0..n {
        if out.len() <= 1 {
            return Ok(Vec::new());
        }
        out = out.windows(2).map(|w| w[1] - w[0]).collect();
    }
    ensure_all_finite("diff", out)
}

// ---------------------------------------------------------------------------
// Moments and shape
// ---------------------------------------------------------------------------

/// Sample skewness. With `bias = false` the adjusted Fisher–Pearson coefficient is
/// returned (requires `n > 2`, otherwise the biased value is kept, like scipy).
pub fn skew(x: &[f64], bias: bool) -> Result<f64> {
    require_nonempty(x, "skew")?;
    let n = x.len() as f64;
    let m2 = central_moment(x, 2);
    let m3 = central_moment(x, 3);
    if is_degenerate(x, m2) {
        return Ok(f64::NAN);
    }
    let g1 = m3 / m2.powf(1.5);
    if !bias && n > 2.0 {
        return Ok((n * (n - 1.0)).sqrt() / (n - 2.0) * g1);
    }
    Ok(g1)
}

/// Sample kurtosis; Fisher's definition (normal → 0) when `fisher` is set.
pub fn kurtosis(x: &[f64], fisher: bool, bias: bool) -> Result<f64> {
    require_nonempty(x, "kurtosis")?;
    let n = x.len() as f64;
    let m2 = central_moment(x, 2);
    let m4 = central_moment(x, 4);
    if is_degenerate(x, m2) {
        return Ok(f64::NAN);
    }
    let mut k = m4 / (m2 * m2);
    if !bias && n > 3.0 {
        k = 1.0 / (n - 2.0) / (n - 3.0)
            * ((n * n - 1.0) * m4 / (m2 * m2) - 3.0 * (n - 1.0) * (n - 1.0))
            + 3.0;
    }
    Ok(if fisher { k - 3.0 } else { k })
}

/// Most frequent value (smallest on ties) and its count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeResult {
    pub mode: f64,
    pub count: usize,
}

pub fn mode(x: &[f64]) -> Result<ModeResult> {
    require_nonempty(x, "mode")?;
    let s = sorted(x);
    let mut best = ModeResult { mode: s[0], count: 0 };
    let mut start = 0;
    while start < s.len() {
        let mut end = start + 1;
        while end < s.len() && s[end] == s[start] {
            end += 1;
        }
        if end - start > best.count {
            best = ModeResult { mode: s[start], count: end - start };
        }
        start = end;
    }
    Ok(best)
}

/// Standard scores `(x - mean) / std(ddof)`; a constant sample yields NaNs.
pub fn zscore(x: &[f64], ddof: f64) -> Result<Vec<f64>> {
    let s = std(x, ddof)?;
    let m = x.iter().mean();
    Ok(x.iter().map(|&v| (v - m) / s).collect())
}

/// Summary produced by [`describe`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescribeResult {
    pub nobs: usize,
    pub minmax: (f64, f64),
    pub mean: f64,
    pub variance: f64,
    pub skewness: f64,
    pub kurtosis: f64,
}

/// scipy `describe`: the variance uses `ddof` (default 1) and is NaN when
/// undefined; skewness and kurtosis honour `bias`.
pub fn describe(x: &[f64], ddof: f64, bias: bool) -> Result<DescribeResult> {
    if x.is_empty() {
        return Err(StatsError::invalid("the input must not be empty"));
    }
    let variance =
        if x.len() as f64 - ddof > 0.0 { variance_ddof(x, ddof) } else { f64::NAN };
    Ok(DescribeResult {
        nobs: x.len(),
        minmax: (Statistics::min(x.iter()), Statistics::max(x.iter())),
        mean: x.iter().mean(),
        variance,
        skewness: skew(x, bias)?,
        kurtosis: kurtosis(x, true, bias)?,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn sorted(x: &[f64]) -> Vec<f64> {
    let mut s = x.to_vec();
    s.sort_by(f64::total_cmp);
    s
}

/// Linear-interpolated quantile of an ascending, non-empty slice (`0 <= p <= 1`).
pub(crate) fn quantile_sorted(s: &[f64], p: f64) -> f64 {
    let pos = p * (s.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let t = pos - lo as f64;
    let (a, b) = (s[lo], s[hi]);
    // numpy's lerp: symmetric form keeps endpoints exact
    if t >= 0.5 { b - (b - a) * (1.0 - t) } else { a + (b - a) * t }
}

pub(crate) fn variance_ddof(x: &[f64], ddof: f64) -> f64 {
    let m = x.iter().mean();
    let ss: f64 = x.iter().map(|&v| (v - m) * (v - m)).sum();
    ss / (x.len() as f64 - ddof)
}

pub(crate) fn central_moment(x: &[f64], order: i32) -> f64 {
    let m = x.iter().mean();
    x.iter().map(|&v| (v - m).powi(order)).sum::<f64>() / x.len() as f64
}

/// scipy treats a second moment below the rounding noise of the mean as zero.
fn is_degenerate(x: &[f64], m2: f64) -> bool {
    let m = x.iter().mean();
    m2 <= (f64::EPSILON * m).powi(2)
}

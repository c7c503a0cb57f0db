//! Simple least-squares regression of `y` on `x`.

use crate::dist::t_sf;
use crate::{Result, StatsError};

/// Output of [`linregress`], in scipy's field order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinregressResult {
    pub slope: f64,
    pub intercept: f64,
    pub rvalue: f64,
    /// Two-sided p-value for `H₀: slope = 0` (t-test with n - 2 df).
    pub pvalue: f64,
    /// Standard error of the slope.
    pub stderr: f64,
    pub intercept_stderr: f64,
}

const TINY: f64 = 1.0e-20;

pub fn linregress(x: &[f64], y: &[f64]) -> Result<LinregressResult> {
    if x.len() != y.len() {
        return Err(StatsError::invalid(format!(
            "x and y must have the same length (got {} and {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() < 2 {
        return Err(StatsError::invalid("linregress requires at least 2 points"));
    }
    if x.iter().all(|&v| v == x[0]) {
        return Err(StatsError::invalid(
            "cannot calculate a linear regression if all x values are identical",
        ));
    }

    let n = x.len() as f64;
    let xmean = x.iter().sum::<f64>() / n;
    let ymean = y.iter().sum::<f64>() / n;

    // population (co)variances, as numpy.cov(..., bias=1)
    let (mut ssxm, mut ssym, mut ssxym) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        ssxm += (a - xmean) * (a - xmean);
        ssym += (b - ymean) * (b - ymean);
        ssxym += (a - xmean) * (b - ymean);
    }
    ssxm /= n;
    ssym /= n;
    ssxym /= n;

    let r = if ssym == 0.0 { 0.0 } else { (ssxym / (ssxm * ssym).sqrt()).clamp(-1.0, 1.0) };
    let slope = ssxym / ssxm;
    let intercept = ymean - slope * xmean;

    if x.len() == 2 {
        let pvalue = if y[0] == y[1] { 1.0 } else { 0.0 };
        return Ok(LinregressResult {
            slope,
            intercept,
            rvalue: r,
            pvalue,
            stderr: 0.0,
            intercept_stderr: 0.0,
        });
    }

    let df = n - 2.0;
    let t = r * (df / ((1.0 - r + TINY) * (1.0 + r + TINY))).sqrt();
    let pvalue = (2.0 * t_sf(t.abs(), df)).min(1.0);
    let stderr = ((1.0 - r * r) * ssym / ssxm / df).sqrt();
    let intercept_stderr = stderr * (ssxm + xmean * xmean).sqrt();

    Ok(LinregressResult { slope, intercept, rvalue: r, pvalue, stderr, intercept_stderr })
}

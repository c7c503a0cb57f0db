//! Parametric and rank-based hypothesis tests.
//!
//! ## Parametric
//!
//! - [`ttest_1samp`]: `t = (x̄ - μ₀) / (s / √n)`, df = n - 1.
//! - [`ttest_ind`]: pooled-variance Student t (df = n₁ + n₂ - 2), or Welch's t with
//!   Welch–Satterthwaite df when `equal_var = false`.
//! - [`f_oneway`]: one-way ANOVA, `F = MS_between / MS_within` ~ F(k-1, N-k).
//! - [`levene`]: Levene / Brown–Forsythe test for equal variances (median centring
//!   by default).
//!
//! ## Rank-based
//!
//! - [`mannwhitneyu`]: U of the first sample. Exact null distribution when either
//!   sample has at most 8 observations and there are no ties; otherwise the
//!   tie-corrected normal approximation with optional continuity correction.
//! - [`kruskal`]: Kruskal–Wallis H with tie correction, H ~ χ²(k-1).
//! - [`wilcoxon`]: one-sample signed-rank test on the given differences; zeros are
//!   dropped. Exact for n ≤ 50 without ties or zeros, normal approximation otherwise.
//! - [`ks_2samp`]: two-sample Kolmogorov–Smirnov with the exact null distribution
//!   (lattice path counting) up to 10 000 observations per sample, the asymptotic
//!   Kolmogorov distribution beyond that or when the exact sum is unusable.

use std::str::FromStr;

use crate::descriptive::{quantile_sorted, sorted, variance_ddof};
use crate::dist::{chi2_sf, f_sf, normal_cdf, normal_sf, t_cdf, t_sf};
use crate::rank::{rankdata, tie_groups, tie_sum};
use crate::{Alternative, Result, StatsError, TestResult};

/// t-test result; `df` is fractional for Welch's test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TTestResult {
    pub statistic: f64,
    pub pvalue: f64,
    pub df: f64,
}

// ---------------------------------------------------------------------------
// t-tests
// ---------------------------------------------------------------------------

pub fn ttest_1samp(a: &[f64], popmean: f64, alternative: Alternative) -> Result<TTestResult> {
    if a.len() < 2 {
        return Err(StatsError::invalid("ttest_1samp requires at least 2 observations"));
    }
    let n = a.len() as f64;
    let mean = a.iter().sum::<f64>() / n;
    let se = (variance_ddof(a, 1.0) / n).sqrt();
    let t = (mean - popmean) / se;
    let df = n - 1.0;
    Ok(TTestResult { statistic: t, pvalue: alternative.p_value(t_cdf(t, df), t_sf(t, df)), df })
}

pub fn ttest_ind(
    a: &[f64],
    b: &[f64],
    equal_var: bool,
    alternative: Alternative,
) -> Result<TTestResult> {
    if a.len() < 2 || b.len() < 2 {
        return Err(StatsError::invalid("ttest_ind requires at least 2 observations per sample"));
    }
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (m1, m2) = (a.iter().sum::<f64>() / n1, b.iter().sum::<f64>() / n2);
    let (v1, v2) = (variance_ddof(a, 1.0), variance_ddof(b, 1.0));

    let (df, denom) = if equal_var {
        let df = n1 + n2 - 2.0;
        let svar = ((n1 - 1.0) * v1 + (n2 - 1.0) * v2) / df;
        (df, (svar * (1.0 / n1 + 1.0 / n2)).sqrt())
    } else {
        let (vn1, vn2) = (v1 / n1, v2 / n2);
        let df = (vn1 + vn2).powi(2) / (vn1 * vn1 / (n1 - 1.0) + vn2 * vn2 / (n2 - 1.0));
        (df, (vn1 + vn2).sqrt())
    };

    let t = (m1 - m2) / denom;
    Ok(TTestResult { statistic: t, pvalue: alternative.p_value(t_cdf(t, df), t_sf(t, df)), df })
}

// ---------------------------------------------------------------------------
// k-sample location / scale
// ---------------------------------------------------------------------------

fn check_samples(samples: &[&[f64]], op: &str) -> Result<()> {
    if samples.len() < 2 {
        return Err(StatsError::invalid(format!(
            "{op} requires at least two samples; {} given",
            samples.len()
        )));
    }
    if let Some(i) = samples.iter().position(|s| s.is_empty()) {
        return Err(StatsError::invalid(format!("{op}: sample {i} is empty")));
    }
    Ok(())
}

pub fn f_oneway(samples: &[&[f64]]) -> Result<TestResult> {
    check_samples(samples, "f_oneway")?;
    let k = samples.len() as f64;
    let total: usize = samples.iter().map(|s| s.len()).sum();
    let n = total as f64;
    if n <= k {
        return Err(StatsError::invalid(
            "f_oneway requires more observations than samples",
        ));
    }
    let grand = samples.iter().flat_map(|s| s.iter()).sum::<f64>() / n;

    let mut ss_between = 0.0;
    let mut ss_within = 0.0;
    for s in samples {
        let m = s.iter().sum::<f64>() / s.len() as f64;
        ss_between += s.len() as f64 * (m - grand) * (m - grand);
        ss_within += s.iter().map(|v| (v - m) * (v - m)).sum::<f64>();
    }
    let (df_b, df_w) = (k - 1.0, n - k);

    if ss_within == 0.0 {
        // every sample is constant: F is infinite unless the means coincide as well
        return Ok(if ss_between == 0.0 {
            TestResult::new(f64::NAN, f64::NAN)
        } else {
            TestResult::new(f64::INFINITY, 0.0)
        });
    }
    let f = (ss_between / df_b) / (ss_within / df_w);
    Ok(TestResult::new(f, f_sf(f, df_b, df_w)))
}

/// Centre used by [`levene`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Center {
    #[default]
    Median,
    Mean,
}

impl FromStr for Center {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "median" => Ok(Self::Median),
            "mean" => Ok(Self::Mean),
            other => Err(StatsError::argument(
                "center",
                format!("expected 'median' or 'mean', got '{other}'"),
            )),
        }
    }
}

pub fn levene(samples: &[&[f64]], center: Center) -> Result<TestResult> {
    check_samples(samples, "levene")?;
    let k = samples.len() as f64;
    let n: f64 = samples.iter().map(|s| s.len() as f64).sum();

    let deviations: Vec<Vec<f64>> = samples
        .iter()
        .map(|s| {
            let c = match center {
                Center::Median => quantile_sorted(&sorted(s), 0.5),
                Center::Mean => s.iter().sum::<f64>() / s.len() as f64,
            };
            s.iter().map(|v| (v - c).abs()).collect()
        })
        .collect();

    let group_means: Vec<f64> =
        deviations.iter().map(|z| z.iter().sum::<f64>() / z.len() as f64).collect();
    let grand = deviations.iter().zip(&group_means).map(|(z, m)| z.len() as f64 * m).sum::<f64>()
        / n;

    let numer: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.len() as f64 * (m - grand) * (m - grand))
        .sum::<f64>()
        * (n - k);
    let denom: f64 = deviations
        .iter()
        .zip(&group_means)
        .map(|(z, m)| z.iter().map(|v| (v - m) * (v - m)).sum::<f64>())
        .sum::<f64>()
        * (k - 1.0);

    let w = numer / denom;
    Ok(TestResult::new(w, f_sf(w, k - 1.0, n - k)))
}

// ---------------------------------------------------------------------------
// Mann–Whitney U
// ---------------------------------------------------------------------------

pub fn mannwhitneyu(
    x: &[f64],
    y: &[f64],
    use_continuity: bool,
    alternative: Alternative,
) -> Result<TestResult> {
    if x.is_empty() || y.is_empty() {
        return Err(StatsError::invalid("`x` and `y` must be of nonzero size"));
    }
    let (n1, n2) = (x.len(), y.len());
    let combined: Vec<f64> = x.iter().chain(y).copied().collect();
    let ranks = rankdata(&combined);
    let r1: f64 = ranks[..n1].iter().sum();
    let u1 = r1 - (n1 * (n1 + 1)) as f64 / 2.0;
    let u2 = (n1 * n2) as f64 - u1;

    let u = match alternative {
        Alternative::TwoSided => u1.max(u2),
        Alternative::Greater => u1,
        Alternative::Less => u2,
    };

    let ties = tie_groups(&combined).iter().any(|&t| t > 1);
    let exact = !(n1 > 8 && n2 > 8) && !ties;

    let mut p = if exact {
        mwu_exact_sf(u, n1, n2)
    } else {
        let n = (n1 + n2) as f64;
        let mu = (n1 * n2) as f64 / 2.0;
        let tie_term = tie_sum(&combined) / (n * (n - 1.0));
        let s = ((n1 * n2) as f64 / 12.0 * ((n + 1.0) - tie_term)).sqrt();
        let mut z = u - mu;
        if use_continuity {
            z -= 0.5;
        }
        normal_sf(z / s)
    };
    if alternative == Alternative::TwoSided {
        p *= 2.0;
    }
    Ok(TestResult::new(u1, p.clamp(0.0, 1.0)))
}

/// `P(U >= u)` under H₀ for sample sizes `n1`, `n2`.
///
/// The counts of U are the coefficients of the Gaussian binomial
/// `[n1 + n2 choose m]_q`, built as `Π_{i=1..m} (1 - q^{n+i}) / (1 - q^i)` with
/// `m = min(n1, n2)`, `n = max(n1, n2)`.
fn mwu_exact_sf(u: f64, n1: usize, n2: usize) -> f64 {
    let (m, n) = (n1.min(n2), n1.max(n2));
    let max_u = m * n;
    let mut c = vec![0.0_f64; max_u + 1];
    c[0] = 1.0;
    let mut deg = 0;
    for i in 1..=m {
        // multiply by (1 - q^{n+i}): degree grows by n + i (only up to max_u is kept)
        let shift = n + i;
        let new_deg = (deg + shift).min(max_u + i);
        let mut prod = vec![0.0_f64; new_deg + 1];
        for k in 0..=new_deg {
            let keep = if k <= deg { c[k] } else { 0.0 };
            let sub = if k >= shift && k - shift <= deg { c[k - shift] } else { 0.0 };
            prod[k] = keep - sub;
        }
        // divide by (1 - q^i): running sum with stride i
        for k in i..=new_deg {
            prod[k] += prod[k - i];
        }
        deg += n;
        for k in 0..=deg {
            c[k] = prod[k].max(0.0);
        }
    }

    let total: f64 = c.iter().sum();
    let start = u.ceil().max(0.0) as usize;
    if start > max_u {
        return 0.0;
    }
    c[start..].iter().sum::<f64>() / total
}

// ---------------------------------------------------------------------------
// Kruskal–Wallis
// ---------------------------------------------------------------------------

pub fn kruskal(samples: &[&[f64]]) -> Result<TestResult> {
    check_samples(samples, "kruskal")?;
    let combined: Vec<f64> = samples.iter().flat_map(|s| s.iter().copied()).collect();
    let n = combined.len() as f64;
    let ranks = rankdata(&combined);

    let mut offset = 0;
    let mut h = 0.0;
    for s in samples {
        let r: f64 = ranks[offset..offset + s.len()].iter().sum();
        h += r * r / s.len() as f64;
        offset += s.len();
    }
    h = 12.0 / (n * (n + 1.0)) * h - 3.0 * (n + 1.0);

    let correction = 1.0 - tie_sum(&combined) / (n * n * n - n);
    if correction == 0.0 {
        return Err(StatsError::invalid("all numbers are identical in kruskal"));
    }
    h /= correction;
    Ok(TestResult::new(h, chi2_sf(h, samples.len() as f64 - 1.0)))
}

// ---------------------------------------------------------------------------
// Wilcoxon signed-rank
// ---------------------------------------------------------------------------

pub fn wilcoxon(d: &[f64], correction: bool, alternative: Alternative) -> Result<TestResult> {
    let n_zero = d.iter().filter(|&&v| v == 0.0).count();
    let nonzero: Vec<f64> = d.iter().copied().filter(|&v| v != 0.0).collect();
    if nonzero.is_empty() {
        return Err(StatsError::invalid(
            "wilcoxon requires at least one non-zero difference",
        ));
    }
    let n = nonzero.len();
    let abs: Vec<f64> = nonzero.iter().map(|v| v.abs()).collect();
    let ranks = rankdata(&abs);
    let r_plus: f64 = nonzero.iter().zip(&ranks).filter(|(v, _)| **v > 0.0).map(|(_, r)| r).sum();
    let r_minus: f64 = nonzero.iter().zip(&ranks).filter(|(v, _)| **v < 0.0).map(|(_, r)| r).sum();

    let statistic =
        if alternative == Alternative::TwoSided { r_plus.min(r_minus) } else { r_plus };

    let ties = tie_groups(&abs).iter().any(|&t| t > 1);
    let pvalue = if n <= 50 && !ties && n_zero == 0 {
        let dist = signed_rank_distribution(n);
        // all ranks are integers here
        let t = r_plus.round() as usize;
        let cdf: f64 = dist[..=t].iter().sum();
        let sf: f64 = dist[t..].iter().sum();
        alternative.p_value(cdf, sf)
    } else {
        let nf = n as f64;
        let mn = nf * (nf + 1.0) / 4.0;
        let se = (nf * (nf + 1.0) * (2.0 * nf + 1.0) / 24.0 - tie_sum(&abs) / 48.0).sqrt();
        let d = if !correction {
            0.0
        } else {
            match alternative {
                Alternative::TwoSided => 0.5 * (statistic - mn).signum(),
                Alternative::Greater => 0.5,
                Alternative::Less => -0.5,
            }
        };
        let z = (statistic - mn - d) / se;
        match alternative {
            Alternative::TwoSided => (2.0 * normal_sf(z.abs())).min(1.0),
            Alternative::Greater => normal_sf(z),
            Alternative::Less => normal_cdf(z),
        }
    };
    Ok(TestResult::new(statistic, pvalue))
}

/// Probability mass of the signed-rank statistic `T+` for `n` untied observations.
fn signed_rank_distribution(n: usize) -> Vec<f64> {
    let max = n * (n + 1) / 2;
    let mut counts = vec![0.0_f64; max + 1];
    counts[0] = 1.0;
    for k in 1..=n {
        for s in (k..=max).rev() {
            counts[s] += counts[s - k];
        }
    }
    let total = 2f64.powi(n as i32);
    counts.into_iter().map(|c| c / total).collect()
}

// ---------------------------------------------------------------------------
// Two-sample Kolmogorov–Smirnov
// ---------------------------------------------------------------------------

pub fn ks_2samp(a: &[f64], b: &[f64], alternative: Alternative) -> Result<TestResult> {
    if a.is_empty() || b.is_empty() {
        return Err(StatsError::invalid("ks_2samp requires non-empty samples"));
    }
    let (sa, sb) = (sorted(a), sorted(b));
    let (n1, n2) = (sa.len(), sb.len());

    // Walk the merged order statistics; compare ECDFs after each distinct value.
    let (mut i, mut j) = (0, 0);
    let (mut d_plus, mut d_minus) = (0.0_f64, 0.0_f64);
    while i < n1 || j < n2 {
        let v = match (sa.get(i), sb.get(j)) {
            (Some(&x), Some(&y)) => x.min(y),
            (Some(&x), None) => x,
            (None, Some(&y)) => y,
            (None, None) => break,
        };
        while i < n1 && sa[i] <= v {
            i += 1;
        }
        while j < n2 && sb[j] <= v {
            j += 1;
        }
        let diff = i as f64 / n1 as f64 - j as f64 / n2 as f64;
        d_plus = d_plus.max(diff);
        d_minus = d_minus.max(-diff);
    }

    let (statistic, boundary) = match alternative {
        Alternative::TwoSided => (d_plus.max(d_minus), KsBoundary::Both),
        Alternative::Greater => (d_plus, KsBoundary::Upper),
        Alternative::Less => (d_minus, KsBoundary::Lower),
    };
    let pvalue = (n1.max(n2) <= KS_MAX_EXACT_N)
        .then(|| 1.0 - ks_inside_probability(n1, n2, statistic, boundary))
        .filter(|p| p.is_finite())
        .unwrap_or_else(|| ks_asymptotic_sf(n1, n2, statistic, boundary));
    Ok(TestResult::new(statistic, pvalue.clamp(0.0, 1.0)))
}

/// Largest sample for which the exact lattice count is used.
const KS_MAX_EXACT_N: usize = 10_000;

/// Limiting distributions: Kolmogorov's series for the two-sided statistic and
/// Smirnov's `exp(-2 z^2)` with a first-order correction for one-sided ones.
fn ks_asymptotic_sf(m: usize, n: usize, d: f64, boundary: KsBoundary) -> f64 {
    let (md, nd) = (m as f64, n as f64);
    let en = md * nd / (md + nd);
    let z = en.sqrt() * d;
    match boundary {
        KsBoundary::Both => kolmogorov_sf(z),
        KsBoundary::Upper | KsBoundary::Lower => {
            let (m, n) = if md >= nd { (md, nd) } else { (nd, md) };
            let correction = 2.0 * z * (m + 2.0 * n) / (m * n * (m + n)).sqrt() / 3.0;
            (-2.0 * z * z - correction).exp()
        }
    }
}

/// `P(K > z)` for the Kolmogorov distribution.
fn kolmogorov_sf(z: f64) -> f64 {
    if z <= 0.0 {
        return 1.0;
    }
    if z < 1.0 {
        // the alternating series converges slowly here; use the theta-function
        // form of the cdf instead
        let t = std::f64::consts::PI * std::f64::consts::PI / (8.0 * z * z);
        let s: f64 = (1..=15u32).map(|k| (-(2.0 * f64::from(k) - 1.0).powi(2) * t).exp()).sum();
        return 1.0 - (2.0 * std::f64::consts::PI).sqrt() / z * s;
    }
    let mut total = 0.0;
    for k in 1..=100u32 {
        let kf = f64::from(k);
        let term = (-2.0 * kf * kf * z * z).exp();
        total += if k % 2 == 1 { term } else { -term };
        if term < 1e-17 {
            break;
        }
    }
    2.0 * total
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KsBoundary {
    /// `|F1 - F2| < d`
    Both,
    /// `F1 - F2 < d`
    Upper,
    /// `F2 - F1 < d`
    Lower,
}

/// Probability that a uniformly random merge of `m` and `n` observations keeps the
/// ECDF difference strictly inside `d` (Hodges' lattice path count). Each row is
/// rescaled to a maximum of one and the scale kept as a logarithm, so interior
/// cells neither overflow nor underflow. NaN if the count is lost.
fn ks_inside_probability(m: usize, n: usize, d: f64, boundary: KsBoundary) -> f64 {
    // iterate over the shorter side; swapping the samples mirrors a one-sided band
    let (m, n, boundary) = if m > n {
        let mirrored = match boundary {
            KsBoundary::Both => KsBoundary::Both,
            KsBoundary::Upper => KsBoundary::Lower,
            KsBoundary::Lower => KsBoundary::Upper,
        };
        (n, m, mirrored)
    } else {
        (m, n, boundary)
    };
    let (md, nd) = (m as f64, n as f64);
    // D is a multiple of 1/(m n); shift the threshold half a lattice step below it
    let q = (0.5 + (d * md * nd - 1e-7).floor()) / (md * nd);
    let outside = |i: usize, j: usize| {
        let diff = i as f64 / md - j as f64 / nd;
        match boundary {
            KsBoundary::Both => diff.abs() > q,
            KsBoundary::Upper => diff > q,
            KsBoundary::Lower => -diff > q,
        }
    };

    // u[j] holds paths(i, j) / C(i + n, i) / exp(ln_scale) for the current row i
    let mut u: Vec<f64> = (0..=n).map(|j| if outside(0, j) { 0.0 } else { 1.0 }).collect();
    let mut ln_scale = 0.0;
    for i in 1..=m {
        let w = i as f64 / (i + n) as f64;
        u[0] = if outside(i, 0) { 0.0 } else { w * u[0] };
        for j in 1..=n {
            u[j] = if outside(i, j) { 0.0 } else { w * u[j] + u[j - 1] };
        }
        let peak = u.iter().copied().fold(0.0, f64::max);
        if peak == 0.0 {
            return 0.0;
        }
        if !peak.is_finite() {
            return f64::NAN;
        }
        u.iter_mut().for_each(|v| *v /= peak);
        ln_scale += peak.ln();
    }
    u[n] * ln_scale.exp()
}

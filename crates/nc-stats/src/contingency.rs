//! Tests on contingency tables (rows × columns of observed counts).
//!
//! Tables are passed as rows; callers guarantee a rectangular, non-empty shape.

use statrs::function::gamma::ln_gamma;

use crate::dist::chi2_sf;
use crate::{Alternative, Result, StatsError, TestResult};

/// Pearson chi-squared test of independence.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyResult {
    pub statistic: f64,
    pub pvalue: f64,
    pub dof: usize,
    pub expected_freq: Vec<Vec<f64>>,
}

fn check_table(table: &[Vec<f64>], op: &str) -> Result<()> {
    if table.is_empty() || table[0].is_empty() {
        return Err(StatsError::invalid(format!("{op}: the table must not be empty")));
    }
    let cols = table[0].len();
    if table.iter().any(|row| row.len() != cols) {
        return Err(StatsError::invalid(format!("{op}: all rows must have the same length")));
    }
    if table.iter().flatten().any(|&v| v < 0.0) {
        return Err(StatsError::invalid(format!("{op}: all values in the table must be nonnegative")));
    }
    Ok(())
}

/// Chi-squared test of independence. With one degree of freedom and
/// `correction = true`, Yates' continuity correction is applied.
pub fn chi2_contingency(table: &[Vec<f64>], correction: bool) -> Result<ContingencyResult> {
    check_table(table, "chi2_contingency")?;
    let rows = table.len();
    let cols = table[0].len();

    let row_sums: Vec<f64> = table.iter().map(|r| r.iter().sum()).collect();
    let col_sums: Vec<f64> = (0..cols).map(|j| table.iter().map(|r| r[j]).sum()).collect();
    let total: f64 = row_sums.iter().sum();

    let expected: Vec<Vec<f64>> = row_sums
        .iter()
        .map(|&rs| col_sums.iter().map(|&cs| rs * cs / total).collect())
        .collect();

    for (i, row) in expected.iter().enumerate() {
        if let Some(j) = row.iter().position(|&e| e == 0.0 || e.is_nan()) {
            return Err(StatsError::invalid(format!(
                "the internally computed table of expected frequencies has a zero element at ({i}, {j})"
            )));
        }
    }

    let dof = (rows - 1) * (cols - 1);
    if dof == 0 {
        return Ok(ContingencyResult { statistic: 0.0, pvalue: 1.0, dof, expected_freq: expected });
    }

    let yates = dof == 1 && correction;
    let mut statistic = 0.0;
    for (obs_row, exp_row) in table.iter().zip(&expected) {
        for (&o, &e) in obs_row.iter().zip(exp_row) {
            let o = if yates {
                let diff = e - o;
                o + diff.signum() * diff.abs().min(0.5)
            } else {
                o
            };
            statistic += (o - e) * (o - e) / e;
        }
    }

    Ok(ContingencyResult {
        statistic,
        pvalue: chi2_sf(statistic, dof as f64),
        dof,
        expected_freq: expected,
    })
}

/// Largest cell count accepted by [`fisher_exact`]: beyond 2^53 counts are no
/// longer exact in a double.
const MAX_EXACT_COUNT: f64 = 9_007_199_254_740_992.0;

/// Relative tolerance when comparing table probabilities to the observed one.
const FISHER_RTOL: f64 = 1e-7;

fn ln_choose(n: u64, k: u64) -> f64 {
    // ln(n choose k) = ln Γ(n+1) - ln Γ(k+1) - ln Γ(n-k+1)
    ln_gamma(n as f64 + 1.0) - ln_gamma(k as f64 + 1.0) - ln_gamma((n - k) as f64 + 1.0)
}

/// Hypergeometric law of the top-left cell given the table margins.
struct Margins {
    n1: u64,
    n2: u64,
    draws: u64,
    ln_total: f64,
    lo: u64,
    hi: u64,
    mode: u64,
}

impl Margins {
    fn new(n1: u64, n2: u64, draws: u64) -> Result<Self> {
        let total = n1
            .checked_add(n2)
            .ok_or_else(|| StatsError::invalid("fisher_exact: table counts are too large"))?;
        let lo = draws.saturating_sub(n2);
        let hi = draws.min(n1);
        let mode = ((draws as f64 + 1.0) * (n1 as f64 + 1.0) / (total as f64 + 2.0)).floor();
        Ok(Self {
            n1,
            n2,
            draws,
            ln_total: ln_choose(total, draws),
            lo,
            hi,
            mode: (mode as u64).clamp(lo, hi),
        })
    }

    fn pmf(&self, k: u64) -> f64 {
        (ln_choose(self.n1, k) + ln_choose(self.n2, self.draws - k) - self.ln_total).exp()
    }

    /// Sum of the pmf from `from` towards `to` (inclusive), moving away from the
    /// mode; stops once the remaining terms no longer change the sum.
    fn tail(&self, from: u64, to: u64) -> f64 {
        let mut total = 0.0;
        let mut k = from;
        loop {
            let p = self.pmf(k);
            total += p;
            if k == to || p <= total * f64::EPSILON {
                return total;
            }
            if to > from { k += 1 } else { k -= 1 }
        }
    }

    /// `P(X <= k)`
    fn cdf(&self, k: u64) -> f64 {
        if k <= self.mode {
            self.tail(k, self.lo)
        } else if k >= self.hi {
            1.0
        } else {
            1.0 - self.tail(k + 1, self.hi)
        }
    }

    /// `P(X >= k)`
    fn sf(&self, k: u64) -> f64 {
        if k >= self.mode {
            self.tail(k, self.hi)
        } else if k <= self.lo {
            1.0
        } else {
            1.0 - self.tail(k - 1, self.lo)
        }
    }

    /// Total probability of the tables no more likely than the one at `observed`.
    fn two_sided(&self, observed: u64) -> f64 {
        let threshold = self.pmf(observed) * (1.0 + FISHER_RTOL);
        if self.pmf(self.mode) <= threshold {
            return 1.0;
        }
        // the pmf is unimodal: on the far side of the mode, binary-search the
        // first value at or below the threshold
        if observed < self.mode {
            let near = self.tail(observed, self.lo);
            let (mut a, mut b) = (self.mode + 1, self.hi);
            if self.mode == self.hi || self.pmf(b) > threshold {
                return near;
            }
            while a < b {
                let mid = a + (b - a) / 2;
                if self.pmf(mid) <= threshold { b = mid } else { a = mid + 1 }
            }
            near + self.tail(a, self.hi)
        } else {
            let near = self.tail(observed, self.hi);
            if self.mode == self.lo || self.pmf(self.lo) > threshold {
                return near;
            }
            let (mut a, mut b) = (self.lo, self.mode - 1);
            while a < b {
                let mid = a + (b - a).div_ceil(2);
                if self.pmf(mid) <= threshold { a = mid } else { b = mid - 1 }
            }
            near + self.tail(a, self.lo)
        }
    }
}

/// Fisher's exact test on a 2×2 table of non-negative integer counts.
/// `statistic` is the sample odds ratio `(a·d) / (b·c)`.
pub fn fisher_exact(table: &[Vec<f64>], alternative: Alternative) -> Result<TestResult> {
    check_table(table, "fisher_exact")?;
    if table.len() != 2 || table[0].len() != 2 {
        return Err(StatsError::invalid("the input `table` must be of shape (2, 2)"));
    }
    if table.iter().flatten().any(|v| v.fract() != 0.0) {
        return Err(StatsError::invalid("fisher_exact requires integer counts"));
    }
    if table.iter().flatten().any(|&v| v > MAX_EXACT_COUNT) {
        return Err(StatsError::invalid(format!(
            "fisher_exact: counts above {MAX_EXACT_COUNT} cannot be evaluated exactly"
        )));
    }
    let [a, b] = [table[0][0] as u64, table[0][1] as u64];
    let [c, d] = [table[1][0] as u64, table[1][1] as u64];

    let too_large = || StatsError::invalid("fisher_exact: table counts are too large");
    let n1 = a.checked_add(b).ok_or_else(too_large)?;
    let n2 = c.checked_add(d).ok_or_else(too_large)?;
    let draws = a.checked_add(c).ok_or_else(too_large)?;
    if n1 == 0 || n2 == 0 || draws == 0 || b + d == 0 {
        return Ok(TestResult::new(f64::NAN, 1.0));
    }
    let (af, bf, cf, df) = (a as f64, b as f64, c as f64, d as f64);
    let odds_ratio = if b > 0 && c > 0 { af * df / (bf * cf) } else { f64::INFINITY };

    // a ~ Hypergeometric(population = n1 + n2, successes = n1, draws = a + c)
    let margins = Margins::new(n1, n2, draws)?;
    let pvalue = match alternative {
        Alternative::Less => margins.cdf(a),
        Alternative::Greater => margins.sf(a),
        Alternative::TwoSided => margins.two_sided(a),
    };
    Ok(TestResult::new(odds_ratio, pvalue.clamp(0.0, 1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_chi2_contingency_yates() {
        // scipy.stats.chi2_contingency([[10, 20], [30, 40]])
        let r = chi2_contingency(&[vec![10.0, 20.0], vec![30.0, 40.0]], true).unwrap();
        assert_eq!(r.dof, 1);
        assert_abs_diff_eq!(r.expected_freq[0][0], 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.expected_freq[1][1], 42.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.statistic, 0.4464285714285714, epsilon = 1e-10);
        assert_abs_diff_eq!(r.pvalue, 0.5040358664525046, epsilon = 1e-6);
    }

    #[test]
    fn test_chi2_contingency_without_correction() {
        let r = chi2_contingency(&[vec![10.0, 20.0], vec![30.0, 40.0]], false).unwrap();
        assert_abs_diff_eq!(r.statistic, 0.7936507936507936, epsilon = 1e-10);
    }

    #[test]
    fn test_chi2_contingency_zero_expected() {
        assert!(chi2_contingency(&[vec![0.0, 0.0], vec![3.0, 4.0]], true).is_err());
        assert!(chi2_contingency(&[vec![1.0, -1.0], vec![3.0, 4.0]], true).is_err());
    }

    #[test]
    fn test_fisher_exact_reference() {
        // scipy.stats.fisher_exact([[8, 2], [1, 5]]) -> (20.0, 0.03496503...)
        let table = vec![vec![8.0, 2.0], vec![1.0, 5.0]];
        let r = fisher_exact(&table, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(r.statistic, 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(r.pvalue, 0.03496503496503495, epsilon = 1e-9);

        let g = fisher_exact(&table, Alternative::Greater).unwrap();
        assert!(g.pvalue < r.pvalue);
    }

    #[test]
    fn test_fisher_exact_shape_and_margins() {
        assert!(fisher_exact(&[vec![1.0, 2.0, 3.0], vec![1.0, 2.0, 3.0]], Alternative::TwoSided).is_err());
        assert!(fisher_exact(&[vec![1.5, 2.0], vec![1.0, 2.0]], Alternative::TwoSided).is_err());
        let r = fisher_exact(&[vec![0.0, 0.0], vec![1.0, 2.0]], Alternative::TwoSided).unwrap();
        assert!(r.statistic.is_nan());
        assert_eq!(r.pvalue, 1.0);
    }

    #[test]
    fn test_fisher_exact_one_sided_tails() {
        // C(10, k) C(6, 9 - k) / C(16, 9) for k = 3..=9: 120, 1260, 3780, 4200, 1800, 270, 10
        let table = vec![vec![8.0, 2.0], vec![1.0, 5.0]];
        let greater = fisher_exact(&table, Alternative::Greater).unwrap();
        assert_abs_diff_eq!(greater.pvalue, 280.0 / 11440.0, epsilon = 1e-12);
        let less = fisher_exact(&table, Alternative::Less).unwrap();
        assert_abs_diff_eq!(less.pvalue, 11430.0 / 11440.0, epsilon = 1e-12);

        // mirrored table: the tails swap
        let mirrored = vec![vec![2.0, 8.0], vec![5.0, 1.0]];
        let less = fisher_exact(&mirrored, Alternative::Less).unwrap();
        assert_abs_diff_eq!(less.pvalue, greater.pvalue, epsilon = 1e-12);
    }

    #[test]
    fn test_fisher_exact_large_balanced_tables() {
        for n in [500.0, 5_000.0, 100_000.0, 30_000_000.0] {
            let table = vec![vec![n, n], vec![n, n]];
            let r = fisher_exact(&table, Alternative::TwoSided).unwrap();
            assert_eq!(r.statistic, 1.0);
            assert_abs_diff_eq!(r.pvalue, 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_fisher_exact_large_tables_stay_accurate() {
        // exact hypergeometric sum over C(1000, k) C(1000, 1000 - k) / C(2000, 1000)
        let table = vec![vec![510.0, 490.0], vec![490.0, 510.0]];
        let r = fisher_exact(&table, Alternative::TwoSided).unwrap();
        assert_abs_diff_eq!(r.pvalue, 0.39549420191013, epsilon = 1e-6);
        let greater = fisher_exact(&table, Alternative::Greater).unwrap();
        assert_abs_diff_eq!(greater.pvalue, r.pvalue / 2.0, epsilon = 1e-6);

        let r = fisher_exact(&[vec![1000.0, 0.0], vec![0.0, 1000.0]], Alternative::TwoSided).unwrap();
        assert!(r.pvalue < 1e-100);
        assert_eq!(r.statistic, f64::INFINITY);
    }

    #[test]
    fn test_fisher_exact_rejects_huge_counts() {
        let table = vec![vec![1e19, 1.0], vec![1.0, 1e19]];
        assert!(matches!(fisher_exact(&table, Alternative::TwoSided), Err(StatsError::InvalidInput(_))));
        let table = vec![vec![MAX_EXACT_COUNT, MAX_EXACT_COUNT], vec![1.0, 1.0]];
        assert!(fisher_exact(&table, Alternative::Less).is_ok());
    }
}

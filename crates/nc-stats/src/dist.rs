//! Thin wrappers over `statrs` distributions.
//!
//! Invalid parameters (e.g. zero degrees of freedom) yield NaN instead of an error:
//! callers validate sample sizes up front, and a NaN p-value on a degenerate input
//! is what scipy reports too.

use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, Normal, StudentsT};

#[inline]
pub(crate) fn normal_cdf(z: f64) -> f64 {
    Normal::new(0.0, 1.0).map(|d| d.cdf(z)).unwrap_or(f64::NAN)
}

#[inline]
pub(crate) fn normal_sf(z: f64) -> f64 {
    Normal::new(0.0, 1.0).map(|d| d.sf(z)).unwrap_or(f64::NAN)
}

#[inline]
pub(crate) fn normal_ppf(p: f64) -> f64 {
    Normal::new(0.0, 1.0).map(|d| d.inverse_cdf(p)).unwrap_or(f64::NAN)
}

#[inline]
pub(crate) fn t_cdf(t: f64, df: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    StudentsT::new(0.0, 1.0, df).map(|d| d.cdf(t)).unwrap_or(f64::NAN)
}

#[inline]
pub(crate) fn t_sf(t: f64, df: f64) -> f64 {
    if t.is_nan() {
        return f64::NAN;
    }
    StudentsT::new(0.0, 1.0, df).map(|d| d.sf(t)).unwrap_or(f64::NAN)
}

#[inline]
pub(crate) fn chi2_sf(x: f64, df: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return 0.0;
    }
    ChiSquared::new(df).map(|d| d.sf(x)).unwrap_or(f64::NAN)
}

#[inline]
pub(crate) fn f_sf(x: f64, df1: f64, df2: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x == f64::INFINITY {
        return 0.0;
    }
    FisherSnedecor::new(df1, df2).map(|d| d.sf(x)).unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_reference_tail_values() {
        assert_abs_diff_eq!(normal_sf(1.959964), 0.025, epsilon = 1e-6);
        assert_abs_diff_eq!(normal_ppf(0.975), 1.959964, epsilon = 1e-5);
        // scipy.stats.t.sf(2.0, 10)
        assert_abs_diff_eq!(t_sf(2.0, 10.0), 0.036694017385370196, epsilon = 1e-9);
        // scipy.stats.chi2.sf(3.84, 1)
        assert_abs_diff_eq!(chi2_sf(3.841458820694124, 1.0), 0.05, epsilon = 1e-9);
        assert_eq!(chi2_sf(f64::INFINITY, 3.0), 0.0);
    }

    #[test]
    fn test_invalid_parameters_are_nan() {
        assert!(t_sf(1.0, 0.0).is_nan());
        assert!(f_sf(1.0, 0.0, 3.0).is_nan());
    }
}

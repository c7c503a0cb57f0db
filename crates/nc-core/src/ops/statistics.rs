//! The `statistics` service: scipy.stats-style descriptive statistics, normality
//! tests, hypothesis tests, correlation, contingency tests and regression.
//!
//! Two-sample, multi-sample, table and x/y calculations are registered with their
//! adapted [`Operation`] variant; everything else takes the flat array.

use nc_stats::hypothesis::{self, Center};
use nc_stats::{Alternative, StatsError, contingency, correlation, descriptive, normality, regression};

use crate::params::Params;
use crate::registry::{Operation, Registry};
use crate::result::RawResult;

type OpResult = nc_stats::Result<RawResult>;

/// Allow-list of the statistics service.
pub static STATISTICS: Registry = Registry::new(
    "statistics",
    &[
        ("skew", Operation::Flat(skew)),
        ("kurtosis", Operation::Flat(kurtosis)),
        ("mode", Operation::Flat(mode)),
        ("zscore", Operation::Flat(zscore)),
        ("describe", Operation::Flat(describe)),
        ("normaltest", Operation::Flat(normaltest)),
        ("shapiro", Operation::Flat(shapiro)),
        ("anderson", Operation::Flat(anderson)),
        ("ttest_1samp", Operation::Flat(ttest_1samp)),
        ("ttest_ind", Operation::TwoSample(ttest_ind)),
        ("f_oneway", Operation::MultiSample(f_oneway)),
        ("levene", Operation::Flat(levene)),
        ("mannwhitneyu", Operation::TwoSample(mannwhitneyu)),
        ("kruskal", Operation::MultiSample(kruskal)),
        ("wilcoxon", Operation::Flat(wilcoxon)),
        ("pearsonr", Operation::TwoSample(pearsonr)),
        ("spearmanr", Operation::TwoSample(spearmanr)),
        ("chi2_contingency", Operation::Contingency(chi2_contingency)),
        ("fisher_exact", Operation::Contingency(fisher_exact)),
        ("linregress", Operation::XyPair(linregress)),
        ("ks_2samp", Operation::TwoSample(ks_2samp)),
    ],
);

fn alternative(params: &Params) -> nc_stats::Result<Alternative> {
    params.parse_or("alternative", Alternative::TwoSided)
}

// ---------------------------------------------------------------------------
// Flat array
// ---------------------------------------------------------------------------

fn skew(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["bias"])?;
    Ok(descriptive::skew(x, params.bool_or("bias", true)?)?.into())
}

fn kurtosis(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["fisher", "bias"])?;
    let fisher = params.bool_or("fisher", true)?;
    Ok(descriptive::kurtosis(x, fisher, params.bool_or("bias", true)?)?.into())
}

fn mode(x: &[f64], params: &Params) -> OpResult {
    params.accept(&[])?;
    Ok(descriptive::mode(x)?.into())
}

fn zscore(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["ddof"])?;
    Ok(descriptive::zscore(x, params.f64_or("ddof", 0.0)?)?.into())
}

fn describe(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["ddof", "bias"])?;
    let ddof = params.f64_or("ddof", 1.0)?;
    Ok(descriptive::describe(x, ddof, params.bool_or("bias", true)?)?.into())
}

fn normaltest(x: &[f64], params: &Params) -> OpResult {
    params.accept(&[])?;
    Ok(normality::normaltest(x)?.into())
}

fn shapiro(x: &[f64], params: &Params) -> OpResult {
    params.accept(&[])?;
    Ok(normality::shapiro(x)?.into())
}

fn anderson(x: &[f64], params: &Params) -> OpResult {
    params.accept(&[])?;
    Ok(normality::anderson(x)?.into())
}

fn ttest_1samp(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["popmean", "alternative"])?;
    let popmean = params.f64_required("popmean")?;
    Ok(hypothesis::ttest_1samp(x, popmean, alternative(params)?)?.into())
}

// Registered with a flat array, i.e. one sample, so every call fails.
fn levene(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["center"])?;
    let center = params.parse_or("center", Center::Median)?;
    hypothesis::levene(&[x], center).map(Into::into).map_err(|_| {
        StatsError::invalid(
            "levene requires at least two samples, but its input is a single flat array \
             (one sample), so this calculation always fails",
        )
    })
}

fn wilcoxon(x: &[f64], params: &Params) -> OpResult {
    params.accept(&["alternative", "correction"])?;
    let correction = params.bool_or("correction", false)?;
    Ok(hypothesis::wilcoxon(x, correction, alternative(params)?)?.into())
}

// ---------------------------------------------------------------------------
// Two named arrays
// ---------------------------------------------------------------------------

fn ttest_ind(a: &[f64], b: &[f64], params: &Params) -> OpResult {
    params.accept(&["equal_var", "alternative"])?;
    let equal_var = params.bool_or("equal_var", true)?;
    Ok(hypothesis::ttest_ind(a, b, equal_var, alternative(params)?)?.into())
}

fn mannwhitneyu(a: &[f64], b: &[f64], params: &Params) -> OpResult {
    params.accept(&["use_continuity", "alternative"])?;
    let use_continuity = params.bool_or("use_continuity", true)?;
    Ok(hypothesis::mannwhitneyu(a, b, use_continuity, alternative(params)?)?.into())
}

fn ks_2samp(a: &[f64], b: &[f64], params: &Params) -> OpResult {
    params.accept(&["alternative"])?;
    Ok(hypothesis::ks_2samp(a, b, alternative(params)?)?.into())
}

fn pearsonr(a: &[f64], b: &[f64], params: &Params) -> OpResult {
    params.accept(&["alternative"])?;
    Ok(correlation::pearsonr(a, b, alternative(params)?)?.into())
}

fn spearmanr(a: &[f64], b: &[f64], params: &Params) -> OpResult {
    params.accept(&["alternative"])?;
    Ok(correlation::spearmanr(a, b, alternative(params)?)?.into())
}

// ---------------------------------------------------------------------------
// Samples, tables, x/y
// ---------------------------------------------------------------------------

fn f_oneway(samples: &[&[f64]], params: &Params) -> OpResult {
    params.accept(&[])?;
    Ok(hypothesis::f_oneway(samples)?.into())
}

fn kruskal(samples: &[&[f64]], params: &Params) -> OpResult {
    params.accept(&[])?;
    Ok(hypothesis::kruskal(samples)?.into())
}

fn chi2_contingency(table: &[Vec<f64>], params: &Params) -> OpResult {
    params.accept(&["correction"])?;
    Ok(contingency::chi2_contingency(table, params.bool_or("correction", true)?)?.into())
}

fn fisher_exact(table: &[Vec<f64>], params: &Params) -> OpResult {
    params.accept(&["alternative"])?;
    Ok(contingency::fisher_exact(table, alternative(params)?)?.into())
}

fn linregress(x: &[f64], y: &[f64], params: &Params) -> OpResult {
    params.accept(&[])?;
    Ok(regression::linregress(x, y)?.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ShapeCategory;

    #[test]
    fn test_categories() {
        assert_eq!(STATISTICS.len(), 21);
        let shape = |n: &str| STATISTICS.resolve(n).unwrap().shape();
        for n in ["ttest_ind", "mannwhitneyu", "ks_2samp", "pearsonr", "spearmanr"] {
            assert_eq!(shape(n), ShapeCategory::TwoNamedArrays, "{n}");
        }
        assert_eq!(shape("f_oneway"), ShapeCategory::NNamedSamples);
        assert_eq!(shape("kruskal"), ShapeCategory::NNamedSamples);
        assert_eq!(shape("chi2_contingency"), ShapeCategory::ContingencyTable);
        assert_eq!(shape("fisher_exact"), ShapeCategory::ContingencyTable);
        assert_eq!(shape("linregress"), ShapeCategory::XyPair);
        assert_eq!(shape("levene"), ShapeCategory::FlatArray);
        assert_eq!(shape("describe"), ShapeCategory::FlatArray);
    }

    #[test]
    fn test_levene_on_single_sample_fails() {
        let err = levene(&[1.0, 2.0, 3.0], &Params::new()).unwrap_err();
        assert!(err.to_string().contains("at least two samples"), "{err}");
    }

    #[test]
    fn test_alternative_is_parsed() {
        let params = Params::new().with("alternative", "sideways");
        assert!(ttest_ind(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &params).is_err());
        let params = Params::new().with("alternative", "less");
        let RawResult::Record(fields) = ttest_ind(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &params).unwrap()
        else {
            panic!("expected a record")
        };
        let RawResult::Float(p) = &fields[1].1 else { panic!("expected a float pvalue") };
        assert!(*p < 0.05);
    }
}

//! Raw calculation results and their normalization to JSON.
//!
//! Every operation returns a [`RawResult`]. [`normalize`] is the single exit point
//! towards callers: floats are rounded to two decimals, non-finite floats become
//! `null`, integers and text pass through, and records keep their field order.

use nc_stats::contingency::ContingencyResult;
use nc_stats::descriptive::{DescribeResult, ModeResult};
use nc_stats::hypothesis::TTestResult;
use nc_stats::normality::AndersonResult;
use nc_stats::regression::LinregressResult;
use nc_stats::TestResult;
use serde_json::{Map, Number, Value};

/// Decimal places kept by [`normalize`].
pub const DECIMALS: usize = 2;

/// Result of a numeric operation before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawResult {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    Array(Vec<f64>),
    Matrix(Vec<Vec<f64>>),
    Tuple(Vec<RawResult>),
    /// Named fields in declaration order.
    Record(Vec<(&'static str, RawResult)>),
    Map(Vec<(String, RawResult)>),
}

/// Convert a raw result into a JSON-safe value with floats rounded to 2 decimals.
pub fn normalize(raw: &RawResult) -> Value {
    match raw {
        RawResult::Float(x) => float(*x),
        RawResult::Int(i) => Value::from(*i),
        RawResult::Bool(b) => Value::Bool(*b),
        RawResult::Text(s) => Value::String(s.clone()),
        RawResult::Array(xs) => Value::Array(xs.iter().map(|&x| float(x)).collect()),
        RawResult::Matrix(rows) => Value::Array(
            rows.iter().map(|r| Value::Array(r.iter().map(|&x| float(x)).collect())).collect(),
        ),
        RawResult::Tuple(items) => Value::Array(items.iter().map(normalize).collect()),
        RawResult::Record(fields) => Value::Object(
            fields.iter().map(|(k, v)| ((*k).to_string(), normalize(v))).collect::<Map<_, _>>(),
        ),
        RawResult::Map(entries) => {
            Value::Object(entries.iter().map(|(k, v)| (k.clone(), normalize(v))).collect())
        }
    }
}

/// Round to [`DECIMALS`] places on the exact binary value, as Python's `round(x, 2)`.
///
/// Fixed-precision formatting is correctly rounded and never scales `x`, so values
/// near `f64::MAX` stay finite.
pub fn round2(x: f64) -> f64 {
    if !x.is_finite() {
        return x;
    }
    let rounded: f64 = format!("{:.*}", DECIMALS, x).parse().unwrap_or(x);
    // keep "-0.00" from leaking a negative zero into JSON
    if rounded == 0.0 { 0.0 } else { rounded }
}

fn float(x: f64) -> Value {
    Number::from_f64(round2(x)).map_or(Value::Null, Value::Number)
}

// ---------------------------------------------------------------------------
// Conversions from library result types
// ---------------------------------------------------------------------------

impl From<f64> for RawResult {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<Vec<f64>> for RawResult {
    fn from(xs: Vec<f64>) -> Self {
        Self::Array(xs)
    }
}

impl From<usize> for RawResult {
    fn from(n: usize) -> Self {
        Self::Int(i64::try_from(n).unwrap_or(i64::MAX))
    }
}

impl From<TestResult> for RawResult {
    fn from(r: TestResult) -> Self {
        Self::Record(vec![("statistic", r.statistic.into()), ("pvalue", r.pvalue.into())])
    }
}

impl From<TTestResult> for RawResult {
    fn from(r: TTestResult) -> Self {
        Self::Record(vec![
            ("statistic", r.statistic.into()),
            ("pvalue", r.pvalue.into()),
            ("df", r.df.into()),
        ])
    }
}

impl From<ModeResult> for RawResult {
    fn from(r: ModeResult) -> Self {
        Self::Record(vec![("mode", r.mode.into()), ("count", r.count.into())])
    }
}

impl From<DescribeResult> for RawResult {
    fn from(r: DescribeResult) -> Self {
        Self::Record(vec![
            ("nobs", r.nobs.into()),
            ("minmax", Self::Tuple(vec![r.minmax.0.into(), r.minmax.1.into()])),
            ("mean", r.mean.into()),
            ("variance", r.variance.into()),
            ("skewness", r.skewness.into()),
            ("kurtosis", r.kurtosis.into()),
        ])
    }
}

impl From<AndersonResult> for RawResult {
    fn from(r: AndersonResult) -> Self {
        Self::Record(vec![
            ("statistic", r.statistic.into()),
            ("critical_values", r.critical_values.into()),
            ("significance_level", r.significance_level.into()),
        ])
    }
}

impl From<ContingencyResult> for RawResult {
    fn from(r: ContingencyResult) -> Self {
        Self::Record(vec![
            ("statistic", r.statistic.into()),
            ("pvalue", r.pvalue.into()),
            ("dof", r.dof.into()),
            ("expected_freq", Self::Matrix(r.expected_freq)),
        ])
    }
}

impl From<LinregressResult> for RawResult {
    fn from(r: LinregressResult) -> Self {
        Self::Record(vec![
            ("slope", r.slope.into()),
            ("intercept", r.intercept.into()),
            ("rvalue", r.rvalue.into()),
            ("pvalue", r.pvalue.into()),
            ("stderr", r.stderr.into()),
            ("intercept_stderr", r.intercept_stderr.into()),
        ])
    }
}

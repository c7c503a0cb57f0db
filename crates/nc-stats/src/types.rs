//! Result and option types shared by several test families.

use std::str::FromStr;

use crate::StatsError;

/// Alternative hypothesis for one- and two-sample tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Alternative {
    #[default]
    TwoSided,
    Less,
    Greater,
}

impl Alternative {
    /// Combine lower- and upper-tail probabilities of a statistic into a p-value.
    pub(crate) fn p_value(self, cdf: f64, sf: f64) -> f64 {
        match self {
            Self::TwoSided => (2.0 * cdf.min(sf)).min(1.0),
            Self::Less => cdf,
            Self::Greater => sf,
        }
    }
}

impl FromStr for Alternative {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "two-sided" => Ok(Self::TwoSided),
            "less" => Ok(Self::Less),
            "greater" => Ok(Self::Greater),
            other => Err(StatsError::argument(
                "alternative",
                format!("expected 'two-sided', 'less' or 'greater', got '{other}'"),
            )),
        }
    }
}

/// Statistic and p-value of a hypothesis test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult {
    pub statistic: f64,
    pub pvalue: f64,
}

impl TestResult {
    pub fn new(statistic: f64, pvalue: f64) -> Self {
        Self { statistic, pvalue }
    }
}

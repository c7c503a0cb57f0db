//! Calculation registries.
//!
//! A registry is a static allow-list of `(name, Operation)` pairs. The operation
//! variant fixes the calculation's input shape, so the category of a name is known
//! at build time and never guessed from the payload.

use std::fmt;

use serde::Serialize;

use crate::params::Params;
use crate::result::RawResult;
use crate::{Error, Result};

type OpResult = nc_stats::Result<RawResult>;

/// Input shape a calculation expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ShapeCategory {
    /// A flat list of numbers.
    FlatArray,
    /// Fields `a` and `b`.
    TwoNamedArrays,
    /// Fields `sample_0` .. `sample_{k-1}`.
    NNamedSamples,
    /// Field `table`, a list of rows.
    ContingencyTable,
    /// Fields `x` and `y`.
    #[serde(rename = "x-y-pair")]
    XyPair,
}

impl ShapeCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FlatArray => "flat-array",
            Self::TwoNamedArrays => "two-named-arrays",
            Self::NNamedSamples => "n-named-samples",
            Self::ContingencyTable => "contingency-table",
            Self::XyPair => "x-y-pair",
        }
    }
}

impl fmt::Display for ShapeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered numeric operation, tagged by the arguments it takes.
#[derive(Clone, Copy)]
pub enum Operation {
    Flat(fn(&[f64], &Params) -> OpResult),
    TwoSample(fn(&[f64], &[f64], &Params) -> OpResult),
    MultiSample(fn(&[&[f64]], &Params) -> OpResult),
    Contingency(fn(&[Vec<f64>], &Params) -> OpResult),
    XyPair(fn(&[f64], &[f64], &Params) -> OpResult),
}

impl Operation {
    pub fn shape(&self) -> ShapeCategory {
        match self {
            Self::Flat(_) => ShapeCategory::FlatArray,
            Self::TwoSample(_) => ShapeCategory::TwoNamedArrays,
            Self::MultiSample(_) => ShapeCategory::NNamedSamples,
            Self::Contingency(_) => ShapeCategory::ContingencyTable,
            Self::XyPair(_) => ShapeCategory::XyPair,
        }
    }

    /// Whether the operation needs the special-case input adapter.
    pub fn is_special(&self) -> bool {
        !matches!(self, Self::Flat(_))
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation({})", self.shape())
    }
}

/// Immutable name → operation table for one service.
#[derive(Debug)]
pub struct Registry {
    service: &'static str,
    entries: &'static [(&'static str, Operation)],
}

impl Registry {
    pub const fn new(service: &'static str, entries: &'static [(&'static str, Operation)]) -> Self {
        Self { service, entries }
    }

    pub fn service(&self) -> &'static str {
        self.service
    }

    /// Look up `name`; unknown names list the allowed ones.
    pub fn resolve(&self, name: &str) -> Result<&Operation> {
        self.entries.iter().find(|(n, _)| *n == name).map(|(_, op)| op).ok_or_else(|| {
            Error::UnknownCalculation {
                service: self.service.to_string(),
                name: name.to_string(),
                allowed: self.names().into_iter().map(str::to_string).collect(),
            }
        })
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names
    }

    /// `(name, category)` pairs sorted by name.
    pub fn catalog(&self) -> Vec<(&'static str, ShapeCategory)> {
        let mut items: Vec<_> = self.entries.iter().map(|(n, op)| (*n, op.shape())).collect();
        items.sort_unstable_by_key(|(n, _)| *n);
        items
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(x: &[f64], _: &Params) -> OpResult {
        Ok(RawResult::Float(x[0]))
    }

    fn pair(_: &[f64], _: &[f64], _: &Params) -> OpResult {
        Ok(RawResult::Bool(true))
    }

    static TINY: Registry = Registry::new(
        "tiny",
        &[("zeta", Operation::Flat(first)), ("alpha", Operation::TwoSample(pair))],
    );

    #[test]
    fn test_resolve_and_names() {
        assert_eq!(TINY.resolve("zeta").unwrap().shape(), ShapeCategory::FlatArray);
        assert!(TINY.resolve("alpha").unwrap().is_special());
        assert_eq!(TINY.names(), ["alpha", "zeta"]);

        let err = TINY.resolve("beta").unwrap_err();
        assert_eq!(err.to_string(), "unknown calculation 'beta' for service 'tiny'. Allowed calculations: alpha, zeta");
    }

    #[test]
    fn test_category_wire_names() {
        assert_eq!(ShapeCategory::NNamedSamples.to_string(), "n-named-samples");
        assert_eq!(
            serde_json::to_value(ShapeCategory::XyPair).unwrap(),
            serde_json::json!("x-y-pair")
        );
    }
}

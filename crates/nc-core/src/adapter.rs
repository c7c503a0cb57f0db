//! Special-case input adapter.
//!
//! Calculations that take more than one array read their inputs from named fields
//! of a mapping payload:
//!
//! | category | fields |
//! |---|---|
//! | two-named-arrays | `a`, `b` |
//! | n-named-samples | `sample_0` .. `sample_{k-1}`, k = number of keys |
//! | contingency-table | `table` (list of rows) |
//! | x-y-pair | `x`, `y` |

use std::collections::BTreeMap;

use crate::params::Params;
use crate::payload::{Field, Payload};
use crate::registry::Operation;
use crate::result::RawResult;
use crate::{Error, Result};

/// Failure modes of an adapted call, kept apart so the dispatcher can tag library
/// errors with the calculation name.
#[derive(Debug)]
pub enum AdaptError {
    Shape(Error),
    Library(nc_stats::StatsError),
}

impl From<nc_stats::StatsError> for AdaptError {
    fn from(e: nc_stats::StatsError) -> Self {
        Self::Library(e)
    }
}

impl From<Error> for AdaptError {
    fn from(e: Error) -> Self {
        Self::Shape(e)
    }
}

/// Extract the fields `op` needs from `payload` and invoke it.
pub fn invoke(
    calculation: &str,
    op: &Operation,
    payload: &Payload,
    params: &Params,
) -> std::result::Result<RawResult, AdaptError> {
    let Payload::Fields(fields) = payload else {
        return Err(Error::shape(
            calculation,
            format!(
                "'{calculation}' expects a mapping with fields {}, got a flat list",
                expected_fields(op)
            ),
        )
        .into());
    };
    let fields = Fields { calculation, map: fields };

    let raw = match op {
        Operation::TwoSample(f) => f(fields.series("a")?, fields.series("b")?, params)?,
        Operation::XyPair(f) => f(fields.series("x")?, fields.series("y")?, params)?,
        Operation::Contingency(f) => f(fields.table("table")?, params)?,
        Operation::MultiSample(f) => {
            let samples = (0..fields.map.len())
                .map(|i| fields.series(&format!("sample_{i}")))
                .collect::<Result<Vec<_>>>()?;
            f(&samples, params)?
        }
        Operation::Flat(_) => {
            return Err(Error::Internal(format!(
                "'{calculation}' takes a flat array and has no special-case adapter"
            ))
            .into());
        }
    };
    Ok(raw)
}

fn expected_fields(op: &Operation) -> &'static str {
    match op {
        Operation::TwoSample(_) => "'a' and 'b'",
        Operation::XyPair(_) => "'x' and 'y'",
        Operation::Contingency(_) => "'table'",
        Operation::MultiSample(_) => "'sample_0', 'sample_1', ...",
        Operation::Flat(_) => "none",
    }
}

struct Fields<'a> {
    calculation: &'a str,
    map: &'a BTreeMap<String, Field>,
}

impl<'a> Fields<'a> {
    fn get(&self, name: &str) -> Result<&'a Field> {
        self.map.get(name).ok_or_else(|| {
            Error::shape(self.calculation, format!("'{}' requires field '{name}'", self.calculation))
        })
    }

    fn series(&self, name: &str) -> Result<&'a [f64]> {
        match self.get(name)? {
            Field::Series(v) => Ok(v),
            Field::Table(_) => Err(Error::shape(
                self.calculation,
                format!("field '{name}' must be a list of numbers, got a list of rows"),
            )),
        }
    }

    fn table(&self, name: &str) -> Result<&'a [Vec<f64>]> {
        match self.get(name)? {
            Field::Table(rows) => {
                let width = rows.first().map_or(0, Vec::len);
                if rows.is_empty() || width == 0 {
                    return Err(Error::shape(
                        self.calculation,
                        format!("field '{name}' must be a non-empty table"),
                    ));
                }
                if let Some(i) = rows.iter().position(|r| r.len() != width) {
                    return Err(Error::shape(
                        self.calculation,
                        format!(
                            "field '{name}' is ragged: row {i} has {} values, row 0 has {width}",
                            rows[i].len()
                        ),
                    ));
                }
                Ok(rows)
            }
            Field::Series(v) if v.is_empty() => Err(Error::shape(
                self.calculation,
                format!("field '{name}' must be a non-empty table"),
            )),
            Field::Series(_) => Err(Error::shape(
                self.calculation,
                format!("field '{name}' must be a table (a list of rows), got a flat list"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::STATISTICS;
    use crate::payload::validate;
    use serde_json::json;

    fn call(name: &str, data: serde_json::Value) -> std::result::Result<RawResult, AdaptError> {
        let op = STATISTICS.resolve(name).unwrap();
        invoke(name, op, &validate(&data).unwrap(), &Params::new())
    }

    fn shape_message(r: std::result::Result<RawResult, AdaptError>) -> String {
        match r {
            Err(AdaptError::Shape(e)) => {
                assert_eq!(e.kind(), "InputShapeError");
                e.to_string()
            }
            other => panic!("expected a shape error, got {other:?}"),
        }
    }

    #[test]
    fn test_two_named_arrays() {
        assert!(call("pearsonr", json!({"a": [1, 2, 3], "b": [2, 4, 7]})).is_ok());
        let msg = shape_message(call("pearsonr", json!({"a": [1, 2, 3]})));
        assert!(msg.contains("'b'"), "{msg}");
    }

    #[test]
    fn test_flat_payload_rejected() {
        let msg = shape_message(call("linregress", json!([1, 2, 3])));
        assert!(msg.contains("'x' and 'y'"), "{msg}");
    }

    #[test]
    fn test_named_samples_follow_key_count() {
        let ok = call("f_oneway", json!({"sample_0": [1, 2, 3], "sample_1": [4, 5, 6], "sample_2": [7, 8, 9.5]}));
        assert!(ok.is_ok());
        let msg = shape_message(call("kruskal", json!({"sample_0": [1, 2], "other": [3, 4]})));
        assert!(msg.contains("sample_1"), "{msg}");
    }

    #[test]
    fn test_table_checks() {
        assert!(call("chi2_contingency", json!({"table": [[10, 20], [30, 40]]})).is_ok());
        let msg = shape_message(call("chi2_contingency", json!({"table": [1, 2, 3]})));
        assert!(msg.contains("table"), "{msg}");
        let msg = shape_message(call("fisher_exact", json!({"table": [[1, 2], [3]]})));
        assert!(msg.contains("ragged"), "{msg}");
        let msg = shape_message(call("ttest_ind", json!({"a": [[1, 2]], "b": [1, 2]})));
        assert!(msg.contains("'a'"), "{msg}");
    }

    #[test]
    fn test_library_errors_pass_through() {
        let r = call("linregress", json!({"x": [1, 1, 1], "y": [1, 2, 3]}));
        assert!(matches!(r, Err(AdaptError::Library(_))));
    }
}

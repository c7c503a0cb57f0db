//! Input validation.
//!
//! A request's `data` is either a flat sequence of numbers or a mapping from field
//! name to a sequence. Mapping values may also be tables (sequences of numeric rows)
//! for the contingency calculations. Every sequence is bounded in length and every
//! number in magnitude before anything reaches the numeric library.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::{Error, Result};

/// Maximum number of elements in any single sequence.
pub const MAX_ELEMENTS: usize = 10_000;

/// Largest accepted magnitude of a single number.
pub const MAX_ABS_VALUE: f64 = 1e308;

/// One named value of a mapping payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Series(Vec<f64>),
    Table(Vec<Vec<f64>>),
}

/// Validated request data.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Flat(Vec<f64>),
    Fields(BTreeMap<String, Field>),
}

impl Payload {
    /// Total number of numbers carried, used for working-memory estimates.
    pub fn element_count(&self) -> usize {
        match self {
            Self::Flat(v) => v.len(),
            Self::Fields(fields) => fields
                .values()
                .map(|f| match f {
                    Field::Series(v) => v.len(),
                    Field::Table(rows) => rows.iter().map(Vec::len).sum(),
                })
                .sum(),
        }
    }
}

/// Check a raw JSON payload and convert it into a [`Payload`].
pub fn validate(data: &Value) -> Result<Payload> {
    match data {
        Value::Array(items) => {
            let values = numbers(items, "data")?;
            Ok(Payload::Flat(values))
        }
        Value::Object(map) => {
            let mut fields = BTreeMap::new();
            for (key, value) in map {
                let Value::Array(items) = value else {
                    return Err(Error::Validation(format!(
                        "value for key '{key}' must be a list of numbers"
                    )));
                };
                fields.insert(key.clone(), field(items, key)?);
            }
            Ok(Payload::Fields(fields))
        }
        _ => Err(Error::Validation(
            "data must be a list of numbers or a mapping of names to lists of numbers".into(),
        )),
    }
}

fn field(items: &[Value], key: &str) -> Result<Field> {
    check_len(items.len(), &format!("key '{key}'"))?;
    if !items.iter().any(Value::is_array) {
        return numbers(items, &format!("key '{key}'")).map(Field::Series);
    }
    let mut table = Vec::with_capacity(items.len());
    for (i, row) in items.iter().enumerate() {
        let Value::Array(cells) = row else {
            return Err(Error::Validation(format!(
                "key '{key}' mixes numbers and lists; use either a list of numbers or a list of rows"
            )));
        };
        table.push(numbers(cells, &format!("key '{key}' row {i}"))?);
    }
    Ok(Field::Table(table))
}

fn check_len(len: usize, context: &str) -> Result<()> {
    if len > MAX_ELEMENTS {
        return Err(Error::Validation(format!(
            "{context}: input exceeds maximum length of {MAX_ELEMENTS} elements (got {len})"
        )));
    }
    Ok(())
}

fn numbers(items: &[Value], context: &str) -> Result<Vec<f64>> {
    check_len(items.len(), context)?;
    items
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let Some(x) = v.as_f64() else {
                return Err(Error::Validation(format!(
                    "{context}: element {i} is not a number (got {})",
                    type_name(v)
                )));
            };
            if !x.is_finite() || x.abs() > MAX_ABS_VALUE {
                return Err(Error::Validation(format!(
                    "{context}: element {i} exceeds the maximum magnitude of 1e308"
                )));
            }
            Ok(x)
        })
        .collect()
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_payload() {
        assert_eq!(validate(&json!([1, 2.5, -3])).unwrap(), Payload::Flat(vec![1.0, 2.5, -3.0]));
        assert_eq!(validate(&json!([])).unwrap(), Payload::Flat(vec![]));
    }

    #[test]
    fn test_rejects_non_numeric() {
        for bad in [json!([1, "2"]), json!([true, 1]), json!([null]), json!([[1, 2]])] {
            let err = validate(&bad).unwrap_err();
            assert_eq!(err.kind(), "ValidationError", "{bad}");
        }
        let msg = validate(&json!([1, "x"])).unwrap_err().to_string();
        assert!(msg.contains("element 1"), "{msg}");
    }

    #[test]
    fn test_rejects_scalars() {
        for bad in [json!(5), json!("abc"), json!(null), json!(true)] {
            assert!(validate(&bad).is_err());
        }
    }

    #[test]
    fn test_mapping_payload() {
        let p = validate(&json!({"a": [1, 2], "table": [[1, 2], [3, 4]]})).unwrap();
        let Payload::Fields(fields) = p else { panic!("expected fields") };
        assert_eq!(fields["a"], Field::Series(vec![1.0, 2.0]));
        assert_eq!(fields["table"], Field::Table(vec![vec![1.0, 2.0], vec![3.0, 4.0]]));
    }

    #[test]
    fn test_mapping_errors_name_the_key() {
        let msg = validate(&json!({"a": [1, 2], "b": 3})).unwrap_err().to_string();
        assert!(msg.contains("'b'"), "{msg}");

        let msg = validate(&json!({"a": [1, [2]]})).unwrap_err().to_string();
        assert!(msg.contains("'a'") && msg.contains("mixes"), "{msg}");

        let msg = validate(&json!({"t": [[1, 2], [3, "x"]]})).unwrap_err().to_string();
        assert!(msg.contains("row 1") && msg.contains("element 1"), "{msg}");
    }

    #[test]
    fn test_length_boundary() {
        let ok = Value::Array(vec![json!(1.0); MAX_ELEMENTS]);
        assert!(validate(&ok).is_ok());
        let too_long = Value::Array(vec![json!(1.0); MAX_ELEMENTS + 1]);
        assert!(validate(&too_long).unwrap_err().to_string().contains("maximum length"));

        let mut map = serde_json::Map::new();
        map.insert("a".into(), Value::Array(vec![json!(0); MAX_ELEMENTS + 1]));
        assert!(validate(&Value::Object(map)).is_err());
    }

    #[test]
    fn test_magnitude_boundary() {
        assert!(validate(&json!([1e308, -1e308])).is_ok());
        assert!(validate(&json!([1.1e308])).is_err());
        assert!(validate(&json!([-1.1e308])).is_err());
        assert!(validate(&json!({"x": [[1.1e308]]})).is_err());
    }

    #[test]
    fn test_element_count() {
        let p = validate(&json!({"a": [1, 2, 3], "t": [[1, 2], [3, 4]]})).unwrap();
        assert_eq!(p.element_count(), 7);
    }
}

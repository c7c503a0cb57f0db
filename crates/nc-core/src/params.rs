//! Named calculation parameters.
//!
//! Params travel as a JSON object of scalars and are read by the operation glue with
//! typed getters. Each operation first declares the names it accepts, so a misspelt
//! or foreign name fails loudly instead of being ignored.

use std::str::FromStr;

use nc_stats::StatsError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

type StatsResult<T> = nc_stats::Result<T>;

/// Named arguments forwarded to a calculation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and benches.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.0.insert(name.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject any name outside `accepted`.
    pub fn accept(&self, accepted: &[&str]) -> StatsResult<()> {
        if let Some(name) = self.0.keys().find(|k| !accepted.contains(&k.as_str())) {
            let reason = if accepted.is_empty() {
                "unexpected keyword argument; this calculation takes no parameters".to_string()
            } else {
                format!("unexpected keyword argument; accepted: {}", accepted.join(", "))
            };
            return Err(StatsError::argument(name, reason));
        }
        Ok(())
    }

    pub fn f64_or(&self, name: &str, default: f64) -> StatsResult<f64> {
        Ok(self.f64_opt(name)?.unwrap_or(default))
    }

    pub fn f64_required(&self, name: &str) -> StatsResult<f64> {
        self.f64_opt(name)?
            .ok_or_else(|| StatsError::argument(name, "missing required argument"))
    }

    fn f64_opt(&self, name: &str) -> StatsResult<Option<f64>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_f64()
                .filter(|x| x.is_finite())
                .map(Some)
                .ok_or_else(|| StatsError::argument(name, format!("expected a number, got {v}"))),
        }
    }

    /// Non-negative integer; integral floats such as `2.0` are accepted.
    pub fn usize_or(&self, name: &str, default: usize) -> StatsResult<usize> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(v) => v
                .as_u64()
                .or_else(|| v.as_f64().filter(|x| *x >= 0.0 && x.fract() == 0.0).map(|x| x as u64))
                .and_then(|x| usize::try_from(x).ok())
                .ok_or_else(|| {
                    StatsError::argument(name, format!("expected a non-negative integer, got {v}"))
                }),
        }
    }

    pub fn i32_or(&self, name: &str, default: i32) -> StatsResult<i32> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(v) => v
                .as_i64()
                .or_else(|| v.as_f64().filter(|x| x.fract() == 0.0).map(|x| x as i64))
                .and_then(|x| i32::try_from(x).ok())
                .ok_or_else(|| StatsError::argument(name, format!("expected an integer, got {v}"))),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> StatsResult<bool> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(v) => Err(StatsError::argument(name, format!("expected a boolean, got {v}"))),
        }
    }

    /// String-valued option parsed with its `FromStr` impl.
    pub fn parse_or<T>(&self, name: &str, default: T) -> StatsResult<T>
    where
        T: FromStr<Err = StatsError>,
    {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(Value::String(s)) => s.parse(),
            Some(v) => Err(StatsError::argument(name, format!("expected a string, got {v}"))),
        }
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

//! Dispatch service.
//!
//! `perform` resolves the calculation in the service's registry, routes the payload
//! either straight to a flat-array operation or through the special-case adapter,
//! wraps library failures as [`Error::Calculation`] and normalizes the result.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapter::{self, AdaptError};
use crate::ops::{CALCULATOR, STATISTICS};
use crate::params::Params;
use crate::payload::Payload;
use crate::registry::{Operation, Registry};
use crate::result::normalize;
use crate::{Error, Result};

/// A named family of calculations backed by one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Calculator,
    Statistics,
}

impl Service {
    pub const ALL: [Service; 2] = [Service::Calculator, Service::Statistics];

    pub fn registry(self) -> &'static Registry {
        match self {
            Self::Calculator => &CALCULATOR,
            Self::Statistics => &STATISTICS,
        }
    }

    pub fn as_str(self) -> &'static str {
        self.registry().service()
    }

    /// Run `calculation` on a validated payload.
    pub fn perform(self, calculation: &str, payload: &Payload, params: &Params) -> Result<Value> {
        perform(self, calculation, payload, params)
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve, adapt, invoke and normalize one calculation.
pub fn perform(
    service: Service,
    calculation: &str,
    payload: &Payload,
    params: &Params,
) -> Result<Value> {
    let op = service.registry().resolve(calculation)?;
    tracing::debug!(
        service = %service,
        calculation,
        category = %op.shape(),
        elements = payload.element_count(),
        "dispatching calculation"
    );

    let raw = match op {
        Operation::Flat(f) => {
            let Payload::Flat(values) = payload else {
                return Err(Error::shape(
                    calculation,
                    format!("'{calculation}' expects a flat list of numbers, got a mapping"),
                ));
            };
            f(values, params).map_err(|e| library_error(service, calculation, e))?
        }
        _ => match adapter::invoke(calculation, op, payload, params) {
            Ok(raw) => raw,
            Err(AdaptError::Shape(e)) => return Err(e),
            Err(AdaptError::Library(e)) => return Err(library_error(service, calculation, e)),
        },
    };

    Ok(normalize(&raw))
}

fn library_error(service: Service, calculation: &str, err: nc_stats::StatsError) -> Error {
    tracing::debug!(service = %service, calculation, error = %err, "calculation failed");
    Error::Calculation { calculation: calculation.to_string(), message: err.to_string() }
}

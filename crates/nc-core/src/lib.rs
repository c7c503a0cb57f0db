//! # nc-core
//!
//! Calculation dispatch for NumCalc.
//!
//! A request names a [`Service`] (`calculator` or `statistics`), a calculation and a
//! data payload. The core:
//!
//! 1. validates the payload ([`payload::validate`]),
//! 2. resolves the calculation in the service's static allow-list ([`registry`]),
//! 3. feeds the numbers to the operation, directly for flat arrays or through the
//!    special-case [`adapter`] for named fields,
//! 4. normalizes the raw result into JSON with floats rounded to two decimals
//!    ([`result::normalize`]).
//!
//! Everything here is synchronous and stateless; callers may invoke it from any
//! thread. Numeric work is delegated to [`nc_stats`].

pub mod adapter;
pub mod error;
pub mod ops;
pub mod params;
pub mod payload;
pub mod registry;
pub mod result;
pub mod service;

pub use error::{Error, Result};
pub use params::Params;
pub use payload::{Field, Payload, validate};
pub use registry::{Operation, Registry, ShapeCategory};
pub use result::{RawResult, normalize};
pub use service::{Service, perform};

/// Crate version, reported by the server's health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Registered operations.
//!
//! Each module owns one service's allow-list plus the thin glue that reads params,
//! calls into [`nc_stats`] and converts the library result into a
//! [`RawResult`](crate::result::RawResult).

pub mod calculator;
pub mod statistics;

pub use calculator::CALCULATOR;
pub use statistics::STATISTICS;

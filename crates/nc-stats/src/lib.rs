//! # nc-stats
//!
//! Numeric and statistical routines used by the NumCalc calculation registries.
//!
//! Every routine follows the default semantics of the numpy / scipy.stats function
//! of the same name, so that results exposed by the calculation server match what a
//! caller would get from the reference Python stack (up to the 2-decimal rounding the
//! server applies). Probability distributions come from [`statrs`].
//!
//! ## Modules
//!
//! - [`descriptive`]: reductions, cumulative ops, percentiles, moments, `describe`
//! - [`elementwise`]: element-wise math with domain checking
//! - [`normality`]: D'Agostino–Pearson, Shapiro–Wilk, Anderson–Darling
//! - [`hypothesis`]: t-tests, ANOVA, Levene, rank tests, two-sample KS
//! - [`correlation`]: Pearson and Spearman correlation
//! - [`contingency`]: chi-squared contingency and Fisher's exact test
//! - [`regression`]: simple linear regression
//!
//! All fallible routines return [`Result`] with a [`StatsError`]; nothing panics on
//! user input.

pub mod contingency;
pub mod correlation;
pub mod descriptive;
mod dist;
pub mod elementwise;
pub mod error;
pub mod hypothesis;
pub mod normality;
pub mod rank;
pub mod regression;
pub mod types;

pub use error::{Result, StatsError};
pub use types::{Alternative, TestResult};

//! Output writers.
//!
//! - [`json`]: the per-article discovery report

pub mod json;

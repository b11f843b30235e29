//! # System Module
//!
//! Summary metrics over a hierarchy, used by the app layer for reporting.

mod metrics;

pub use metrics::*;

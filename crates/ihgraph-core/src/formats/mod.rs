//! # Formats
//!
//! The factory JSON format: the interchange schema used to build graphs
//! from external descriptions and to export flat graphs again.
//! File I/O lives in the app layer.

mod json;

pub use json::*;

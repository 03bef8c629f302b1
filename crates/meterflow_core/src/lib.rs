//! MeterFlow Core - Backend logic for MeterFlow
//!
//! This crate contains all business logic with zero UI dependencies.
//! It turns meter export row tables into styled spreadsheet reports:
//! a format registry of column layouts, a transform engine, an export
//! formatter and a batch controller that drives the pipeline over one
//! file or many.

pub mod batch;
pub mod config;
pub mod export;
pub mod formats;
pub mod logging;
pub mod models;
pub mod reader;
pub mod transform;
pub mod workers;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

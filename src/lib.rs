//! Survey quality-assurance reports.
//!
//! Reads an exposures table and a tiles table, derives per-night statistics
//! and writes static HTML pages with inline SVG plots.

pub mod astro;
pub mod cli;
pub mod color;
pub mod data;
pub mod error;
pub mod plot;
pub mod report;
pub mod stats;

pub use error::QaError;

//! Client library for Sippy component-readiness reports.
//!
//! Sippy's component-readiness API compares CI test pass rates between a
//! historical (base) release and a release under evaluation (sample), broken
//! down by environment dimensions (cloud, arch, network, upgrade, variant).
//! This crate owns the data-shaping layer in front of that API:
//!
//! - [`query`] turns typed filter state into the canonical query string the
//!   backend expects (fixed-boundary timestamps, comma-joined exclusions).
//! - [`dimensions`] classifies environment tokens into dimensions and expands
//!   environment labels into query fragments.
//! - [`client`] issues report requests with single-flight cancellation.
//! - [`report`] models the response payload and derives column labels,
//!   including the sentinel handling for empty and cancelled results.
//! - [`render`] formats reports as terminal tables.

pub mod cli;
pub mod client;
pub mod config;
pub mod dimensions;
pub mod error;
pub mod query;
pub mod render;
pub mod report;

pub use error::{Error, Result};

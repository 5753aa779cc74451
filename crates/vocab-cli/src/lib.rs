#![deny(unsafe_code)]

//! Command-line runner for terminology reconciliation.
//!
//! The binary reads a TOML run configuration, loads every table it names,
//! runs the matching pipeline and writes the result tables.

pub mod commands;
pub mod config;
pub mod logging;
pub mod pipeline;
pub mod types;

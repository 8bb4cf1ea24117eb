//! Tally CLI library.
//!
//! This crate provides the command-line interface over `tally-core`: range
//! selection, configuration, and table or JSON rendering of the views.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands, QueryArgs, RangeArgs, ReportBy};
pub use config::Config;

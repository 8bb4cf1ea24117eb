//! CLI subcommand implementations.

pub mod format;
pub mod report;
pub mod rollup;
pub mod slices;
pub mod status;
pub mod util;

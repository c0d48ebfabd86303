//! Command line interface for running filter trees over JSON document sets.

pub mod args;
pub mod commands;
pub mod output;

pub use args::*;
pub use commands::*;
pub use output::*;

//! Library interface for the sieve CLI

pub mod check;
pub mod source;

pub use check::{list_rules, run_check, CheckOptions, CheckReport, OutputFormat};
pub use source::{load_config, load_schema, load_values};

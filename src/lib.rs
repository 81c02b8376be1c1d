//! csv-crop: crop a CSV file to selected columns and reformat its
//! `Timestamp` column.
//!
//! The binary in `main.rs` is a thin wrapper over [`job::run`].

pub mod cli;
pub mod data;
pub mod error;
pub mod job;

pub use error::ConfigError;

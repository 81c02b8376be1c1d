use std::path::PathBuf;

use thiserror::Error;

/// User-input errors. Each one ends the run with exit status 1 before any
/// output file is written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("the format you have chosen is invalid: {0}")]
    InvalidFormat(String),

    #[error("No CSV files found in the directory: {}", .0.display())]
    NoCsvFile(PathBuf),

    #[error("you need to include the 'Timestamp' column into your -c argument.")]
    MissingTimestamp,

    #[error("The list of columns contain invalid column-names: {0:?}")]
    InvalidColumns(Vec<String>),
}

use std::path::PathBuf;

use clap::Parser;

/// Read csv-files to extract and format needed data.
#[derive(Parser, Debug, Clone)]
#[command(name = "csv-crop")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to directory of used files
    #[arg(short, long)]
    pub input: PathBuf,

    /// Path to directory where the formatted csv-file will be saved
    #[arg(short, long)]
    pub output: PathBuf,

    /// Column to keep in the cropped csv-file (repeatable). If not set, or
    /// set to `all`, every column is kept
    #[arg(short, long = "columns", value_name = "COLUMN")]
    pub columns: Vec<String>,

    /// Timestamp format: `standard` removes the date, `seconds` also removes
    /// sub-seconds, `minutes` also removes seconds
    #[arg(short, long, default_value = "standard")]
    pub format: String,
}

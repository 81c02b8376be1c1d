use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cli::Args;
use crate::data::filter::{ColumnSelection, select_columns};
use crate::data::loader::load_csv;
use crate::data::timestamp::{TIMESTAMP_COLUMN, TimestampFormat, format_timestamp_column};
use crate::data::writer::write_csv;
use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Job – one validated run
// ---------------------------------------------------------------------------

/// Everything a run needs, resolved and checked before the source is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub columns: ColumnSelection,
    pub format: TimestampFormat,
}

impl Job {
    /// Validate the arguments and prepare the filesystem.
    ///
    /// Checks run in this order: format tag, `Timestamp` in the column list,
    /// a CSV file in the input directory. Only then is the output directory
    /// created.
    pub fn prepare(args: &Args) -> Result<Self> {
        let format: TimestampFormat = args.format.parse()?;

        let columns = ColumnSelection::from_args(&args.columns);
        if !columns.includes(TIMESTAMP_COLUMN) {
            return Err(ConfigError::MissingTimestamp.into());
        }

        let file_name = locate_csv(&args.input)?;
        if ensure_dir(&args.output)? {
            println!("Output-directory created.");
        }

        Ok(Job {
            input_file: args.input.join(&file_name),
            output_file: args.output.join(&file_name),
            columns,
            format,
        })
    }

    /// Load, project, reformat and write.
    pub fn run(&self) -> Result<()> {
        let table = load_csv(&self.input_file)?;
        log::info!(
            "Loaded {} rows with columns {:?}",
            table.n_rows(),
            table.column_names()
        );

        let table = select_columns(table, &self.columns)?;
        if self.format != TimestampFormat::Standard {
            println!("chosen Timestamp format: {}", self.format);
        }
        let table = format_timestamp_column(table, self.format)?;
        write_csv(&table, &self.output_file)
    }
}

/// Prepare and run a job, returning the written file's path.
pub fn run(args: &Args) -> Result<PathBuf> {
    let job = Job::prepare(args)?;
    job.run()?;
    Ok(job.output_file)
}

// ---------------------------------------------------------------------------
// Filesystem helpers
// ---------------------------------------------------------------------------

/// Pick the CSV file to process: the lexicographically first regular file
/// ending in `.csv`. Others are skipped with a warning.
pub fn locate_csv(dir: &Path) -> Result<String> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("reading input directory {}", dir.display()))?;

    let mut names: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.ends_with(".csv") && entry.path().is_file() {
            names.push(name);
        }
    }
    names.sort();

    let mut names = names.into_iter();
    let first = names
        .next()
        .ok_or_else(|| ConfigError::NoCsvFile(dir.to_path_buf()))?;
    let skipped: Vec<String> = names.collect();
    if !skipped.is_empty() {
        log::warn!("Processing {first}; ignoring {skipped:?}");
    }
    log::info!("Selected {}", dir.join(&first).display());
    Ok(first)
}

/// Create `dir` and its parents if missing. Returns whether it was created.
pub fn ensure_dir(dir: &Path) -> Result<bool> {
    if dir.is_dir() {
        return Ok(false);
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("creating output directory {}", dir.display()))?;
    log::info!("Created output directory {}", dir.display());
    Ok(true)
}

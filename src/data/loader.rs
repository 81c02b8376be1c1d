use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::StringRecord;

use super::model::{CellValue, Column, ColumnKind, Table};

/// Cell texts read as missing values (the Pandas `read_csv` defaults).
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND",
    "1.#QNAN", "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

const TRUE_VALUES: &[&str] = &["True", "TRUE", "true"];
const FALSE_VALUES: &[&str] = &["False", "FALSE", "false"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a CSV file with a header row into a [`Table`].
///
/// Column types are inferred from content; see [`infer_column`].
pub fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("opening CSV {}", path.display()))?;

    let raw_headers = reader.headers().context("reading CSV headers")?.clone();
    if raw_headers.is_empty() {
        bail!("No columns to parse from file {}", path.display());
    }
    let headers = dedupe_headers(&raw_headers);
    let width = headers.len();

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); width];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() > width {
            let line = record.position().map_or(row_no as u64 + 2, |p| p.line());
            bail!(
                "Error tokenizing data: expected {width} fields in line {line}, saw {}",
                record.len()
            );
        }
        for (col_idx, column) in cells.iter_mut().enumerate() {
            column.push(record.get(col_idx).unwrap_or("").to_string());
        }
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| infer_column(name, raw))
        .collect();

    let table = Table::from_columns(columns)?;
    log::debug!(
        "Loaded {} rows with columns {:?} from {}",
        table.n_rows(),
        table.column_names(),
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Header handling
// ---------------------------------------------------------------------------

/// Name blank header cells `Unnamed: N` (N = column index) and rename
/// repeated names to `X.1`, `X.2`, ... so every column is addressable by name.
fn dedupe_headers(raw: &StringRecord) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(raw.len());

    for (idx, cell) in raw.iter().enumerate() {
        let name = if cell.is_empty() {
            format!("Unnamed: {idx}")
        } else {
            cell.to_string()
        };
        let mut candidate = name.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{name}.{suffix}");
            suffix += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

// ---------------------------------------------------------------------------
// Type inference
// ---------------------------------------------------------------------------

fn is_na(s: &str) -> bool {
    NA_VALUES.contains(&s)
}

fn parse_bool(s: &str) -> Option<bool> {
    if TRUE_VALUES.contains(&s) {
        Some(true)
    } else if FALSE_VALUES.contains(&s) {
        Some(false)
    } else {
        None
    }
}

fn parse_float(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

/// Decide a column's dtype from its non-missing cells and convert them.
///
/// * all integers, no gaps → `Integer`
/// * all integers with gaps, or any float → `Float`
/// * all boolean tokens → `Bool`
/// * otherwise `Text`, keeping the original strings
/// * nothing but gaps → `Float`
pub fn infer_column(name: String, raw: Vec<String>) -> Column {
    let present: Vec<&str> = raw
        .iter()
        .map(String::as_str)
        .filter(|s| !is_na(s))
        .collect();
    let has_gaps = present.len() < raw.len();

    let kind = if present.is_empty() {
        ColumnKind::Float
    } else if present.iter().all(|s| s.trim().parse::<i64>().is_ok()) {
        if has_gaps {
            ColumnKind::Float
        } else {
            ColumnKind::Integer
        }
    } else if present.iter().all(|s| parse_float(s).is_some()) {
        ColumnKind::Float
    } else if present.iter().all(|s| parse_bool(s).is_some()) {
        ColumnKind::Bool
    } else {
        ColumnKind::Text
    };

    let values = raw
        .into_iter()
        .map(|s| {
            if is_na(&s) {
                return CellValue::Null;
            }
            match kind {
                ColumnKind::Integer => s
                    .trim()
                    .parse::<i64>()
                    .map_or(CellValue::Null, CellValue::Integer),
                ColumnKind::Float => parse_float(&s).map_or(CellValue::Null, CellValue::Float),
                ColumnKind::Bool => parse_bool(&s).map_or(CellValue::Null, CellValue::Bool),
                ColumnKind::Text => CellValue::Text(s),
            }
        })
        .collect();

    Column::new(name, kind, values)
}

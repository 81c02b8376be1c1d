use anyhow::Result;

use crate::error::ConfigError;

use super::model::{Column, Table};

// ---------------------------------------------------------------------------
// Column selection: which columns survive, and in which order
// ---------------------------------------------------------------------------

/// Columns to keep in the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelection {
    /// Keep every column in source order.
    All,
    /// Keep exactly these columns, in this order.
    Only(Vec<String>),
}

impl ColumnSelection {
    /// Interpret the repeated `-c` values. No values, or the single value
    /// `all`, selects every column. Repeated names keep their first position.
    pub fn from_args(columns: &[String]) -> Self {
        if columns.is_empty() || (columns.len() == 1 && columns[0] == "all") {
            return ColumnSelection::All;
        }
        let mut names: Vec<String> = Vec::with_capacity(columns.len());
        for col in columns {
            if !names.contains(col) {
                names.push(col.clone());
            }
        }
        ColumnSelection::Only(names)
    }

    /// Whether `name` is guaranteed to survive the projection.
    pub fn includes(&self, name: &str) -> bool {
        match self {
            ColumnSelection::All => true,
            ColumnSelection::Only(names) => names.iter().any(|n| n == name),
        }
    }
}

/// Project `table` onto `selection`.
///
/// Every requested name missing from the header is reported at once; the
/// table is only rebuilt when all of them are present.
pub fn select_columns(table: Table, selection: &ColumnSelection) -> Result<Table> {
    let names = match selection {
        ColumnSelection::All => return Ok(table),
        ColumnSelection::Only(names) => names,
    };

    let missing: Vec<String> = names
        .iter()
        .filter(|n| table.position(n).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(ConfigError::InvalidColumns(missing).into());
    }

    let mut slots: Vec<Option<Column>> = table.into_columns().into_iter().map(Some).collect();
    let kept: Vec<Column> = names
        .iter()
        .filter_map(|name| {
            slots
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|c| &c.name == name))
                .and_then(Option::take)
        })
        .collect();

    log::debug!("Keeping columns {names:?}");
    Table::from_columns(kept)
}

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::ConfigError;

use super::model::{CellValue, Column, ColumnKind, Table};

/// Name of the column that is always reformatted.
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

// ---------------------------------------------------------------------------
// Output granularity
// ---------------------------------------------------------------------------

/// How the `Timestamp` column is rendered. The date part is always dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampFormat {
    /// `HH:MM:SS`, plus `.ffffff` when any value in the column has sub-seconds.
    #[default]
    Standard,
    /// `HH:MM:SS`
    Seconds,
    /// `HH:MM`
    Minutes,
}

impl TimestampFormat {
    /// Accepted tags, as listed to the user.
    pub const TAGS: [&'static str; 3] = ["minutes", "seconds", "standard"];

    pub fn as_str(self) -> &'static str {
        match self {
            TimestampFormat::Standard => "standard",
            TimestampFormat::Seconds => "seconds",
            TimestampFormat::Minutes => "minutes",
        }
    }

    fn pattern(self, fractional: bool) -> &'static str {
        match self {
            TimestampFormat::Standard if fractional => "%H:%M:%S%.6f",
            TimestampFormat::Standard | TimestampFormat::Seconds => "%H:%M:%S",
            TimestampFormat::Minutes => "%H:%M",
        }
    }
}

impl FromStr for TimestampFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(TimestampFormat::Standard),
            "seconds" => Ok(TimestampFormat::Seconds),
            "minutes" => Ok(TimestampFormat::Minutes),
            other => Err(ConfigError::InvalidFormat(other.to_string())),
        }
    }
}

impl fmt::Display for TimestampFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M",
];

const OFFSET_LAYOUTS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const DATE_LAYOUTS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];

const TIME_LAYOUTS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Parse one timestamp string into a naive date-time.
///
/// Offset-bearing values keep their wall-clock time. Bare times land on
/// today's date, which never reaches the output.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();

    if let Some(dt) = DATETIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDateTime::parse_from_str(s, layout).ok())
    {
        return Some(dt);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Some(dt) = OFFSET_LAYOUTS
        .iter()
        .find_map(|layout| DateTime::parse_from_str(s, layout).ok())
    {
        return Some(dt.naive_local());
    }

    if let Some(dt) = DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(s, layout).ok()?.and_hms_opt(0, 0, 0))
    {
        return Some(dt);
    }

    TIME_LAYOUTS
        .iter()
        .find_map(|layout| NaiveTime::parse_from_str(s, layout).ok())
        .map(|time| Local::now().date_naive().and_time(time))
}

/// Numeric timestamps count nanoseconds since the Unix epoch.
fn from_epoch_nanos(nanos: i64) -> NaiveDateTime {
    DateTime::from_timestamp_nanos(nanos).naive_utc()
}

fn parse_cell(value: &CellValue, row: usize) -> Result<Option<NaiveDateTime>> {
    let parsed = match value {
        CellValue::Null => return Ok(None),
        CellValue::Text(s) => parse_timestamp(s)
            .with_context(|| format!("row {row}: cannot parse '{s}' as a timestamp"))?,
        CellValue::Integer(n) => from_epoch_nanos(*n),
        CellValue::Float(f) if f.is_finite() && f.abs() < i64::MAX as f64 => {
            from_epoch_nanos(*f as i64)
        }
        other => bail!("row {row}: cannot parse {other:?} as a timestamp"),
    };
    Ok(Some(parsed))
}

// ---------------------------------------------------------------------------
// Column rewrite
// ---------------------------------------------------------------------------

/// Render parsed values with `format`; missing values stay missing.
pub fn render(parsed: &[Option<NaiveDateTime>], format: TimestampFormat) -> Vec<CellValue> {
    let fractional = parsed.iter().flatten().any(|dt| dt.nanosecond() != 0);
    let pattern = format.pattern(fractional);

    parsed
        .iter()
        .map(|dt| match dt {
            Some(dt) => CellValue::Text(dt.format(pattern).to_string()),
            None => CellValue::Null,
        })
        .collect()
}

/// Replace the `Timestamp` column with its re-rendered text. Any value that
/// does not parse fails the whole column.
pub fn format_timestamp_column(mut table: Table, format: TimestampFormat) -> Result<Table> {
    let idx = table.position(TIMESTAMP_COLUMN).with_context(|| {
        format!(
            "column '{TIMESTAMP_COLUMN}' not found in {:?}",
            table.column_names()
        )
    })?;

    let parsed = table.columns()[idx]
        .values
        .iter()
        .enumerate()
        .map(|(row, value)| parse_cell(value, row))
        .collect::<Result<Vec<_>>>()
        .context("formatting the Timestamp column")?;

    let column = Column::new(TIMESTAMP_COLUMN, ColumnKind::Text, render(&parsed, format));
    table.replace_column(idx, column)?;

    log::debug!("Rendered {} timestamps as {format}", parsed.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").unwrap()
    }

    fn timestamps(values: &[&str]) -> Table {
        Table::from_columns(vec![
            Column::new(
                TIMESTAMP_COLUMN,
                ColumnKind::Text,
                values
                    .iter()
                    .map(|v| {
                        if v.is_empty() {
                            CellValue::Null
                        } else {
                            CellValue::Text(v.to_string())
                        }
                    })
                    .collect(),
            ),
            Column::new(
                "A",
                ColumnKind::Integer,
                (0..values.len() as i64).map(CellValue::Integer).collect(),
            ),
        ])
        .unwrap()
    }

    fn texts(table: &Table) -> Vec<String> {
        table
            .column(TIMESTAMP_COLUMN)
            .unwrap()
            .values
            .iter()
            .map(CellValue::to_string)
            .collect()
    }

    #[test]
    fn format_tags_parse() {
        assert_eq!("standard".parse::<TimestampFormat>(), Ok(TimestampFormat::Standard));
        assert_eq!("seconds".parse::<TimestampFormat>(), Ok(TimestampFormat::Seconds));
        assert_eq!("minutes".parse::<TimestampFormat>(), Ok(TimestampFormat::Minutes));
        assert_eq!(
            "hours".parse::<TimestampFormat>(),
            Err(ConfigError::InvalidFormat("hours".into()))
        );
        assert_eq!(TimestampFormat::default(), TimestampFormat::Standard);
    }

    #[test]
    fn parses_common_layouts() {
        let expected = dt("2024-01-02 03:04:05");
        for raw in [
            "2024-01-02 03:04:05",
            "2024-01-02T03:04:05",
            "2024/01/02 03:04:05",
            "01/02/2024 03:04:05",
            "02.01.2024 03:04:05",
            "2024-01-02T03:04:05+02:00",
            "2024-01-02 03:04:05+0200",
            "2024-01-02T03:04:05Z",
            " 2024-01-02 03:04:05 ",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "{raw}");
        }

        assert_eq!(parse_timestamp("2024-01-02 03:04"), Some(dt("2024-01-02 03:04:00")));
        assert_eq!(parse_timestamp("2024-01-02"), Some(dt("2024-01-02 00:00:00")));
        assert_eq!(
            parse_timestamp("2024-01-02 03:04:05.25"),
            Some(dt("2024-01-02 03:04:05.250"))
        );
        assert_eq!(parse_timestamp("not a time"), None);
    }

    #[test]
    fn bare_times_keep_their_clock_value() {
        let parsed = parse_timestamp("03:04:05.5").unwrap();
        assert_eq!(parsed.time(), NaiveTime::from_hms_milli_opt(3, 4, 5, 500).unwrap());
        assert_eq!(
            parse_timestamp("03:04").unwrap().time(),
            NaiveTime::from_hms_opt(3, 4, 0).unwrap()
        );
    }

    #[test]
    fn renders_each_granularity() {
        let parsed = [Some(dt("2024-01-02 03:04:05"))];
        assert_eq!(
            render(&parsed, TimestampFormat::Standard),
            [CellValue::Text("03:04:05".into())]
        );
        assert_eq!(render(&parsed, TimestampFormat::Seconds), [CellValue::Text("03:04:05".into())]);
        assert_eq!(render(&parsed, TimestampFormat::Minutes), [CellValue::Text("03:04".into())]);
    }

    #[test]
    fn standard_widens_whole_column_for_subseconds() {
        let parsed = [Some(dt("2024-01-02 03:04:05")), Some(dt("2024-01-02 03:04:06.25")), None];
        assert_eq!(
            render(&parsed, TimestampFormat::Standard),
            [
                CellValue::Text("03:04:05.000000".into()),
                CellValue::Text("03:04:06.250000".into()),
                CellValue::Null,
            ]
        );
        assert_eq!(
            render(&parsed, TimestampFormat::Seconds)[1],
            CellValue::Text("03:04:06".into())
        );
    }

    #[test]
    fn rewrites_only_the_timestamp_column() {
        let table = timestamps(&["2024-01-02 03:04:05", "", "2024-01-02 23:59:30"]);
        let before_a = table.column("A").unwrap().clone();

        let out = format_timestamp_column(table, TimestampFormat::Minutes).unwrap();
        assert_eq!(texts(&out), ["03:04", "", "23:59"]);
        assert_eq!(out.column(TIMESTAMP_COLUMN).unwrap().kind, ColumnKind::Text);
        assert_eq!(out.column("A").unwrap(), &before_a);
        assert_eq!(out.column_names(), ["Timestamp", "A"]);
    }

    #[test]
    fn formatting_is_idempotent() {
        let raw = ["2024-01-02 03:04:05", "2024-01-02 13:14:15.5"];
        for format in [
            TimestampFormat::Standard,
            TimestampFormat::Seconds,
            TimestampFormat::Minutes,
        ] {
            let once = texts(&format_timestamp_column(timestamps(&raw), format).unwrap());
            let as_str: Vec<&str> = once.iter().map(String::as_str).collect();
            let twice = texts(&format_timestamp_column(timestamps(&as_str), format).unwrap());
            assert_eq!(once, twice, "{format}");
        }
    }

    #[test]
    fn numeric_values_are_epoch_nanoseconds() {
        let table = Table::from_columns(vec![Column::new(
            TIMESTAMP_COLUMN,
            ColumnKind::Integer,
            vec![CellValue::Integer(3_723_000_000_000)],
        )])
        .unwrap();
        let out = format_timestamp_column(table, TimestampFormat::Seconds).unwrap();
        assert_eq!(texts(&out), ["01:02:03"]);
    }

    #[test]
    fn unparseable_value_fails_the_column() {
        let table = timestamps(&["2024-01-02 03:04:05", "soon"]);
        let err = format_timestamp_column(table, TimestampFormat::Standard).unwrap_err();
        assert!(format!("{err:#}").contains("'soon'"));
    }

    #[test]
    fn missing_timestamp_column_is_an_error() {
        let table =
            Table::from_columns(vec![Column::new("A", ColumnKind::Integer, vec![])]).unwrap();
        assert!(format_timestamp_column(table, TimestampFormat::Standard).is_err());
    }
}

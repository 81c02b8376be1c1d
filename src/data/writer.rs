use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};

use super::model::Table;

/// Write `table` as comma-separated CSV with a header row and no index.
///
/// The rows go to a temporary file next to `path` which is then renamed over
/// it, so an existing file is either fully replaced or left untouched. A
/// replaced file keeps its permissions; a new one gets the usual
/// umask-filtered mode.
pub fn write_csv(table: &Table, path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let existing = fs::metadata(path).ok().map(|m| m.permissions());

    #[cfg_attr(not(unix), allow(unused_mut))]
    let mut builder = tempfile::Builder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // Filtered by the umask at creation, like a plain `File::create`.
        builder.permissions(fs::Permissions::from_mode(0o666));
    }
    let tmp = builder
        .tempfile_in(dir)
        .with_context(|| format!("creating temporary file in {}", dir.display()))?;

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(tmp);

    writer
        .write_record(table.column_names())
        .context("writing CSV header")?;

    let columns = table.columns();
    let mut record: Vec<String> = Vec::with_capacity(columns.len());
    for row in 0..table.n_rows() {
        record.clear();
        record.extend(columns.iter().map(|c| c.values[row].to_string()));
        writer
            .write_record(&record)
            .with_context(|| format!("writing CSV row {row}"))?;
    }

    let tmp = writer
        .into_inner()
        .map_err(|e| anyhow!("flushing CSV output: {}", e.error()))?;
    let file = tmp
        .persist(path)
        .with_context(|| format!("saving {}", path.display()))?;
    if let Some(perms) = existing {
        file.set_permissions(perms)
            .with_context(|| format!("restoring permissions on {}", path.display()))?;
    }

    log::info!("Wrote {} rows to {}", table.n_rows(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::load_csv;
    use crate::data::model::{CellValue, Column, ColumnKind};

    fn sample() -> Table {
        Table::from_columns(vec![
            Column::new(
                "Timestamp",
                ColumnKind::Text,
                vec![CellValue::Text("03:04".into()), CellValue::Null],
            ),
            Column::new(
                "A",
                ColumnKind::Float,
                vec![CellValue::Float(1.0), CellValue::Float(0.5)],
            ),
            Column::new(
                "Note",
                ColumnKind::Text,
                vec![CellValue::Text("a,b".into()), CellValue::Text("say \"hi\"".into())],
            ),
            Column::new(
                "Ok",
                ColumnKind::Bool,
                vec![CellValue::Bool(true), CellValue::Bool(false)],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn writes_header_rows_and_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&sample(), &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "Timestamp,A,Note,Ok\n03:04,1.0,\"a,b\",True\n,0.5,\"say \"\"hi\"\"\",False\n"
        );
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "stale contents that are longer than the new file\n").unwrap();

        write_csv(&sample(), &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Timestamp,A,Note,Ok\n"));
        assert!(!text.contains("stale"));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn overwrite_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        fs::write(&path, "secret\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o600)).unwrap();

        write_csv(&sample(), &path).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
        assert!(fs::read_to_string(&path).unwrap().starts_with("Timestamp,"));
    }

    #[cfg(unix)]
    #[test]
    fn new_file_follows_default_create_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&sample(), &path).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode & 0o600, 0o600);
        assert_eq!(mode & 0o111, 0);
    }

    #[test]
    fn non_timestamp_values_survive_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.csv");
        fs::write(
            &src,
            "Timestamp,I,F,S,B,G\n\
             2024-01-02 03:04:05,1,2.5,x y,True,1\n\
             2024-01-02 03:04:06,-3,1e-05,\"q,r\",false,\n",
        )
        .unwrap();

        let loaded = load_csv(&src).unwrap();
        let out = dir.path().join("out.csv");
        write_csv(&loaded, &out).unwrap();
        let reloaded = load_csv(&out).unwrap();

        for name in ["I", "F", "S", "B", "G"] {
            assert_eq!(loaded.column(name), reloaded.column(name), "{name}");
        }
    }
}

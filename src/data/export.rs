use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::model::CsvTable;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Could not open {} for writing: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write CSV: {0}")]
    Write(#[from] csv::Error),
}

/// Write `table` as CSV.
///
/// Fields containing `,`, `"` or a line break are quoted with inner quotes
/// doubled.  The loader does not undo this quoting, so such fields do not
/// survive an export/import cycle unchanged.
pub fn write_table<W: Write>(table: &CsvTable, out: W) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(out);

    write_record(&mut writer, &table.headers)?;
    for row in &table.rows {
        write_record(&mut writer, row)?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

/// A record holding one empty field is written as an empty line; the `csv`
/// writer would otherwise emit `""` for it.
fn write_record<W: Write>(writer: &mut csv::Writer<W>, record: &[String]) -> Result<(), ExportError> {
    if let [only] = record {
        if only.is_empty() {
            writer.flush().map_err(csv::Error::from)?;
            writer.get_mut().write_all(b"\n").map_err(csv::Error::from)?;
            return Ok(());
        }
    }
    writer.write_record(record)?;
    Ok(())
}

/// Export `table` to `path`, replacing any existing file.
pub fn export_csv(table: &CsvTable, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_table(table, file)?;
    log::info!("Exported {} rows to {}", table.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{read_csv, LoadLimits};
    use std::sync::atomic::AtomicBool;

    fn table(headers: &[&str], rows: &[&[&str]]) -> CsvTable {
        CsvTable::new(
            headers.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    fn to_string(t: &CsvTable) -> String {
        let mut buf = Vec::new();
        write_table(t, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn reimport(t: &CsvTable) -> CsvTable {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        export_csv(t, &path).unwrap();
        read_csv(&path, &AtomicBool::new(false), LoadLimits::default(), |_| {}).unwrap()
    }

    #[test]
    fn plain_fields_are_written_verbatim() {
        let t = table(&["x", "y"], &[&["1", "a"], &["2", "b"]]);
        assert_eq!(to_string(&t), "x,y\n1,a\n2,b\n");
    }

    #[test]
    fn special_fields_are_quoted() {
        let t = table(&["x", "note"], &[&["1", "a,b"], &["2", "say \"hi\""], &["3", "two\nlines"]]);
        assert_eq!(
            to_string(&t),
            "x,note\n1,\"a,b\"\n2,\"say \"\"hi\"\"\"\n3,\"two\nlines\"\n"
        );
    }

    #[test]
    fn short_rows_are_written_as_is() {
        let t = table(&["a", "b", "c"], &[&["1", "2", "3"], &["4"]]);
        assert_eq!(to_string(&t), "a,b,c\n1,2,3\n4\n");
    }

    #[test]
    fn plain_fields_round_trip_through_loader() {
        let t = table(&["x", "y", "emitter"], &[&["1.5", "2", "3"], &["-4", "abc", "0"]]);
        assert_eq!(reimport(&t), t);
    }

    #[test]
    fn blank_lines_round_trip_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("in.csv");
        std::fs::write(&src, "name\nalpha\n\nbeta\n").unwrap();
        let loaded = read_csv(&src, &AtomicBool::new(false), LoadLimits::default(), |_| {}).unwrap();
        assert_eq!(loaded.rows, vec![vec!["alpha"], vec![""], vec!["beta"]]);

        assert_eq!(to_string(&loaded), "name\nalpha\n\nbeta\n");
        assert_eq!(reimport(&loaded), loaded);
    }

    #[test]
    fn comma_fields_do_not_round_trip() {
        let t = table(&["x", "note"], &[&["1", "a,b"]]);
        let back = reimport(&t);
        assert_ne!(back, t);
        assert_eq!(back.rows[0], vec!["1", "\"a", "b\""]);
    }

    #[test]
    fn quote_fields_do_not_round_trip() {
        let t = table(&["x", "note"], &[&["1", "say \"hi\""]]);
        let back = reimport(&t);
        assert_eq!(back.rows[0], vec!["1", "\"say \"\"hi\"\"\""]);
    }

    #[test]
    fn unwritable_destination_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("out.csv");
        let err = export_csv(&table(&["x"], &[&["1"]]), &path).unwrap_err();
        assert!(matches!(err, ExportError::Create { .. }));
    }
}

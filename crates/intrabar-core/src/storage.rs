//! Flat CSV persistence, one file per timeframe and symbol.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::domain::{Bar, BarRecord, Symbol, Timeframe};
use crate::StorageError;

/// `<root>/<timeframe>/<SYMBOL>.csv`. Path separators inside the symbol
/// (`BRK/B`) become underscores.
pub fn series_path(root: &Path, timeframe: Timeframe, symbol: &Symbol) -> PathBuf {
    let file_name = format!("{}.csv", symbol.as_str().replace(['/', '\\'], "_"));
    root.join(timeframe.as_str()).join(file_name)
}

/// Writes `bars` with a header row, creating parent directories as needed.
pub fn write_bars(path: &Path, bars: &[Bar]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)?;
    writer.write_record(BarRecord::COLUMNS)?;
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;

    info!(path = %path.display(), rows = bars.len(), "wrote series");
    Ok(())
}

/// Reads every row, keeping blank cells as `None`.
pub fn read_records(path: &Path) -> Result<Vec<BarRecord>, StorageError> {
    let mut reader = csv::Reader::from_path(path)?;
    let records = reader
        .deserialize()
        .collect::<Result<Vec<BarRecord>, csv::Error>>()?;
    Ok(records)
}

/// Reads a complete series; any incomplete row is an error.
pub fn read_bars(path: &Path) -> Result<Vec<Bar>, StorageError> {
    read_records(path)?
        .into_iter()
        .enumerate()
        .map(|(row, record)| record.into_bar(row).map_err(StorageError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ValidationError;

    fn sample_bars() -> Vec<Bar> {
        vec![
            Bar {
                timestamp: 1_735_828_200_000,
                datetime: String::from("2025-01-02 09:30:00 EST"),
                open: 588.5,
                high: 589.25,
                low: 588.1,
                close: 589.0,
                volume: 120_000,
            },
            Bar {
                timestamp: 1_735_828_260_000,
                datetime: String::from("2025-01-02 09:31:00 EST"),
                open: 589.0,
                high: 589.4,
                low: 588.75,
                close: 588.8,
                volume: 80_500,
            },
        ]
    }

    #[test]
    fn series_path_follows_timeframe_symbol_layout() {
        let symbol = Symbol::parse("brk/b").expect("valid symbol");
        let path = series_path(Path::new("data"), Timeframe::FiveMinutes, &symbol);
        assert_eq!(path, Path::new("data").join("5m").join("BRK_B.csv"));
    }

    #[test]
    fn written_series_reads_back_unchanged() {
        let dir = tempfile::tempdir().expect("tempdir");
        let symbol = Symbol::parse("SPY").expect("valid symbol");
        let path = series_path(dir.path(), Timeframe::OneMinute, &symbol);

        write_bars(&path, &sample_bars()).expect("write");
        let contents = std::fs::read_to_string(&path).expect("read raw");
        assert!(contents.starts_with("timestamp,datetime,open,high,low,close,volume\n"));

        assert_eq!(read_bars(&path).expect("read"), sample_bars());
    }

    #[test]
    fn empty_series_still_has_header() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("empty.csv");

        write_bars(&path, &[]).expect("write");
        assert!(read_records(&path).expect("read").is_empty());
    }

    #[test]
    fn blank_cells_become_missing_fields() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("holes.csv");
        std::fs::write(
            &path,
            "timestamp,datetime,open,high,low,close,volume\n\
             1735828200000,2025-01-02 09:30:00 EST,1.0,,0.5,NaN,10\n",
        )
        .expect("write");

        let records = read_records(&path).expect("read");
        assert_eq!(records[0].missing_fields(), vec!["high", "close"]);

        let err = read_bars(&path).expect_err("incomplete row");
        assert!(matches!(
            err,
            StorageError::Validation(ValidationError::MissingField {
                row: 0,
                field: "high"
            })
        ));
    }
}

//! Delimited redirect files. Implements the `RecordFiles` port with the `csv` crate.
//!
//! Files are `;`-delimited with a header row. Header names are trimmed, cell
//! values are kept byte for byte, and empty cells are treated as absent.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::RecordFiles;
use crate::domain::{InputError, RawRow, RawTable};

/// Field delimiter for redirect files.
pub const DELIMITER: u8 = b';';

/// Production filesystem implementation of `RecordFiles`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRecordFiles;

impl RecordFiles for CsvRecordFiles {
    fn read(&self, path: &Path) -> Result<Vec<u8>, InputError> {
        std::fs::read(path).map_err(|e| InputError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn parse(&self, bytes: &[u8]) -> Result<RawTable, InputError> {
        parse_rows(bytes)
    }

    fn write_delete_list(&self, path: &Path, paths: &[String]) -> Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .from_path(path)
            .with_context(|| format!("creating {}", path.display()))?;
        writer.write_record(["from"]).context("writing header")?;
        for p in paths {
            writer.write_record([p]).context("writing row")?;
        }
        writer
            .flush()
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, path: &Path) -> Result<()> {
        match std::fs::remove_file(path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                Err(e).with_context(|| format!("removing {}", path.display()))
            }
            _ => Ok(()),
        }
    }
}

/// Parse `;`-delimited bytes with a header row into a [`RawTable`].
///
/// # Errors
///
/// Returns [`InputError::Malformed`] for a row whose column count differs
/// from the header's, or for bytes that are not valid UTF-8.
pub fn parse_rows(bytes: &[u8]) -> Result<RawTable, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers = reader.headers().map_err(malformed)?.clone();
    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(malformed)?;
        let line = record.position().map_or(0, csv::Position::line);
        rows.push(RawRow::new(line, headers.iter().zip(record.iter())));
    }
    Ok(RawTable::new(headers.iter().map(str::to_owned).collect(), rows))
}

fn malformed(err: csv::Error) -> InputError {
    let line = err.position().map_or(0, csv::Position::line);
    let reason = match err.kind() {
        csv::ErrorKind::UnequalLengths {
            expected_len, len, ..
        } => format!("expected {expected_len} columns, found {len}"),
        csv::ErrorKind::Utf8 { .. } => "invalid UTF-8".to_string(),
        _ => err.to_string(),
    };
    InputError::Malformed { line, reason }
}

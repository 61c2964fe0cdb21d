//! Redirect record shapes and fail-fast input validation.
//!
//! Rows arrive as header→cell maps from the reader; this module decides
//! whether every row matches the shape an operation requires. One bad row
//! rejects the whole input.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::InputError;

/// Columns accepted in an import file.
pub const IMPORT_COLUMNS: &[&str] = &["from", "to", "type", "endDate"];

/// A parsed input file: the header row and the data rows beneath it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { headers, rows }
    }
}

/// One input row: non-empty cells keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number in the source file (the header is line 1).
    pub line: u64,
    pub cells: BTreeMap<String, String>,
}

impl RawRow {
    /// Build a row from `(header, value)` pairs, dropping empty cells.
    #[must_use]
    pub fn new<I, K, V>(line: u64, cells: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let cells = cells
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .filter(|(_, v): &(String, String)| !v.is_empty())
            .collect();
        Self { line, cells }
    }

    fn required(&self, field: &str) -> Result<&str, InputError> {
        self.cells
            .get(field)
            .map(String::as_str)
            .ok_or_else(|| InputError::MissingField {
                line: self.line,
                field: field.to_owned(),
            })
    }
}

/// Redirect kind. The remote API accepts only these two values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RedirectType {
    Permanent,
    Temporary,
}

impl RedirectType {
    pub const ALL: &'static [RedirectType] = &[Self::Permanent, Self::Temporary];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Permanent => "PERMANENT",
            Self::Temporary => "TEMPORARY",
        }
    }

    fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for RedirectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RedirectType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.iter().copied().find(|t| t.as_str() == s).ok_or(())
    }
}

/// A redirect rule to create or overwrite remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectRecord {
    pub from: String,
    pub to: String,
    #[serde(rename = "endDate", skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(rename = "type")]
    pub kind: RedirectType,
}

/// Validate the header and every row as an import record.
///
/// The header is checked first, so a column outside [`IMPORT_COLUMNS`] is
/// rejected even when all of its cells are empty.
///
/// # Errors
///
/// Returns [`InputError::UnexpectedColumn`] on line 1 for a bad header, or
/// the first offending row's error: a missing `from`/`to`/`type` or a `type`
/// outside [`RedirectType`].
pub fn validate_import(table: &RawTable) -> Result<Vec<RedirectRecord>, InputError> {
    if let Some(column) = table
        .headers
        .iter()
        .find(|h| !IMPORT_COLUMNS.contains(&h.as_str()))
    {
        return Err(InputError::UnexpectedColumn {
            line: 1,
            column: column.clone(),
        });
    }
    table.rows.iter().map(import_record).collect()
}

fn import_record(row: &RawRow) -> Result<RedirectRecord, InputError> {
    let from = row.required("from")?;
    let to = row.required("to")?;
    let raw_type = row.required("type")?;
    let kind = raw_type
        .parse::<RedirectType>()
        .map_err(|()| InputError::InvalidType {
            line: row.line,
            value: raw_type.to_owned(),
            valid: RedirectType::valid_values(),
        })?;
    Ok(RedirectRecord {
        from: from.to_owned(),
        to: to.to_owned(),
        end_date: row.cells.get("endDate").cloned(),
        kind,
    })
}

/// Validate every row as a delete record and return the `from` paths.
///
/// Columns other than `from` are ignored, so an import file can be fed to
/// delete unchanged.
///
/// # Errors
///
/// Returns an error naming the first row without a `from` value.
pub fn validate_delete(table: &RawTable) -> Result<Vec<String>, InputError> {
    table
        .rows
        .iter()
        .map(|row| row.required("from").map(str::to_owned))
        .collect()
}

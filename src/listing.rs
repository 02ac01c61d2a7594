//! Directory listing records parsed from `hdfs dfs -ls`.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::HdfsError;
use crate::label::{Label, LabelInterner};
use crate::table::{Column, ColumnKind, Schema, numbered_lines};

/// Column layout of one `hdfs dfs -ls` row.
pub const LISTING_SCHEMA: Schema = Schema::new(&[
    Column::new("permissions", ColumnKind::Text),
    Column::new("links", ColumnKind::Ignored),
    Column::new("owner", ColumnKind::Text),
    Column::new("group", ColumnKind::Text),
    Column::new("size", ColumnKind::Size),
    Column::new("date", ColumnKind::Date),
    Column::new("time", ColumnKind::Time),
    Column::new("path", ColumnKind::Text),
]);

/// One row of a directory listing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DirectoryEntry {
    /// Permission string such as `drwxr-xr-x`.
    pub permissions: String,
    /// Owning user.
    pub owner: Label,
    /// Owning group.
    pub group: Label,
    /// Size in bytes.
    pub size: u64,
    /// Modification time, minute precision.
    pub modified: NaiveDateTime,
    /// Absolute path of the entry.
    pub path: String,
}

impl DirectoryEntry {
    /// Returns `true` when the permission string marks a directory.
    #[must_use]
    pub fn is_directory(&self) -> bool {
        self.permissions.starts_with('d')
    }
}

/// Parses listing output into entries, preserving remote order.
///
/// The first line is the `Found N items` summary and is always discarded.
/// Blank lines are ignored. Owner and group labels are interned across the
/// whole listing.
///
/// # Errors
///
/// Returns [`HdfsError::Schema`] for a row with fewer than eight fields and
/// [`HdfsError::InvalidField`] for a field that fails conversion. Either
/// aborts the whole parse.
pub fn parse_listing(text: &str) -> Result<Vec<DirectoryEntry>, HdfsError> {
    let mut labels = LabelInterner::new();
    numbered_lines(text)
        .filter(|(line_number, _)| *line_number > 1)
        .map(|(line_number, line)| -> Result<DirectoryEntry, HdfsError> {
            let row = LISTING_SCHEMA.split(line_number, line)?;
            Ok(DirectoryEntry {
                permissions: row.text("permissions")?.to_owned(),
                owner: labels.intern(row.text("owner")?),
                group: labels.intern(row.text("group")?),
                size: row.size("size")?,
                modified: row.date("date")?.and_time(row.time("time")?),
                path: row.text("path")?.to_owned(),
            })
        })
        .collect()
}

//! Disk usage records parsed from `hdfs dfs -du -s`.

use serde::Serialize;

use crate::error::HdfsError;
use crate::table::{Column, ColumnKind, Schema, numbered_lines};

/// Column layout of one `hdfs dfs -du -s` row.
pub const USAGE_SCHEMA: Schema = Schema::new(&[
    Column::new("logical size", ColumnKind::Size),
    Column::new("physical size", ColumnKind::Size),
    Column::new("path", ColumnKind::Text),
]);

/// Space consumed by one path.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct UsageRecord {
    /// User-visible size in bytes.
    pub logical_size: u64,
    /// Raw size in bytes including replication.
    pub physical_size: u64,
    /// Path the sizes refer to.
    pub path: String,
}

impl UsageRecord {
    /// Physical bytes stored per logical byte, `None` for empty paths.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        reason = "ratio is informational; precision only degrades beyond 2^53 bytes"
    )]
    #[expect(
        clippy::float_arithmetic,
        reason = "replication ratio is inherently fractional"
    )]
    pub fn replication_factor(&self) -> Option<f64> {
        (self.logical_size != 0).then(|| self.physical_size as f64 / self.logical_size as f64)
    }
}

/// Parses usage output into records, preserving remote order.
///
/// No header line is skipped; blank lines are ignored.
///
/// # Errors
///
/// Returns [`HdfsError::Schema`] or [`HdfsError::InvalidField`] for the
/// first malformed row.
pub fn parse_usage(text: &str) -> Result<Vec<UsageRecord>, HdfsError> {
    numbered_lines(text)
        .map(|(line_number, line)| -> Result<UsageRecord, HdfsError> {
            let row = USAGE_SCHEMA.split(line_number, line)?;
            Ok(UsageRecord {
                logical_size: row.size("logical size")?,
                physical_size: row.size("physical size")?,
                path: row.text("path")?.to_owned(),
            })
        })
        .collect()
}

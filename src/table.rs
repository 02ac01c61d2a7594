//! Positional, whitespace-delimited table parsing.
//!
//! The remote filesystem client prints fixed-column tables. A [`Schema`]
//! names every column in order and checks the field count before any typed
//! conversion happens, so a short or mangled row surfaces as
//! [`HdfsError::Schema`] rather than as a confusing conversion failure. The
//! final column takes the remainder of the line, which keeps paths with
//! embedded spaces intact.

use chrono::{NaiveDate, NaiveTime};

use crate::error::HdfsError;

/// Declared type of a column.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    /// Free text kept verbatim.
    Text,
    /// Unsigned byte count.
    Size,
    /// Calendar date in `YYYY-MM-DD` form.
    Date,
    /// Wall-clock time in `HH:MM` form.
    Time,
    /// Parsed for position only and never converted.
    Ignored,
}

/// Named, typed column.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Column {
    /// Column name used in error messages and accessors.
    pub name: &'static str,
    /// Declared column type.
    pub kind: ColumnKind,
}

impl Column {
    /// Creates a column descriptor.
    #[must_use]
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self { name, kind }
    }
}

/// Ordered list of columns describing one table row.
#[derive(Clone, Copy, Debug)]
pub struct Schema {
    columns: &'static [Column],
}

impl Schema {
    /// Creates a schema from an ordered column list.
    #[must_use]
    pub const fn new(columns: &'static [Column]) -> Self {
        Self { columns }
    }

    /// Columns in declaration order.
    #[must_use]
    pub const fn columns(&self) -> &'static [Column] {
        self.columns
    }

    /// Splits `line` into fields and validates the field count.
    ///
    /// `line_number` is one-based and only used for error reporting.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::Schema`] when the line has fewer fields than the
    /// schema declares.
    pub fn split<'a>(&self, line_number: usize, line: &'a str) -> Result<Row<'a>, HdfsError> {
        let expected = self.columns.len();
        let mut fields = Vec::with_capacity(expected);
        let mut rest = line.trim();

        while fields.len() + 1 < expected {
            let Some((field, tail)) = rest.split_once(char::is_whitespace) else {
                break;
            };
            fields.push(field);
            rest = tail.trim_start();
        }
        if !rest.is_empty() {
            fields.push(rest);
        }

        if fields.len() != expected {
            return Err(HdfsError::Schema {
                line: line_number,
                expected,
                found: fields.len(),
                content: line.to_owned(),
            });
        }

        Ok(Row {
            line_number,
            columns: self.columns,
            fields,
        })
    }
}

/// One validated row with typed accessors by column name.
#[derive(Clone, Debug)]
pub struct Row<'a> {
    line_number: usize,
    columns: &'static [Column],
    fields: Vec<&'a str>,
}

impl<'a> Row<'a> {
    /// One-based line number the row came from.
    #[must_use]
    pub const fn line_number(&self) -> usize {
        self.line_number
    }

    /// Returns the raw text of column `name`.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::InvalidField`] when the schema has no such column.
    pub fn text(&self, name: &str) -> Result<&'a str, HdfsError> {
        self.lookup(name).map(|(_, field)| field)
    }

    /// Parses column `name` as a byte count.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::InvalidField`] when the field is not an unsigned
    /// integer.
    pub fn size(&self, name: &str) -> Result<u64, HdfsError> {
        let raw = self.typed(name, ColumnKind::Size)?;
        raw.parse::<u64>()
            .map_err(|err| self.invalid(name, raw, &err.to_string()))
    }

    /// Parses column `name` as a `YYYY-MM-DD` date.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::InvalidField`] when the field is not a date.
    pub fn date(&self, name: &str) -> Result<NaiveDate, HdfsError> {
        let raw = self.typed(name, ColumnKind::Date)?;
        NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map_err(|err| self.invalid(name, raw, &err.to_string()))
    }

    /// Parses column `name` as an `HH:MM` time.
    ///
    /// # Errors
    ///
    /// Returns [`HdfsError::InvalidField`] when the field is not a time.
    pub fn time(&self, name: &str) -> Result<NaiveTime, HdfsError> {
        let raw = self.typed(name, ColumnKind::Time)?;
        NaiveTime::parse_from_str(raw, "%H:%M")
            .map_err(|err| self.invalid(name, raw, &err.to_string()))
    }

    fn lookup(&self, name: &str) -> Result<(Column, &'a str), HdfsError> {
        self.columns
            .iter()
            .zip(self.fields.iter())
            .find_map(|(column, field)| (column.name == name).then_some((*column, *field)))
            .ok_or_else(|| self.invalid(name, "", "column is not part of the schema"))
    }

    fn typed(&self, name: &str, kind: ColumnKind) -> Result<&'a str, HdfsError> {
        let (column, field) = self.lookup(name)?;
        if column.kind != kind {
            return Err(self.invalid(
                name,
                field,
                &format!("column is declared as {:?}, not {kind:?}", column.kind),
            ));
        }
        Ok(field)
    }

    fn invalid(&self, column: &str, value: &str, reason: &str) -> HdfsError {
        HdfsError::InvalidField {
            line: self.line_number,
            column: column.to_owned(),
            value: value.to_owned(),
            reason: reason.to_owned(),
        }
    }
}

/// Iterates over the non-blank lines of `text` with one-based line numbers.
pub(crate) fn numbered_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| !line.trim().is_empty())
}

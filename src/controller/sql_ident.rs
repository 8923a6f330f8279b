//! SQL identifier quoting for the destination table
//!
//! The table name is the only configurable fragment that is interpolated into
//! SQL text; every row value goes through bound parameters. Quoting accepts
//! arbitrary input (reserved words, spaces, punctuation) rather than
//! rejecting it.

use std::fmt;

/// Table used when no destination table is configured.
pub const DEFAULT_TABLE: &str = "public.server";

/// Returns a safely quoted identifier suitable for SQL text
/// (supports "schema.table"). Defaults to [`DEFAULT_TABLE`] on empty input.
///
/// Each dot-delimited segment is independently double-quoted, with embedded
/// double quotes doubled.
pub fn sanitize_table_ident(name: &str) -> String {
    let name = if name.is_empty() { DEFAULT_TABLE } else { name };
    name.split('.')
        .map(|segment| format!("\"{}\"", segment.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// A fully resolved, quoted table identifier.
///
/// Resolved exactly once at startup; the reconcilers interpolate it as-is and
/// never see the raw configured name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableIdent(String);

impl TableIdent {
    pub fn resolve(name: &str) -> Self {
        TableIdent(sanitize_table_ident(name))
    }

    pub fn as_sql(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

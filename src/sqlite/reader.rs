// ABOUTME: SQLite source access - table discovery and full-table row scans
// ABOUTME: Produces SourceRow mappings consumed by the per-row handlers

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};

use crate::migration::value::{SourceRow, SqlValue};

/// Open the source database read-only.
///
/// The source is never written to; opening read-only also fails fast on a
/// path that exists but is not a SQLite database.
pub fn open(path: &Path) -> Result<Connection> {
    Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("Failed to open SQLite database at '{}'", path.display()))
}

/// Names of all tables visible in the source catalog.
pub fn list_tables(conn: &Connection) -> Result<HashSet<String>> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
        .context("Failed to query sqlite_master")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .context("Failed to list source tables")?
        .collect::<std::result::Result<HashSet<_>, _>>()
        .context("Failed to read source table name")?;
    Ok(names)
}

/// Fetch every row of `table` in the source's natural order.
///
/// A full-table read; Redmine databases are small enough that paging is not
/// worth the complexity here.
pub fn fetch_rows(conn: &Connection, table: &str) -> Result<Vec<SourceRow>> {
    let sql = format!("SELECT * FROM \"{}\"", table);
    let mut stmt = conn
        .prepare(&sql)
        .with_context(|| format!("Failed to prepare scan of source table '{}'", table))?;
    let columns: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut rows = stmt
        .query([])
        .with_context(|| format!("Failed to scan source table '{}'", table))?;
    let mut fetched = Vec::new();
    while let Some(row) = rows
        .next()
        .with_context(|| format!("Failed to read row from source table '{}'", table))?
    {
        let mut source_row = SourceRow::new();
        for (index, column) in columns.iter().enumerate() {
            let value = row
                .get_ref(index)
                .with_context(|| format!("Failed to read column '{}' of '{}'", column, table))?;
            source_row.insert(column.clone(), SqlValue::from(value));
        }
        fetched.push(source_row);
    }
    Ok(fetched)
}

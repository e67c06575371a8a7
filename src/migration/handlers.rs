// ABOUTME: Per-table row handlers - the migration's one polymorphism point
// ABOUTME: Resolves a handler per table and applies one upsert decision per row

use anyhow::{anyhow, Context, Result};
use tokio_postgres::Transaction;

use crate::migration::statements::{insert_statement, update_statement, BoundStatement};
use crate::migration::value::SourceRow;

/// How rows of a given table are applied to the destination.
///
/// Resolved once per table before its rows are iterated. Every table gets
/// `Standard` upsert-by-id semantics except the two Redmine tables that
/// need bespoke treatment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableHandler {
    /// Probe by `id`: update when the row already exists, insert otherwise.
    /// Tables without an `id` column are treated as append-only.
    Standard,
    /// `schema_migrations`: probe by `version`, insert only if absent.
    /// Applied migrations are immutable historical facts, never updated.
    SchemaVersion,
    /// `wiki_content_versions`: intentionally not migrated. Wiki history
    /// is disposable and the table dwarfs the rest of the database.
    Skip,
}

impl TableHandler {
    pub fn resolve(table: &str) -> Self {
        match table {
            "schema_migrations" => TableHandler::SchemaVersion,
            "wiki_content_versions" => TableHandler::Skip,
            _ => TableHandler::Standard,
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, TableHandler::Skip)
    }

    /// Apply one source row to the destination: zero or one write statement.
    pub async fn apply(
        &self,
        tx: &Transaction<'_>,
        table: &str,
        columns: &[String],
        row: &SourceRow,
    ) -> Result<()> {
        match self {
            TableHandler::Standard => apply_standard(tx, table, columns, row).await,
            TableHandler::SchemaVersion => apply_schema_version(tx, table, columns, row).await,
            TableHandler::Skip => Ok(()),
        }
    }
}

async fn apply_standard(
    tx: &Transaction<'_>,
    table: &str,
    columns: &[String],
    row: &SourceRow,
) -> Result<()> {
    let has_id_column = columns.iter().any(|c| c == "id");

    let exists = match (has_id_column, row.get("id")) {
        (true, Some(id)) => {
            let probe = format!("SELECT id FROM {} WHERE id = $1", table);
            tx.query_opt(probe.as_str(), &[id])
                .await
                .with_context(|| format!("Failed to probe '{}' by id", table))?
                .is_some()
        }
        // No id column (or no id value): append-only semantics
        _ => false,
    };

    let stmt = if exists {
        update_statement(table, columns, row)
    } else {
        insert_statement(table, columns, row)
    };
    execute_bound(tx, table, &stmt, row).await
}

async fn apply_schema_version(
    tx: &Transaction<'_>,
    table: &str,
    columns: &[String],
    row: &SourceRow,
) -> Result<()> {
    let version = row
        .get("version")
        .ok_or_else(|| anyhow!("Row for '{}' is missing its 'version' column", table))?;

    let probe = format!("SELECT version FROM {} WHERE version = $1", table);
    let exists = tx
        .query_opt(probe.as_str(), &[version])
        .await
        .with_context(|| format!("Failed to probe '{}' by version", table))?
        .is_some();

    if exists {
        tracing::debug!("Migration version already recorded in '{}', skipping", table);
        return Ok(());
    }
    let stmt = insert_statement(table, columns, row);
    execute_bound(tx, table, &stmt, row).await
}

/// Execute a rendered statement with the row's values bound in order.
///
/// A row that shares no columns with the destination schema is skipped with
/// a warning rather than rendered as a malformed statement.
async fn execute_bound(
    tx: &Transaction<'_>,
    table: &str,
    stmt: &BoundStatement,
    row: &SourceRow,
) -> Result<()> {
    if stmt.has_no_bindings() {
        tracing::warn!(
            "⚠ Row for '{}' shares no columns with the destination schema, skipping",
            table
        );
        return Ok(());
    }

    tracing::debug!("{}", stmt.sql);
    let params = row.params(&stmt.columns);
    tx.execute(stmt.sql.as_str(), &params)
        .await
        .with_context(|| format!("Failed to apply row to '{}'", table))?;
    Ok(())
}

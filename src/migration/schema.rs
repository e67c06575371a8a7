// ABOUTME: Destination schema introspection for migration planning
// ABOUTME: Reads table names, per-table column lists, and sequence names from PostgreSQL

use std::collections::HashSet;

use anyhow::{Context, Result};
use tokio_postgres::Client;

/// One destination table: its name and its columns in declaration order.
///
/// The column order defines both the insert column order and the update
/// target set. Built once at startup, read-only for the rest of the run.
#[derive(Debug, Clone)]
pub struct TableMetadata {
    pub name: String,
    pub columns: Vec<String>,
}

/// Everything the driver needs to know about the destination, read before
/// any mutation begins.
#[derive(Debug, Clone)]
pub struct DestinationSchema {
    /// Public tables in lexicographic name order, fixing the processing order.
    pub tables: Vec<TableMetadata>,
    /// Names of all sequence objects; membership gates sequence resync.
    pub sequences: HashSet<String>,
}

/// List all public tables in the destination, lexicographically ordered.
pub async fn list_tables(client: &Client) -> Result<Vec<String>> {
    let rows = client
        .query(
            "SELECT tablename
             FROM pg_catalog.pg_tables
             WHERE schemaname = 'public'
             ORDER BY tablename",
            &[],
        )
        .await
        .context("Failed to list destination tables")?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// List a table's column names in declaration order.
pub async fn table_columns(client: &Client, table: &str) -> Result<Vec<String>> {
    let rows = client
        .query(
            "SELECT column_name
             FROM information_schema.columns
             WHERE table_schema = 'public' AND table_name = $1
             ORDER BY ordinal_position",
            &[&table],
        )
        .await
        .with_context(|| format!("Failed to list columns for table '{}'", table))?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// List all sequence objects visible in the destination.
pub async fn list_sequences(client: &Client) -> Result<HashSet<String>> {
    let rows = client
        .query(
            "SELECT sequence_name
             FROM information_schema.sequences
             WHERE sequence_schema = 'public'",
            &[],
        )
        .await
        .context("Failed to list destination sequences")?;

    Ok(rows.iter().map(|row| row.get(0)).collect())
}

/// Run all destination catalog queries once and assemble the schema map.
pub async fn introspect(client: &Client) -> Result<DestinationSchema> {
    let table_names = list_tables(client).await?;
    let mut tables = Vec::with_capacity(table_names.len());
    for name in table_names {
        let columns = table_columns(client, &name).await?;
        tables.push(TableMetadata { name, columns });
    }
    let sequences = list_sequences(client).await?;

    Ok(DestinationSchema { tables, sequences })
}

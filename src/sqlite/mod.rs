// ABOUTME: SQLite source module
// ABOUTME: Exports the read-only source reader

pub mod reader;

pub use reader::{fetch_rows, list_tables, open};

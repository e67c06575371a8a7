// ABOUTME: Migration core module
// ABOUTME: Statement building, schema introspection, value bridging, and row handlers

pub mod handlers;
pub mod schema;
pub mod statements;
pub mod value;

pub use handlers::TableHandler;
pub use schema::{introspect, DestinationSchema, TableMetadata};
pub use statements::{
    insert_statement, sequence_name, sequence_reset_statement, update_statement, BoundStatement,
};
pub use value::{SourceRow, SqlValue};

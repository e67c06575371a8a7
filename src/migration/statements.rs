// ABOUTME: Pure SQL statement rendering for the migration core
// ABOUTME: Builds parameterized INSERT/UPDATE and sequence-restart statements

use crate::migration::value::SourceRow;

/// A rendered parameterized statement plus its bind order.
///
/// `columns` lists, in order, the row columns whose values must be bound as
/// `$1..$n`. For updates the primary key is appended last to match the
/// trailing `WHERE id = $n` placeholder.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    pub sql: String,
    pub columns: Vec<String>,
}

impl BoundStatement {
    /// True when the row shared no columns with the destination schema.
    pub fn has_no_bindings(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Columns from the schema's ordered list that the row actually carries.
///
/// Columns absent from the row are dropped from the statement entirely
/// rather than bound as NULL; the schema's declaration order is preserved.
fn present_columns(columns: &[String], row: &SourceRow) -> Vec<String> {
    columns
        .iter()
        .filter(|column| row.contains(column))
        .cloned()
        .collect()
}

/// Render a parameterized INSERT over the columns present in `row`.
pub fn insert_statement(table: &str, columns: &[String], row: &SourceRow) -> BoundStatement {
    let present = present_columns(columns, row);
    let placeholders: Vec<String> = (1..=present.len()).map(|i| format!("${}", i)).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        present.join(", "),
        placeholders.join(", ")
    );
    BoundStatement {
        sql,
        columns: present,
    }
}

/// Render a parameterized UPDATE over the columns present in `row`.
///
/// The `WHERE id = $n` predicate is always appended, with the id value bound
/// last, whether or not `id` is also among the updated columns.
pub fn update_statement(table: &str, columns: &[String], row: &SourceRow) -> BoundStatement {
    let mut present = present_columns(columns, row);
    let assignments: Vec<String> = present
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ${}", column, i + 1))
        .collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ${}",
        table,
        assignments.join(", "),
        present.len() + 1
    );
    present.push("id".to_string());
    BoundStatement {
        sql,
        columns: present,
    }
}

/// Name of the primary-key sequence backing `table`, by PostgreSQL's
/// serial-column naming convention.
pub fn sequence_name(table: &str) -> String {
    format!("{}_id_seq", table)
}

/// Render the statement that restarts `table`'s primary-key sequence just
/// past the highest migrated id. An absent maximum (empty table) restarts
/// the sequence at 1.
///
/// `ALTER SEQUENCE` takes no bind parameters; the restart value is a
/// trusted integer so it is rendered inline.
pub fn sequence_reset_statement(table: &str, current_max: Option<i64>) -> String {
    format!(
        "ALTER SEQUENCE {} RESTART WITH {}",
        sequence_name(table),
        current_max.unwrap_or(0) + 1
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::value::SqlValue;

    fn attachment_columns() -> Vec<String> {
        ["id", "container_id", "container_type", "filename"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn full_row() -> SourceRow {
        let mut row = SourceRow::new();
        for column in attachment_columns() {
            row.insert(column, SqlValue::Null);
        }
        row
    }

    #[test]
    fn test_insert_statement_full_row() {
        let stmt = insert_statement("attachments", &attachment_columns(), &full_row());
        assert_eq!(
            stmt.sql,
            "INSERT INTO attachments (id, container_id, container_type, filename) \
             VALUES ($1, $2, $3, $4)"
        );
        assert_eq!(stmt.columns, attachment_columns());
    }

    #[test]
    fn test_insert_statement_drops_absent_columns() {
        let mut row = SourceRow::new();
        for column in ["container_id", "container_type", "filename"] {
            row.insert(column, SqlValue::Null);
        }

        let stmt = insert_statement("attachments", &attachment_columns(), &row);
        assert_eq!(
            stmt.sql,
            "INSERT INTO attachments (container_id, container_type, filename) \
             VALUES ($1, $2, $3)"
        );
        assert_eq!(stmt.columns.len(), 3);
    }

    #[test]
    fn test_insert_statement_ignores_extra_row_keys() {
        let mut row = full_row();
        row.insert("not_in_schema", SqlValue::Integer(1));

        let stmt = insert_statement("attachments", &attachment_columns(), &row);
        assert!(!stmt.sql.contains("not_in_schema"));
        assert_eq!(stmt.columns.len(), 4);
    }

    #[test]
    fn test_insert_statement_empty_intersection() {
        let stmt = insert_statement("attachments", &attachment_columns(), &SourceRow::new());
        assert!(stmt.has_no_bindings());
    }

    #[test]
    fn test_update_statement_full_row() {
        let stmt = update_statement("attachments", &attachment_columns(), &full_row());
        assert_eq!(
            stmt.sql,
            "UPDATE attachments SET id = $1, container_id = $2, container_type = $3, \
             filename = $4 WHERE id = $5"
        );
        // id is bound twice: once as an assignment, once for the predicate
        assert_eq!(stmt.columns.last().map(String::as_str), Some("id"));
        assert_eq!(stmt.columns.len(), 5);
    }

    #[test]
    fn test_update_statement_without_id_still_filters_by_id() {
        let mut row = SourceRow::new();
        for column in ["container_id", "container_type", "filename"] {
            row.insert(column, SqlValue::Null);
        }

        let stmt = update_statement("attachments", &attachment_columns(), &row);
        assert_eq!(
            stmt.sql,
            "UPDATE attachments SET container_id = $1, container_type = $2, \
             filename = $3 WHERE id = $4"
        );
    }

    #[test]
    fn test_sequence_name() {
        assert_eq!(sequence_name("attachments"), "attachments_id_seq");
        assert_eq!(sequence_name("users"), "users_id_seq");
    }

    #[test]
    fn test_sequence_reset_statement() {
        assert_eq!(
            sequence_reset_statement("attachments", Some(1)),
            "ALTER SEQUENCE attachments_id_seq RESTART WITH 2"
        );
        assert_eq!(
            sequence_reset_statement("attachments", Some(5)),
            "ALTER SEQUENCE attachments_id_seq RESTART WITH 6"
        );
    }

    #[test]
    fn test_sequence_reset_statement_empty_table_restarts_at_one() {
        assert_eq!(
            sequence_reset_statement("attachments", None),
            "ALTER SEQUENCE attachments_id_seq RESTART WITH 1"
        );
    }
}

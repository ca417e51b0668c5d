//! Schema manager
//!
//! Derives `CREATE TABLE IF NOT EXISTS` and `CREATE INDEX IF NOT EXISTS`
//! statements from the registered descriptors and executes them. Safe to
//! run on every start: existing tables and indexes are left alone, columns
//! are never added, altered or dropped.
//!
//! Statements run one at a time with no enclosing transaction. A failure
//! stops setup and is reported; statements that already ran stay applied.

use tracing::info;

use crate::descriptor::{quote_ident, Index};
use crate::error::{DbError, DbResult};
use crate::registry::{ModelEntry, ModelRegistry};
use crate::store::SqlStore;

/// `CREATE TABLE` statement for one model
pub fn create_table_sql(entry: &ModelEntry) -> String {
    let mut columns = Vec::with_capacity(entry.fields.len() + 1);
    columns.push(format!(
        "{} INTEGER PRIMARY KEY AUTOINCREMENT",
        quote_ident(&entry.id_column)
    ));

    for field in &entry.fields {
        let mut column = format!(
            "{} {}",
            quote_ident(field.physical_name()),
            field.data_type().sql_type()
        );
        if field.is_not_null() {
            column.push_str(" NOT NULL");
        }
        columns.push(column);
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(entry.table_name()),
        columns.join(", ")
    )
}

/// `CREATE INDEX` statement for one declared index
pub fn create_index_sql(entry: &ModelEntry, index: &Index) -> String {
    // Index fields may be declared with their own descriptor copies; resolve
    // physical names through the model's fields.
    let columns: Vec<String> = index
        .fields
        .iter()
        .map(|f| {
            let physical = entry
                .field(f.key_name())
                .map_or(f.physical_name(), |declared| declared.physical_name());
            quote_ident(physical)
        })
        .collect();

    format!(
        "CREATE {}INDEX IF NOT EXISTS {} ON {} ({})",
        if index.unique { "UNIQUE " } else { "" },
        quote_ident(&index.name),
        quote_ident(entry.table_name()),
        columns.join(", ")
    )
}

/// Every DDL statement for the registry, tables first per model
pub fn schema_statements(registry: &ModelRegistry) -> Vec<String> {
    let mut statements = Vec::new();
    for entry in registry.entries() {
        statements.push(create_table_sql(entry));
        for index in entry.table.indexes() {
            statements.push(create_index_sql(entry, index));
        }
    }
    statements
}

/// Create every registered table and index that does not exist yet
pub fn ensure_schema<S: SqlStore + ?Sized>(store: &S, registry: &ModelRegistry) -> DbResult<()> {
    let statements = schema_statements(registry);

    for statement in &statements {
        store
            .execute(statement, &[])
            .map_err(|source| DbError::Schema {
                statement: statement.clone(),
                source,
            })?;
    }

    info!(
        models = registry.len(),
        statements = statements.len(),
        "schema ensured"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqlValue;
    use crate::test_models::{test_registry, Person};
    use rusqlite::Connection;

    fn names(conn: &Connection, kind: &str) -> Vec<String> {
        conn.prepare("SELECT name FROM sqlite_master WHERE type = ?1 AND name NOT LIKE 'sqlite_%' ORDER BY name")
            .unwrap()
            .query_map([kind], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect()
    }

    #[test]
    fn test_create_table_sql() {
        let registry = test_registry();
        let sql = create_table_sql(registry.entry_for::<Person>().unwrap());

        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"People\" (\
             \"zID\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"firstName\" TEXT NOT NULL, \
             \"lastName\" TEXT NOT NULL, \
             \"WeightField\" REAL NOT NULL, \
             \"age\" INTEGER NOT NULL, \
             \"timeStamp\" TEXT NOT NULL)"
        );
    }

    #[test]
    fn test_create_index_sql() {
        let registry = test_registry();
        let entry = registry.entry_for::<Person>().unwrap();
        let sql = create_index_sql(entry, &entry.table.indexes()[0]);

        assert_eq!(
            sql,
            "CREATE UNIQUE INDEX IF NOT EXISTS \"idx_last_first\" ON \"People\" (\"lastName\", \"firstName\")"
        );
    }

    #[test]
    fn test_ensure_schema_creates_tables_and_indexes() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn, &test_registry()).unwrap();

        let tables = names(&conn, "table");
        assert!(tables.contains(&"People".to_string()));
        assert!(tables.contains(&"FriendList".to_string()));
        assert!(tables.contains(&"attachments".to_string()));

        let indexes = names(&conn, "index");
        assert!(indexes.contains(&"idx_last_first".to_string()));
        assert!(indexes.contains(&"idx_attachments_owner".to_string()));
    }

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        let registry = test_registry();

        ensure_schema(&conn, &registry).unwrap();
        let tables = names(&conn, "table");
        let indexes = names(&conn, "index");

        ensure_schema(&conn, &registry).unwrap();
        assert_eq!(names(&conn, "table"), tables);
        assert_eq!(names(&conn, "index"), indexes);
    }

    #[test]
    fn test_ensure_schema_keeps_existing_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.db");
        let registry = test_registry();

        {
            let conn = Connection::open(&path).unwrap();
            ensure_schema(&conn, &registry).unwrap();
            SqlStore::execute(
                &conn,
                "INSERT INTO \"FriendList\" (\"listName\", \"friend1\", \"friend2\") VALUES (?1, 1, 2)",
                &[SqlValue::Text("kept".into())],
            )
            .unwrap();
        }

        let conn = Connection::open(&path).unwrap();
        ensure_schema(&conn, &registry).unwrap();
        let rows = SqlStore::query(&conn, "SELECT * FROM \"FriendList\"", &[]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("listName"), Some("kept"));
    }

    #[test]
    fn test_schema_failure_is_reported() {
        let conn = Connection::open_in_memory().unwrap();
        // A view named like the table cannot carry an index
        conn.execute_batch("CREATE VIEW \"People\" AS SELECT 1 AS x").unwrap();

        let err = ensure_schema(&conn, &test_registry()).unwrap_err();
        match err {
            DbError::Schema { statement, .. } => assert!(statement.contains("\"People\"")),
            other => panic!("unexpected error: {other}"),
        }
    }
}

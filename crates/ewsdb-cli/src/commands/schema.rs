//! Init and schema command handlers

use anyhow::{Context, Result};
use rusqlite::Connection;

use ewsdb_core::{schema_statements, Engine};

use crate::config::Config;
use crate::output::{Output, OutputFormat};

/// Create the database and every registered table
pub fn init(engine: &Engine, conn: &Connection, config: &Config, output: &Output) -> Result<()> {
    engine
        .ensure_schema(conn)
        .context("Failed to create schema")?;

    let path = config.database_path();
    let tables: Vec<&str> = engine
        .registry()
        .entries()
        .iter()
        .map(|e| e.table_name())
        .collect();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "database": path,
                    "tables": tables
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", path.display());
        }
        OutputFormat::Human => {
            println!("Database ready: {}", path.display());
            println!("Tables: {}", tables.join(", "));
        }
    }

    Ok(())
}

/// Print the DDL the registry produces, without touching a database
pub fn show(engine: &Engine, output: &Output) -> Result<()> {
    output.print_statements(&schema_statements(engine.registry()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;

    #[test]
    fn test_init_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        let registry = database::registry().unwrap();
        let engine = Engine::new(&registry);
        let output = Output::new(OutputFormat::Quiet);

        let conn = database::open(&config).unwrap();
        init(&engine, &conn, &config, &output).unwrap();
        init(&engine, &conn, &config, &output).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('authors', 'books')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn test_statements_cover_tables_and_indexes() {
        let registry = database::registry().unwrap();
        let statements = schema_statements(&registry);

        assert_eq!(statements.len(), 4);
        assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS \"authors\""));
        assert!(statements[1].contains("UNIQUE INDEX IF NOT EXISTS \"idx_authors_name\""));
        assert!(statements[2].contains("\"author_id\" INTEGER NOT NULL"));
        assert!(statements[3].contains("\"idx_books_author\" ON \"books\" (\"author_id\")"));
    }
}

//! Command handlers

pub mod author;
pub mod book;
pub mod config;
pub mod schema;
pub mod status;

use anyhow::{anyhow, Context, Result};

use ewsdb_core::{DbError, RecordId};

/// Parse a record id given on the command line
fn parse_id(raw: &str) -> Result<RecordId> {
    raw.parse::<RecordId>()
        .with_context(|| format!("'{}' is not a record id", raw))
}

/// Turn an engine error into a CLI error carrying its recovery hint
fn explain(error: DbError) -> anyhow::Error {
    match error.recovery_suggestion() {
        Some(hint) => anyhow!("{}\nHint: {}", error, hint),
        None => anyhow::Error::new(error),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use rusqlite::Connection;

    use ewsdb_core::{Engine, ModelRegistry};

    use crate::database;
    use crate::output::{Output, OutputFormat};

    /// In-memory database with the CLI schema applied
    pub(crate) fn setup() -> (Connection, ModelRegistry, Output) {
        let conn = Connection::open_in_memory().unwrap();
        let registry = database::registry().unwrap();
        Engine::new(&registry).ensure_schema(&conn).unwrap();
        (conn, registry, Output::new(OutputFormat::Quiet))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(" 42 ").unwrap(), RecordId::new(42));
        assert!(parse_id("abc").is_err());
    }

    #[test]
    fn test_explain_adds_hint() {
        let err = explain(DbError::ConstraintViolation {
            table: "authors".to_string(),
            record_id: RecordId::new(1),
            referencing_table: "books".to_string(),
            referencing_field: "author".to_string(),
        });
        let text = err.to_string();
        assert!(text.contains("books.author"));
        assert!(text.contains("Hint:"));
    }
}

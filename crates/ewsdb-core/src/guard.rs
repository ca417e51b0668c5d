//! Referential guard
//!
//! Prevents deleting a row that other rows still point at. A field declared
//! with [`Constraint::NoDeletionIfNetworked`](crate::Constraint) names the
//! table it references; any row holding a value in that field blocks the
//! deletion of the row with that identity.
//!
//! The guard scans the registry once, at construction, and builds a
//! read-only index from target table to the referencing columns. A delete
//! check then runs one `SELECT 1 ... LIMIT 1` query per referencing column.
//!
//! ## Concurrency
//!
//! The check and the delete that follows are separate statements. A row
//! referencing the target can be inserted between them by a concurrent
//! writer; integrity holds only when writers to the referencing tables are
//! serialized by the caller.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::descriptor::quote_ident;
use crate::error::{DbError, DbResult};
use crate::record_id::RecordId;
use crate::registry::ModelRegistry;
use crate::store::{SqlStore, SqlValue};

/// A column that references rows of another table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Physical name of the referencing table
    pub table: String,
    /// Key name of the referencing field
    pub field: String,
    /// Physical column of the referencing field
    pub column: String,
    /// Identity column of the referencing table
    pub id_column: String,
}

/// Index of delete-blocking references, keyed by lowercased target table.
/// SQLite resolves identifiers without regard to ASCII case, so lookups do
/// the same.
#[derive(Debug, Clone, Default)]
pub struct ReferentialGuard {
    references: HashMap<String, Vec<Reference>>,
}

impl ReferentialGuard {
    /// Build the reference index from every registered model
    pub fn new(registry: &ModelRegistry) -> Self {
        let mut references: HashMap<String, Vec<Reference>> = HashMap::new();

        for entry in registry.entries() {
            for field in &entry.fields {
                for target in field.networked_targets() {
                    references
                        .entry(target.to_ascii_lowercase())
                        .or_default()
                        .push(Reference {
                            table: entry.table_name().to_string(),
                            field: field.key_name().to_string(),
                            column: field.physical_name().to_string(),
                            id_column: entry.id_column.clone(),
                        });
                }
            }
        }

        Self { references }
    }

    /// Columns that block deletes from `table`
    pub fn references_to(&self, table: &str) -> &[Reference] {
        self.references
            .get(&table.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of guarded target tables
    pub fn guarded_tables(&self) -> usize {
        self.references.len()
    }

    /// Find the first row that still references `record_id` in `table`
    pub fn find_blocking<S: SqlStore + ?Sized>(
        &self,
        store: &S,
        table: &str,
        record_id: RecordId,
    ) -> DbResult<Option<&Reference>> {
        for reference in self.references_to(table) {
            let mut sql = format!(
                "SELECT 1 FROM {} WHERE {} = ?1",
                quote_ident(&reference.table),
                quote_ident(&reference.column)
            );
            let mut params = vec![SqlValue::Integer(record_id.get())];

            // A row pointing at itself does not block its own deletion
            if reference.table.eq_ignore_ascii_case(table) {
                sql.push_str(&format!(" AND {} <> ?2", quote_ident(&reference.id_column)));
                params.push(SqlValue::Integer(record_id.get()));
            }
            sql.push_str(" LIMIT 1");

            if !store.query(&sql, &params)?.is_empty() {
                return Ok(Some(reference));
            }
        }
        Ok(None)
    }

    /// Fail with [`DbError::ConstraintViolation`] if any row references
    /// `record_id` in `table`
    pub fn check<S: SqlStore + ?Sized>(
        &self,
        store: &S,
        table: &str,
        record_id: RecordId,
    ) -> DbResult<()> {
        match self.find_blocking(store, table, record_id)? {
            Some(reference) => {
                warn!(
                    table = %table,
                    record_id = record_id.get(),
                    referencing_table = %reference.table,
                    referencing_field = %reference.field,
                    "delete blocked by networked record"
                );
                Err(DbError::ConstraintViolation {
                    table: table.to_string(),
                    record_id,
                    referencing_table: reference.table.clone(),
                    referencing_field: reference.field.clone(),
                })
            }
            None => {
                debug!(table = %table, record_id = record_id.get(), "delete permitted");
                Ok(())
            }
        }
    }
}

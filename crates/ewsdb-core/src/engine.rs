//! Persistence engine
//!
//! Generic save, fetch and delete, written once against the [`Model`]
//! contract. SQL is built from the registered descriptors; values cross
//! into and out of the store through [`DataMap`].
//!
//! ## Lifecycle
//!
//! ```text
//! Unsaved --save/insert--> Persisted --save/update--> Persisted
//!                              |
//!                              +--delete (guard passes)--> Deleted
//! ```
//!
//! - Saving an unsaved value inserts it and returns a copy carrying the
//!   store-assigned identity.
//! - Saving a persisted value overwrites its row. If the row is gone the
//!   save fails with [`DbError::NotFoundOnUpdate`].
//! - Deleting consults the [`ReferentialGuard`] first. Deleting an identity
//!   that is already gone succeeds.
//!
//! Every operation borrows the store handle for its duration and performs a
//! bounded sequence of blocking round-trips. No locks are taken here.

use chrono::Datelike;
use tracing::{debug, info};

use crate::descriptor::quote_ident;
use crate::error::{BindingError, DbError, DbResult};
use crate::guard::ReferentialGuard;
use crate::model::Model;
use crate::record_id::RecordId;
use crate::registry::{ModelEntry, ModelRegistry};
use crate::schema;
use crate::store::{Row, SqlStore, SqlValue};
use crate::value::{DataMap, Value};

/// Upper bound on identities bound into a single `IN (...)` list
const FETCH_CHUNK_SIZE: usize = 500;

/// Years an RFC 3339 timestamp column can hold and read back
const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Save, fetch and delete for every registered model
pub struct Engine<'r> {
    registry: &'r ModelRegistry,
    guard: ReferentialGuard,
}

impl<'r> Engine<'r> {
    /// Create an engine over a registry, building the reference index once
    pub fn new(registry: &'r ModelRegistry) -> Self {
        let guard = ReferentialGuard::new(registry);
        debug!(
            models = registry.len(),
            guarded_tables = guard.guarded_tables(),
            "engine ready"
        );
        Self { registry, guard }
    }

    pub fn registry(&self) -> &ModelRegistry {
        self.registry
    }

    pub fn guard(&self) -> &ReferentialGuard {
        &self.guard
    }

    /// Create all registered tables and indexes that do not exist yet
    pub fn ensure_schema<S: SqlStore + ?Sized>(&self, store: &S) -> DbResult<()> {
        schema::ensure_schema(store, self.registry)
    }

    // ==================== Save ====================

    /// Insert an unsaved instance or update a persisted one
    ///
    /// Returns the saved value: for an insert, a copy carrying the new
    /// identity; for an update, an equal copy of the input. On error the
    /// store is left as it was.
    pub fn save<T: Model, S: SqlStore + ?Sized>(&self, store: &S, instance: &T) -> DbResult<T> {
        let entry = self.registry.entry_for::<T>()?;
        let table = entry.table_name();

        let mut map = instance.to_data_map();
        map.remove(T::id_key());
        let mut params = bind_fields(entry, &map).map_err(|e| DbError::binding(table, e))?;

        // The saved value is rebuilt from the map; it must parse before
        // anything is written.
        let staged_id = instance.record_id().unwrap_or(RecordId::new(0));
        map.insert(T::id_key(), staged_id);
        let staged = T::from_data_map(&map).map_err(|e| DbError::binding(table, e))?;

        match instance.record_id() {
            None => {
                let execution = store.execute(&insert_sql(entry), &params)?;
                let record_id = execution.last_insert_id;
                info!(table = %table, record_id = record_id.get(), "inserted");

                map.insert(T::id_key(), record_id);
                T::from_data_map(&map).map_err(|e| DbError::binding(table, e))
            }
            Some(record_id) => {
                params.push(SqlValue::Integer(record_id.get()));
                let execution = store.execute(&update_sql(entry), &params)?;
                if execution.rows_affected == 0 {
                    return Err(DbError::NotFoundOnUpdate {
                        table: table.to_string(),
                        record_id,
                    });
                }
                debug!(table = %table, record_id = record_id.get(), "updated");
                Ok(staged)
            }
        }
    }

    // ==================== Fetch ====================

    /// Fetch the rows addressed by `identities`
    ///
    /// Strings that are not valid identities cannot address a row and are
    /// skipped. Identities with no row are simply absent from the result.
    /// Result order is whatever the store returns. A row that fails to
    /// convert fails the whole fetch.
    pub fn fetch<T, S, I>(&self, store: &S, identities: &[I]) -> DbResult<Vec<T>>
    where
        T: Model,
        S: SqlStore + ?Sized,
        I: AsRef<str>,
    {
        let ids: Vec<RecordId> = identities
            .iter()
            .filter_map(|raw| match raw.as_ref().parse::<RecordId>() {
                Ok(id) => Some(id),
                Err(e) => {
                    debug!(error = %e, "skipping identity that cannot address a row");
                    None
                }
            })
            .collect();

        self.fetch_ids(store, &ids)
    }

    /// Fetch the rows addressed by typed identities
    pub fn fetch_ids<T: Model, S: SqlStore + ?Sized>(
        &self,
        store: &S,
        ids: &[RecordId],
    ) -> DbResult<Vec<T>> {
        let entry = self.registry.entry_for::<T>()?;
        let mut models = Vec::new();

        for chunk in ids.chunks(FETCH_CHUNK_SIZE) {
            let placeholders: Vec<String> = (1..=chunk.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT * FROM {} WHERE {} IN ({})",
                quote_ident(entry.table_name()),
                quote_ident(&entry.id_column),
                placeholders.join(", ")
            );
            let params: Vec<SqlValue> = chunk.iter().map(|id| SqlValue::Integer(id.get())).collect();

            for row in store.query(&sql, &params)? {
                models.push(row_to_model::<T>(entry, &row)?);
            }
        }

        Ok(models)
    }

    /// Fetch a single row by identity
    pub fn fetch_one<T: Model, S: SqlStore + ?Sized>(
        &self,
        store: &S,
        record_id: RecordId,
    ) -> DbResult<Option<T>> {
        Ok(self.fetch_ids(store, &[record_id])?.into_iter().next())
    }

    /// Fetch every row of the model's table, ordered by identity
    pub fn fetch_all<T: Model, S: SqlStore + ?Sized>(&self, store: &S) -> DbResult<Vec<T>> {
        let entry = self.registry.entry_for::<T>()?;
        let sql = format!(
            "SELECT * FROM {} ORDER BY {}",
            quote_ident(entry.table_name()),
            quote_ident(&entry.id_column)
        );

        store
            .query(&sql, &[])?
            .iter()
            .map(|row| row_to_model::<T>(entry, row))
            .collect()
    }

    /// Number of rows in the model's table
    pub fn count<T: Model, S: SqlStore + ?Sized>(&self, store: &S) -> DbResult<i64> {
        let entry = self.registry.entry_for::<T>()?;
        let sql = format!("SELECT COUNT(*) AS n FROM {}", quote_ident(entry.table_name()));

        let rows = store.query(&sql, &[])?;
        Ok(rows.first().and_then(|row| row.integer("n")).unwrap_or(0))
    }

    // ==================== Delete ====================

    /// Delete a persisted instance, unless another row still references it
    pub fn delete<T: Model, S: SqlStore + ?Sized>(&self, store: &S, instance: &T) -> DbResult<()> {
        let record_id = instance.record_id().ok_or_else(|| DbError::UnsavedRecord {
            table: T::table().physical_name().to_string(),
        })?;
        self.delete_by_id::<T, S>(store, record_id)
    }

    /// Delete by identity; an identity that is already gone is not an error
    pub fn delete_by_id<T: Model, S: SqlStore + ?Sized>(
        &self,
        store: &S,
        record_id: RecordId,
    ) -> DbResult<()> {
        let entry = self.registry.entry_for::<T>()?;
        let table = entry.table_name();

        self.guard.check(store, table, record_id)?;

        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_ident(table),
            quote_ident(&entry.id_column)
        );
        let execution = store.execute(&sql, &[SqlValue::Integer(record_id.get())])?;

        if execution.rows_affected == 0 {
            debug!(table = %table, record_id = record_id.get(), "delete found no row");
        } else {
            info!(table = %table, record_id = record_id.get(), "deleted");
        }
        Ok(())
    }
}

// ==================== SQL builders ====================

fn insert_sql(entry: &ModelEntry) -> String {
    let table = quote_ident(entry.table_name());
    if entry.fields.is_empty() {
        return format!("INSERT INTO {} DEFAULT VALUES", table);
    }

    let columns: Vec<String> = entry
        .fields
        .iter()
        .map(|f| quote_ident(f.physical_name()))
        .collect();
    let placeholders: Vec<String> = (1..=columns.len()).map(|i| format!("?{}", i)).collect();

    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders.join(", ")
    )
}

/// The identity is bound as the last parameter
fn update_sql(entry: &ModelEntry) -> String {
    let id_column = quote_ident(&entry.id_column);
    let assignments: Vec<String> = if entry.fields.is_empty() {
        vec![format!("{} = {}", id_column, id_column)]
    } else {
        entry
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| format!("{} = ?{}", quote_ident(f.physical_name()), i + 1))
            .collect()
    };

    format!(
        "UPDATE {} SET {} WHERE {} = ?{}",
        quote_ident(entry.table_name()),
        assignments.join(", "),
        id_column,
        entry.fields.len() + 1
    )
}

// ==================== Conversion ====================

/// Statement parameters for every declared field, in declaration order
fn bind_fields(entry: &ModelEntry, map: &DataMap) -> Result<Vec<SqlValue>, BindingError> {
    entry
        .fields
        .iter()
        .map(|field| {
            let key = field.key_name();
            let value = map.get(key).ok_or_else(|| BindingError::MissingField {
                key: key.to_string(),
            })?;

            if value.is_null() && field.is_not_null() {
                return Err(BindingError::NullValue {
                    key: key.to_string(),
                });
            }
            if !value.fits(field.data_type()) {
                return Err(BindingError::TypeMismatch {
                    key: key.to_string(),
                    expected: field.data_type().as_str(),
                    found: value.type_name(),
                });
            }
            if let Value::DateTime(dt) = value {
                if !STORABLE_YEARS.contains(&dt.year()) {
                    return Err(BindingError::OutOfRange {
                        key: key.to_string(),
                        value: dt.to_string(),
                        target: "dateTime",
                    });
                }
            }

            Ok(value.to_sql_value())
        })
        .collect()
}

/// Build a data map from a result row and construct the model from it
fn row_to_model<T: Model>(entry: &ModelEntry, row: &Row) -> DbResult<T> {
    let table = entry.table_name();
    let map = row_to_map(entry, row, T::id_key()).map_err(|e| DbError::binding(table, e))?;
    T::from_data_map(&map).map_err(|e| DbError::binding(table, e))
}

fn row_to_map(entry: &ModelEntry, row: &Row, id_key: &str) -> Result<DataMap, BindingError> {
    let mut map = DataMap::new();

    let id = row
        .integer(&entry.id_column)
        .ok_or_else(|| BindingError::Decode {
            column: entry.id_column.clone(),
            details: "identity column missing or not an integer".to_string(),
        })?;
    map.insert(id_key, RecordId::new(id));

    for field in &entry.fields {
        let column = field.physical_name();
        let stored = row.get(column).ok_or_else(|| BindingError::Decode {
            column: column.to_string(),
            details: "column missing from result row".to_string(),
        })?;
        map.insert(field.key_name(), Value::decode(column, field.data_type(), stored)?);
    }

    Ok(map)
}

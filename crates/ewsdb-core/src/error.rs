//! Error handling
//!
//! Every engine operation returns a [`DbResult`]. Failures are split into
//! three layers:
//!
//! - [`StoreError`]: the SQL store rejected or failed a statement
//! - [`BindingError`]: a value could not cross the keyed-map boundary
//! - [`DbError`]: the top-level error surfaced to callers

use thiserror::Error;

use crate::record_id::RecordId;

/// Errors reported by the underlying SQL store
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write
    #[error("Unique constraint failed: {message}")]
    UniqueViolation { message: String },

    /// Any other store-level constraint (NOT NULL, CHECK, FOREIGN KEY)
    #[error("Store constraint failed: {message}")]
    Constraint { message: String },

    /// Connection, syntax or I/O failure
    #[error("Store error: {message}")]
    Backend { message: String },
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        use rusqlite::ffi;

        match &error {
            rusqlite::Error::SqliteFailure(failure, detail)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                let message = detail.clone().unwrap_or_else(|| error.to_string());
                match failure.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        StoreError::UniqueViolation { message }
                    }
                    _ => StoreError::Constraint { message },
                }
            }
            _ => StoreError::Backend {
                message: error.to_string(),
            },
        }
    }
}

/// Errors converting between a model and its keyed data map
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BindingError {
    /// A required key was absent or null
    #[error("Missing required field '{key}'")]
    MissingField { key: String },

    /// The value stored under a key has the wrong type
    #[error("Field '{key}' expected {expected} but found {found}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// A numeric value does not fit the target type
    #[error("Field '{key}' value {value} is out of range for {target}")]
    OutOfRange {
        key: String,
        value: String,
        target: &'static str,
    },

    /// A null value was supplied for a NOT NULL field
    #[error("Field '{key}' is declared NOT NULL but has no value")]
    NullValue { key: String },

    /// A stored value could not be decoded into the declared type
    #[error("Column '{column}' holds an undecodable value: {details}")]
    Decode { column: String, details: String },
}

/// Top-level error for schema, save, fetch and delete operations
#[derive(Error, Debug)]
pub enum DbError {
    /// A CREATE TABLE / CREATE INDEX statement failed
    #[error("Schema setup failed on `{statement}`: {source}")]
    Schema {
        statement: String,
        #[source]
        source: StoreError,
    },

    /// A model descriptor violates a registry invariant
    #[error("Invalid descriptor for table '{table}': {reason}")]
    InvalidDescriptor { table: String, reason: String },

    /// The model's table was never registered
    #[error("Model table '{table}' is not registered")]
    UnregisteredModel { table: String },

    /// Value conversion failed
    #[error("Binding error on table '{table}': {source}")]
    Binding {
        table: String,
        #[source]
        source: BindingError,
    },

    /// Delete blocked by a row that still references the record
    #[error(
        "Cannot delete {table} record {record_id}: still referenced by {referencing_table}.{referencing_field}"
    )]
    ConstraintViolation {
        table: String,
        record_id: RecordId,
        referencing_table: String,
        referencing_field: String,
    },

    /// Update targeted a record that no longer exists
    #[error("Cannot update {table} record {record_id}: no such row")]
    NotFoundOnUpdate { table: String, record_id: RecordId },

    /// Delete requested for a model that was never saved
    #[error("Cannot delete unsaved record from table '{table}'")]
    UnsavedRecord { table: String },

    /// The store failed to execute a statement
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DbError {
    pub(crate) fn binding(table: &str, source: BindingError) -> Self {
        DbError::Binding {
            table: table.to_string(),
            source,
        }
    }

    /// Whether the store rejected a write because of a unique index
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DbError::Store(StoreError::UniqueViolation { .. })
                | DbError::Schema {
                    source: StoreError::UniqueViolation { .. },
                    ..
                }
        )
    }

    /// Whether the referential guard blocked a delete
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DbError::ConstraintViolation { .. })
    }

    /// Get a recovery suggestion for this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            DbError::ConstraintViolation { .. } => {
                Some("Delete or re-point the referencing rows first, then retry the delete.")
            }
            DbError::NotFoundOnUpdate { .. } => {
                Some("The record was deleted elsewhere. Save a fresh copy to insert it again.")
            }
            DbError::UnregisteredModel { .. } => {
                Some("Register the model type with the ModelRegistry before using it.")
            }
            DbError::Store(StoreError::UniqueViolation { .. }) => {
                Some("A record with the same unique key already exists.")
            }
            _ => None,
        }
    }
}

/// Result type for engine operations
pub type DbResult<T> = Result<T, DbError>;

//! SQL store capability
//!
//! The engine never talks to a database driver directly. It consumes the
//! narrow [`SqlStore`] capability: execute a statement with bound
//! parameters, or run a query and get rows back. The surrounding
//! application owns the handle and passes it by reference into every
//! operation; this crate never opens, closes or pools connections.
//!
//! An implementation for `rusqlite::Connection` lives in
//! [`crate::sqlite`].

use crate::error::StoreError;
use crate::record_id::RecordId;

/// Storage-level value, one case per SQLite storage class
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl SqlValue {
    /// Storage class name, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::Integer(_) => "INTEGER",
            SqlValue::Real(_) => "REAL",
            SqlValue::Text(_) => "TEXT",
            SqlValue::Blob(_) => "BLOB",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self {
            SqlValue::Real(f) => Some(*f),
            SqlValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&[u8]> {
        match self {
            SqlValue::Blob(b) => Some(b),
            _ => None,
        }
    }
}

/// Outcome of [`SqlStore::execute`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Execution {
    /// Rows inserted, updated or deleted by the statement
    pub rows_affected: usize,
    /// Identity of the most recently inserted row on this handle
    pub last_insert_id: RecordId,
}

/// One result row: ordered column names and their values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    /// Value of the named column, if the row has it
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn integer(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlValue::as_integer)
    }

    pub fn real(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(SqlValue::as_real)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(SqlValue::as_text)
    }

    pub fn blob(&self, column: &str) -> Option<&[u8]> {
        self.get(column).and_then(SqlValue::as_blob)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The capability the engine needs from a SQL database
///
/// Implementations are expected to serialize concurrent callers with their
/// own connection or locking discipline.
pub trait SqlStore {
    /// Execute a statement that returns no rows
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Execution, StoreError>;

    /// Run a query and collect every result row
    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError>;
}

impl<S: SqlStore + ?Sized> SqlStore for &S {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Execution, StoreError> {
        (**self).execute(sql, params)
    }

    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
        (**self).query(sql, params)
    }
}

//! SQLite binding for the store capability
//!
//! Implements [`SqlStore`] for `rusqlite::Connection`. A
//! `rusqlite::Transaction` derefs to a connection, so `&*tx` can be passed
//! wherever a store is expected.

use rusqlite::types::{ToSqlOutput, Value as RusqliteValue, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use tracing::debug;

use crate::error::StoreError;
use crate::record_id::RecordId;
use crate::store::{Execution, Row, SqlStore, SqlValue};

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(RusqliteValue::Null),
            SqlValue::Integer(i) => ToSqlOutput::Borrowed(ValueRef::Integer(*i)),
            SqlValue::Real(f) => ToSqlOutput::Borrowed(ValueRef::Real(*f)),
            SqlValue::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            SqlValue::Blob(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
        })
    }
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            ValueRef::Text(t) => SqlValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        }
    }
}

impl SqlStore for Connection {
    fn execute(&self, sql: &str, params: &[SqlValue]) -> Result<Execution, StoreError> {
        debug!(sql = %sql, params = params.len(), "execute");

        let mut stmt = self.prepare_cached(sql)?;
        let rows_affected = stmt.execute(params_from_iter(params.iter()))?;

        Ok(Execution {
            rows_affected,
            last_insert_id: RecordId::new(self.last_insert_rowid()),
        })
    }

    fn query(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<Row>, StoreError> {
        debug!(sql = %sql, params = params.len(), "query");

        let mut stmt = self.prepare_cached(sql)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let rows = stmt
            .query_map(params_from_iter(params.iter()), |row| {
                let mut columns = Vec::with_capacity(names.len());
                for (i, name) in names.iter().enumerate() {
                    columns.push((name.clone(), SqlValue::from(row.get_ref(i)?)));
                }
                Ok(Row::new(columns))
            })?
            .collect::<Result<Vec<Row>, _>>()?;

        Ok(rows)
    }
}

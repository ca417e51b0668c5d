//! EWSDB Core Library
//!
//! A minimal object-relational layer that maps statically declared model
//! types onto SQLite tables without runtime reflection.
//!
//! # Architecture
//!
//! - **Descriptors**: each model declares its table, fields and indexes
//! - **Registry**: the explicit set of model types an application persists
//! - **Schema manager**: creates tables and indexes from the descriptors
//! - **Engine**: generic save, fetch and delete against the [`Model`] trait
//! - **Referential guard**: blocks deletes of rows other rows still reference
//!
//! The engine reaches the database only through the [`SqlStore`]
//! capability, implemented here for `rusqlite::Connection`.
//!
//! # Quick Start
//!
//! ```text
//! let registry = ModelRegistry::new().with::<Person>()?.with::<FriendList>()?;
//! let engine = Engine::new(&registry);
//! engine.ensure_schema(&conn)?;
//!
//! let saved = engine.save(&conn, &Person::new("Eric", "Schramm"))?;
//! let found: Vec<Person> = engine.fetch(&conn, &[saved.record_id().unwrap().to_string()])?;
//! engine.delete(&conn, &saved)?;
//! ```
//!
//! # Modules
//!
//! - `descriptor`: field, table and index metadata
//! - `value`: keyed data map and dynamically typed values
//! - `model`: the model contract
//! - `registry`: model registration and descriptor validation
//! - `store` / `sqlite`: store capability and its SQLite binding
//! - `schema`: DDL generation and schema provisioning
//! - `guard`: delete guard over networked records
//! - `engine`: save, fetch and delete

pub mod descriptor;
pub mod engine;
pub mod error;
pub mod guard;
pub mod model;
pub mod record_id;
pub mod registry;
pub mod schema;
pub mod sqlite;
pub mod store;
pub mod value;

#[cfg(test)]
pub(crate) mod test_models;

pub use descriptor::{Constraint, DataType, FieldDescriptor, Index, TableDescriptor};
pub use engine::Engine;
pub use error::{BindingError, DbError, DbResult, StoreError};
pub use guard::{Reference, ReferentialGuard};
pub use model::{Model, DEFAULT_ID_COLUMN};
pub use record_id::{ParseRecordIdError, RecordId};
pub use registry::{ModelEntry, ModelRegistry};
pub use schema::{ensure_schema, schema_statements};
pub use store::{Execution, Row, SqlStore, SqlValue};
pub use value::{DataMap, FromValue, Value};

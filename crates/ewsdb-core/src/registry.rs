//! Model registry
//!
//! The registry is built once at startup from the model types an
//! application persists, then shared by reference with the schema manager,
//! the referential guard and the engine. It stores type-erased metadata
//! only, so a registry can also be assembled by hand in tests.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::descriptor::{FieldDescriptor, TableDescriptor};
use crate::error::{DbError, DbResult};
use crate::model::Model;

/// Metadata for one registered model
#[derive(Debug, Clone, PartialEq)]
pub struct ModelEntry {
    pub type_name: &'static str,
    pub table: TableDescriptor,
    pub fields: Vec<FieldDescriptor>,
    pub id_column: String,
}

impl ModelEntry {
    pub fn new(
        type_name: &'static str,
        table: TableDescriptor,
        fields: Vec<FieldDescriptor>,
        id_column: impl Into<String>,
    ) -> Self {
        Self {
            type_name,
            table,
            fields,
            id_column: id_column.into(),
        }
    }

    fn of<T: Model>() -> Self {
        Self::new(
            std::any::type_name::<T>(),
            T::table(),
            T::fields(),
            T::id_column(),
        )
    }

    pub fn table_name(&self) -> &str {
        self.table.physical_name()
    }

    pub fn field(&self, key_name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.key_name() == key_name)
    }

    /// Check the descriptor invariants of this entry in isolation
    fn validate(&self) -> DbResult<()> {
        let table = self.table_name().to_string();
        let invalid = |reason: String| DbError::InvalidDescriptor {
            table: table.clone(),
            reason,
        };

        if table.is_empty() {
            return Err(invalid("table name is empty".to_string()));
        }
        if self.id_column.is_empty() {
            return Err(invalid("identity column name is empty".to_string()));
        }

        let mut keys = HashSet::new();
        let mut columns = HashSet::new();
        columns.insert(self.id_column.to_ascii_lowercase());

        for field in &self.fields {
            if field.key_name().is_empty() {
                return Err(invalid("field key name is empty".to_string()));
            }
            if !keys.insert(field.key_name()) {
                return Err(invalid(format!("duplicate field '{}'", field.key_name())));
            }
            if !columns.insert(field.physical_name().to_ascii_lowercase()) {
                return Err(invalid(format!(
                    "column '{}' is declared twice or collides with the identity column",
                    field.physical_name()
                )));
            }
        }

        for index in self.table.indexes() {
            if index.fields.is_empty() {
                return Err(invalid(format!("index '{}' has no fields", index.name)));
            }
            for field in &index.fields {
                if self.field(field.key_name()).is_none() {
                    return Err(invalid(format!(
                        "index '{}' names undeclared field '{}'",
                        index.name,
                        field.key_name()
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Explicit set of persisted model types
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    entries: Vec<ModelEntry>,
    /// Registered model type → index into `entries`
    types: HashMap<TypeId, usize>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a model type. Registering the same type twice is a no-op.
    pub fn register<T: Model>(&mut self) -> DbResult<&mut Self> {
        let type_id = TypeId::of::<T>();
        if self.types.contains_key(&type_id) {
            return Ok(self);
        }
        self.add_entry(ModelEntry::of::<T>())?;
        self.types.insert(type_id, self.entries.len() - 1);
        Ok(self)
    }

    /// Builder-style [`ModelRegistry::register`]
    pub fn with<T: Model>(mut self) -> DbResult<Self> {
        self.register::<T>()?;
        Ok(self)
    }

    /// Register raw metadata without a backing type
    pub fn add_entry(&mut self, entry: ModelEntry) -> DbResult<&mut Self> {
        entry.validate()?;

        if self.entry(entry.table_name()).is_some() {
            return Err(DbError::InvalidDescriptor {
                table: entry.table_name().to_string(),
                reason: "another registered model uses the same table".to_string(),
            });
        }

        self.entries.push(entry);
        self.warn_dangling_targets();
        Ok(self)
    }

    pub fn entries(&self) -> &[ModelEntry] {
        &self.entries
    }

    /// Entry for a physical table name, ignoring ASCII case as SQLite does
    pub fn entry(&self, table_name: &str) -> Option<&ModelEntry> {
        self.entries
            .iter()
            .find(|e| e.table_name().eq_ignore_ascii_case(table_name))
    }

    /// Entry registered for the model type `T`
    ///
    /// Raw entries added through [`ModelRegistry::add_entry`] have no backing
    /// type and are never returned here, even when `T` shares their table.
    pub fn entry_for<T: Model>(&self) -> DbResult<&ModelEntry> {
        self.types
            .get(&TypeId::of::<T>())
            .and_then(|&index| self.entries.get(index))
            .ok_or_else(|| DbError::UnregisteredModel {
                table: T::table().physical_name().to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Log guard constraints whose target table is not (yet) registered
    fn warn_dangling_targets(&self) {
        let Some(latest) = self.entries.last() else {
            return;
        };
        for field in &latest.fields {
            for target in field.networked_targets() {
                if self.entry(target).is_none() {
                    warn!(
                        table = latest.table_name(),
                        field = field.key_name(),
                        target_table = target,
                        "delete guard targets a table that is not registered yet"
                    );
                }
            }
        }
    }
}

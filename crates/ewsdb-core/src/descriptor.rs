//! Field and table descriptors
//!
//! Descriptors are the static metadata a [`Model`](crate::Model) declares:
//! one [`FieldDescriptor`] per column and one [`TableDescriptor`] per table.
//! All SQL generated by the schema manager and the engine is derived from
//! them.

use std::fmt;

/// Declared data type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Text,
    Numeric,
    Integer,
    /// Identity of a row in another (or the same) table
    RecordId,
    Real,
    Blob,
    DateTime,
    /// Stored as 0 or 1
    Bool,
}

impl DataType {
    /// Column type used in `CREATE TABLE`
    pub fn sql_type(self) -> &'static str {
        match self {
            DataType::Text => "TEXT",
            DataType::Numeric => "NUMERIC",
            DataType::Integer => "INTEGER",
            DataType::RecordId => "INTEGER",
            DataType::Real => "REAL",
            DataType::Blob => "BLOB",
            DataType::DateTime => "TEXT",
            DataType::Bool => "INTEGER",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DataType::Text => "text",
            DataType::Numeric => "numeric",
            DataType::Integer => "integer",
            DataType::RecordId => "recordID",
            DataType::Real => "real",
            DataType::Blob => "blob",
            DataType::DateTime => "dateTime",
            DataType::Bool => "bool",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Constraint attached to a field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constraint {
    NotNull,
    /// Rows holding a value in this field block deletion of the row it
    /// points to in `target_table` (a physical table name).
    NoDeletionIfNetworked { target_table: String },
}

/// Metadata for one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    key_name: String,
    physical_name: Option<String>,
    data_type: DataType,
    constraints: Vec<Constraint>,
}

impl FieldDescriptor {
    pub fn new(key_name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            key_name: key_name.into(),
            physical_name: None,
            data_type,
            constraints: Vec::new(),
        }
    }

    /// Store the field under a column name different from its key name
    pub fn column(mut self, physical_name: impl Into<String>) -> Self {
        self.physical_name = Some(physical_name.into());
        self
    }

    /// Add a constraint. Constraints form a set; duplicates are ignored.
    pub fn constraint(mut self, constraint: Constraint) -> Self {
        if !self.constraints.contains(&constraint) {
            self.constraints.push(constraint);
        }
        self
    }

    pub fn not_null(self) -> Self {
        self.constraint(Constraint::NotNull)
    }

    pub fn no_deletion_if_networked(self, target_table: impl Into<String>) -> Self {
        self.constraint(Constraint::NoDeletionIfNetworked {
            target_table: target_table.into(),
        })
    }

    /// Logical name, used as the keyed data map key
    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Column name, defaulting to the key name
    pub fn physical_name(&self) -> &str {
        self.physical_name.as_deref().unwrap_or(&self.key_name)
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn is_not_null(&self) -> bool {
        self.constraints
            .iter()
            .any(|c| matches!(c, Constraint::NotNull))
    }

    /// Tables this field guards against deletion of referenced rows
    pub fn networked_targets(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().filter_map(|c| match c {
            Constraint::NoDeletionIfNetworked { target_table } => Some(target_table.as_str()),
            Constraint::NotNull => None,
        })
    }
}

/// Secondary index over an ordered list of fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index {
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    pub unique: bool,
}

impl Index {
    pub fn new(name: impl Into<String>, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        Self {
            name: name.into(),
            fields: fields.into_iter().collect(),
            unique: false,
        }
    }

    pub fn unique(name: impl Into<String>, fields: impl IntoIterator<Item = FieldDescriptor>) -> Self {
        Self {
            unique: true,
            ..Self::new(name, fields)
        }
    }
}

/// Metadata for one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    key_name: String,
    physical_name: Option<String>,
    indexes: Vec<Index>,
}

impl TableDescriptor {
    pub fn new(key_name: impl Into<String>) -> Self {
        Self {
            key_name: key_name.into(),
            physical_name: None,
            indexes: Vec::new(),
        }
    }

    /// Store the table under a name different from its key name
    pub fn physical(mut self, physical_name: impl Into<String>) -> Self {
        self.physical_name = Some(physical_name.into());
        self
    }

    pub fn index(mut self, index: Index) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    /// Table name used in SQL, defaulting to the key name
    pub fn physical_name(&self) -> &str {
        self.physical_name.as_deref().unwrap_or(&self.key_name)
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }
}

/// Quote an identifier for use in generated SQL
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

//! Models persisted by the CLI
//!
//! A book points at its author; an author cannot be deleted while any book
//! still does.

use chrono::{DateTime, Utc};
use serde::Serialize;

use ewsdb_core::{
    BindingError, DataMap, DataType, FieldDescriptor, Index, Model, RecordId, TableDescriptor,
};

/// A book author
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub id: Option<RecordId>,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Author {
    pub fn new(name: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            email,
            created_at: Utc::now(),
        }
    }

    fn name_field() -> FieldDescriptor {
        FieldDescriptor::new("name", DataType::Text).not_null()
    }
}

impl Model for Author {
    fn table() -> TableDescriptor {
        TableDescriptor::new("Author")
            .physical("authors")
            .index(Index::unique("idx_authors_name", [Self::name_field()]))
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            Self::name_field(),
            FieldDescriptor::new("email", DataType::Text),
            FieldDescriptor::new("createdAt", DataType::DateTime)
                .column("created_at")
                .not_null(),
        ]
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn id_key() -> &'static str {
        "id"
    }

    fn record_id(&self) -> Option<RecordId> {
        self.id
    }

    fn to_data_map(&self) -> DataMap {
        DataMap::new()
            .with(Self::id_key(), self.id)
            .with("name", self.name.as_str())
            .with("email", self.email.clone())
            .with("createdAt", self.created_at)
    }

    fn from_data_map(map: &DataMap) -> Result<Self, BindingError> {
        Ok(Self {
            id: map.optional(Self::id_key())?,
            name: map.require("name")?,
            email: map.optional("email")?,
            created_at: map.require("createdAt")?,
        })
    }
}

/// A book, written by one author
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Book {
    pub id: Option<RecordId>,
    pub title: String,
    pub author: RecordId,
    pub year: Option<i32>,
    pub rating: Option<f64>,
    pub read: bool,
}

impl Book {
    pub fn new(title: impl Into<String>, author: RecordId) -> Self {
        Self {
            id: None,
            title: title.into(),
            author,
            year: None,
            rating: None,
            read: false,
        }
    }

    fn author_field() -> FieldDescriptor {
        FieldDescriptor::new("author", DataType::RecordId)
            .column("author_id")
            .not_null()
            .no_deletion_if_networked(Author::table().physical_name())
    }
}

impl Model for Book {
    fn table() -> TableDescriptor {
        TableDescriptor::new("Book")
            .physical("books")
            .index(Index::new("idx_books_author", [Self::author_field()]))
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("title", DataType::Text).not_null(),
            Self::author_field(),
            FieldDescriptor::new("year", DataType::Integer),
            FieldDescriptor::new("rating", DataType::Real),
            FieldDescriptor::new("read", DataType::Bool).not_null(),
        ]
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn id_key() -> &'static str {
        "id"
    }

    fn record_id(&self) -> Option<RecordId> {
        self.id
    }

    fn to_data_map(&self) -> DataMap {
        DataMap::new()
            .with(Self::id_key(), self.id)
            .with("title", self.title.as_str())
            .with("author", self.author)
            .with("year", self.year)
            .with("rating", self.rating)
            .with("read", self.read)
    }

    fn from_data_map(map: &DataMap) -> Result<Self, BindingError> {
        Ok(Self {
            id: map.optional(Self::id_key())?,
            title: map.require("title")?,
            author: map.require("author")?,
            year: map.optional("year")?,
            rating: map.optional("rating")?,
            read: map.require("read")?,
        })
    }
}

//! Fixture models shared by the unit tests

use chrono::{DateTime, Utc};

use crate::descriptor::{DataType, FieldDescriptor, Index, TableDescriptor};
use crate::error::BindingError;
use crate::model::Model;
use crate::record_id::RecordId;
use crate::registry::ModelRegistry;
use crate::value::DataMap;

/// Person, FriendList and Attachment, registered in that order
pub fn test_registry() -> ModelRegistry {
    ModelRegistry::new()
        .with::<Person>()
        .and_then(|r| r.with::<FriendList>())
        .and_then(|r| r.with::<Attachment>())
        .unwrap()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub zid: Option<RecordId>,
    pub first_name: String,
    pub last_name: String,
    pub weight: f64,
    pub age: i32,
    pub time_stamp: DateTime<Utc>,
}

impl Person {
    pub fn new(
        first_name: &str,
        last_name: &str,
        weight: f64,
        age: i32,
        time_stamp: DateTime<Utc>,
    ) -> Self {
        Self {
            zid: None,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            weight,
            age,
            time_stamp,
        }
    }

    fn first_name_field() -> FieldDescriptor {
        FieldDescriptor::new("firstName", DataType::Text).not_null()
    }

    fn last_name_field() -> FieldDescriptor {
        FieldDescriptor::new("lastName", DataType::Text).not_null()
    }
}

impl Model for Person {
    fn table() -> TableDescriptor {
        TableDescriptor::new("Person").physical("People").index(Index::unique(
            "idx_last_first",
            [Self::last_name_field(), Self::first_name_field()],
        ))
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            Self::first_name_field(),
            Self::last_name_field(),
            FieldDescriptor::new("weight", DataType::Real)
                .column("WeightField")
                .not_null(),
            FieldDescriptor::new("age", DataType::Integer).not_null(),
            FieldDescriptor::new("timeStamp", DataType::DateTime).not_null(),
        ]
    }

    fn record_id(&self) -> Option<RecordId> {
        self.zid
    }

    fn to_data_map(&self) -> DataMap {
        DataMap::new()
            .with(Self::id_key(), self.zid)
            .with("firstName", self.first_name.as_str())
            .with("lastName", self.last_name.as_str())
            .with("weight", self.weight)
            .with("age", self.age)
            .with("timeStamp", self.time_stamp)
    }

    fn from_data_map(map: &DataMap) -> Result<Self, BindingError> {
        Ok(Self {
            zid: map.optional(Self::id_key())?,
            first_name: map.require("firstName")?,
            last_name: map.require("lastName")?,
            weight: map.require("weight")?,
            age: map.require("age")?,
            time_stamp: map.require("timeStamp")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FriendList {
    pub zid: Option<RecordId>,
    pub list_name: String,
    pub friend1: RecordId,
    pub friend2: RecordId,
}

impl FriendList {
    pub fn new(list_name: &str, friend1: RecordId, friend2: RecordId) -> Self {
        Self {
            zid: None,
            list_name: list_name.to_string(),
            friend1,
            friend2,
        }
    }
}

impl Model for FriendList {
    fn table() -> TableDescriptor {
        TableDescriptor::new("FriendList")
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("listName", DataType::Text).not_null(),
            FieldDescriptor::new("friend1", DataType::RecordId)
                .not_null()
                .no_deletion_if_networked(Person::table().physical_name()),
            FieldDescriptor::new("friend2", DataType::RecordId).not_null(),
        ]
    }

    fn record_id(&self) -> Option<RecordId> {
        self.zid
    }

    fn to_data_map(&self) -> DataMap {
        DataMap::new()
            .with(Self::id_key(), self.zid)
            .with("listName", self.list_name.as_str())
            .with("friend1", self.friend1)
            .with("friend2", self.friend2)
    }

    fn from_data_map(map: &DataMap) -> Result<Self, BindingError> {
        Ok(Self {
            zid: map.optional(Self::id_key())?,
            list_name: map.require("listName")?,
            friend1: map.require("friend1")?,
            friend2: map.require("friend2")?,
        })
    }
}

/// Covers blob, bool, numeric, nullable fields and identity overrides
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub id: Option<RecordId>,
    pub name: String,
    pub payload: Vec<u8>,
    pub archived: bool,
    pub score: Option<f64>,
    pub owner: Option<RecordId>,
}

impl Attachment {
    fn owner_field() -> FieldDescriptor {
        FieldDescriptor::new("owner", DataType::RecordId).no_deletion_if_networked("People")
    }
}

impl Model for Attachment {
    fn table() -> TableDescriptor {
        TableDescriptor::new("Attachment")
            .physical("attachments")
            .index(Index::new("idx_attachments_owner", [Self::owner_field()]))
    }

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("name", DataType::Text).not_null(),
            FieldDescriptor::new("payload", DataType::Blob).not_null(),
            FieldDescriptor::new("archived", DataType::Bool).not_null(),
            FieldDescriptor::new("score", DataType::Numeric),
            Self::owner_field(),
        ]
    }

    fn id_column() -> &'static str {
        "attachment_id"
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
            .with("payload", self.payload.clone())
            .with("archived", self.archived)
            .with("score", self.score)
            .with("owner", self.owner)
    }

    fn from_data_map(map: &DataMap) -> Result<Self, BindingError> {
        Ok(Self {
            id: map.optional(Self::id_key())?,
            name: map.require("name")?,
            payload: map.require("payload")?,
            archived: map.require("archived")?,
            score: map.optional("score")?,
            owner: map.optional("owner")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_data_map_round_trip() {
        let person = Person::new("Eric", "Schramm", 123.456, 41, Utc::now());
        let map = person.to_data_map();

        assert_eq!(map.get("zID"), Some(&crate::Value::Null));
        assert_eq!(Person::from_data_map(&map).unwrap(), person);
    }

    #[test]
    fn test_missing_field_fails_construction() {
        let map = DataMap::new().with("listName", "x").with("friend1", RecordId::new(1));
        let err = FriendList::from_data_map(&map).unwrap_err();
        assert_eq!(
            err,
            BindingError::MissingField {
                key: "friend2".to_string()
            }
        );
    }
}

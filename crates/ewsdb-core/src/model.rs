//! Model contract
//!
//! A model is a plain value type that knows its own table metadata and how
//! to convert itself to and from a [`DataMap`]. The engine implements save,
//! fetch and delete once against this trait.
//!
//! ```ignore
//! struct Person { id: Option<RecordId>, name: String }
//!
//! impl Model for Person {
//!     fn table() -> TableDescriptor { TableDescriptor::new("Person").physical("People") }
//!     fn fields() -> Vec<FieldDescriptor> {
//!         vec![FieldDescriptor::new("name", DataType::Text).not_null()]
//!     }
//!     fn record_id(&self) -> Option<RecordId> { self.id }
//!     fn to_data_map(&self) -> DataMap {
//!         DataMap::new().with(Self::id_key(), self.id).with("name", self.name.as_str())
//!     }
//!     fn from_data_map(map: &DataMap) -> Result<Self, BindingError> {
//!         Ok(Self { id: map.optional(Self::id_key())?, name: map.require("name")? })
//!     }
//! }
//! ```

use crate::descriptor::{FieldDescriptor, TableDescriptor};
use crate::error::BindingError;
use crate::record_id::RecordId;
use crate::value::DataMap;

/// Default identity column and data map key
pub const DEFAULT_ID_COLUMN: &str = "zID";

/// Capability every persisted type implements
pub trait Model: Sized + 'static {
    /// Table metadata, including secondary indexes
    fn table() -> TableDescriptor;

    /// One descriptor per persisted field, in column order
    fn fields() -> Vec<FieldDescriptor>;

    /// Physical name of the identity column
    fn id_column() -> &'static str {
        DEFAULT_ID_COLUMN
    }

    /// Key under which the identity appears in the data map
    fn id_key() -> &'static str {
        DEFAULT_ID_COLUMN
    }

    /// Identity of this instance, `None` until first saved
    fn record_id(&self) -> Option<RecordId>;

    /// Convert to a keyed data map (identity included under [`Model::id_key`])
    fn to_data_map(&self) -> DataMap;

    /// Reconstruct from a keyed data map
    fn from_data_map(map: &DataMap) -> Result<Self, BindingError>;
}

//! Shared data model of the templar pipeline.
//!
//! Resources are structured records made of property terms holding ordered
//! lists of typed [`Value`]s. Templates declare, per property, the rules the
//! enrichment and validation stages apply. Everything here is plain data:
//! no storage access, no logging.
//!
//! ```
//! use model::{DataType, ResourceFields, ResourceKind, Value};
//!
//! let fields = ResourceFields::new(ResourceKind::Item)
//!     .with_public(true)
//!     .with_value(Value::literal("dcterms:title", "Atlas"))
//!     .with_value(Value::resource("dcterms:creator", 12).with_data_type("resource:item"));
//!
//! assert_eq!(fields.properties.get("dcterms:title").len(), 1);
//! assert_eq!(
//!     fields.properties.get("dcterms:creator")[0].data_type,
//!     DataType::new("resource:item")
//! );
//! ```
mod error;
mod resource;
mod settings;
mod template;
mod types;
mod value;
mod violation;

pub use crate::error::ModelError;
pub use crate::resource::{MediaRef, PropertyMap, PropertyValues, Resource, ResourceFields};
pub use crate::settings::{parse_params, value_is_true, Settings};
pub use crate::template::{
    AnnotationTemplateChoice, AutomaticValue, DataSet, OrderKey, PropertyBinding, SortDirection,
    Template, TemplateSettings,
};
pub use crate::types::{ClassId, DataType, MainType, ResourceId, ResourceKind, TemplateId, VocabularyId};
pub use crate::value::{Annotation, PayloadKey, Value, ValuePayload};
pub use crate::violation::{Violation, ViolationKind, ViolationSet, ViolationTarget};

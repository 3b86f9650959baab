//! Values and the payload variants they carry.
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::ModelError;
use crate::resource::ResourceFields;
use crate::types::{DataType, MainType, ResourceId};

/// Exactly one payload per value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ValuePayload {
    /// Literal text.
    Literal(String),
    /// URI string.
    Uri(String),
    /// Reference to another stored resource.
    Resource(ResourceId),
    /// Nested annotation sub-record.
    Annotation(Box<Annotation>),
}

impl ValuePayload {
    pub fn main_type(&self) -> Option<MainType> {
        match self {
            ValuePayload::Literal(_) => Some(MainType::Literal),
            ValuePayload::Uri(_) => Some(MainType::Uri),
            ValuePayload::Resource(_) => Some(MainType::Resource),
            ValuePayload::Annotation(_) => None,
        }
    }
}

/// One metadata entry under a property.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Value {
    /// Property term (`dcterms:title`).
    pub property: String,
    pub data_type: DataType,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub payload: ValuePayload,
}

fn default_public() -> bool {
    true
}

impl Value {
    pub fn literal(property: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            data_type: DataType::literal(),
            is_public: true,
            language: None,
            payload: ValuePayload::Literal(text.into()),
        }
    }

    pub fn uri(property: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            data_type: DataType::uri(),
            is_public: true,
            language: None,
            payload: ValuePayload::Uri(uri.into()),
        }
    }

    pub fn resource(property: impl Into<String>, id: ResourceId) -> Self {
        Self {
            property: property.into(),
            data_type: DataType::resource(),
            is_public: true,
            language: None,
            payload: ValuePayload::Resource(id),
        }
    }

    pub fn annotation(property: impl Into<String>, annotation: Annotation) -> Self {
        Self {
            property: property.into(),
            data_type: DataType::literal(),
            is_public: true,
            language: None,
            payload: ValuePayload::Annotation(Box::new(annotation)),
        }
    }

    /// Builds a value from its JSON-LD-like object form:
    /// `{"type": ..., "@value": ...}`, `{"type": ..., "@id": ...}` or
    /// `{"type": ..., "value_resource_id": ...}`.
    ///
    /// The payload key read depends on the main type of `type`; a missing
    /// `type` reads as `literal`.
    pub fn from_object(
        property: impl Into<String>,
        object: &Map<String, JsonValue>,
    ) -> Result<Self, ModelError> {
        let data_type = object
            .get("type")
            .and_then(JsonValue::as_str)
            .map(DataType::new)
            .unwrap_or_else(DataType::literal);
        let invalid = |reason: &str| ModelError::InvalidPayload {
            data_type: data_type.to_string(),
            reason: reason.to_string(),
        };
        let payload = match data_type.main() {
            MainType::Resource => {
                let id = match object.get("value_resource_id") {
                    Some(JsonValue::Number(number)) => number.as_u64(),
                    Some(JsonValue::String(text)) => text.trim().parse().ok(),
                    _ => None,
                }
                .filter(|id| *id > 0)
                .ok_or_else(|| invalid("missing value_resource_id"))?;
                ValuePayload::Resource(id)
            }
            MainType::Uri => {
                let uri = object
                    .get("@id")
                    .and_then(JsonValue::as_str)
                    .map(str::trim)
                    .filter(|uri| !uri.is_empty())
                    .ok_or_else(|| invalid("missing @id"))?;
                ValuePayload::Uri(uri.to_string())
            }
            MainType::Literal => {
                let text = match object.get("@value") {
                    Some(JsonValue::String(text)) => text.clone(),
                    Some(JsonValue::Number(number)) => number.to_string(),
                    Some(JsonValue::Bool(flag)) => flag.to_string(),
                    _ => return Err(invalid("missing @value")),
                };
                ValuePayload::Literal(text)
            }
        };
        let is_public = object
            .get("is_public")
            .map(crate::settings::value_is_true)
            .unwrap_or(true);
        let language = object
            .get("@language")
            .and_then(JsonValue::as_str)
            .filter(|lang| !lang.is_empty())
            .map(str::to_string);
        Ok(Self {
            property: property.into(),
            data_type,
            is_public,
            language,
            payload,
        })
    }

    pub fn with_data_type(mut self, data_type: impl Into<DataType>) -> Self {
        self.data_type = data_type.into();
        self
    }

    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn literal_text(&self) -> Option<&str> {
        match &self.payload {
            ValuePayload::Literal(text) => Some(text),
            _ => None,
        }
    }

    pub fn linked_resource(&self) -> Option<ResourceId> {
        match self.payload {
            ValuePayload::Resource(id) => Some(id),
            _ => None,
        }
    }

    pub fn annotation_ref(&self) -> Option<&Annotation> {
        match &self.payload {
            ValuePayload::Annotation(annotation) => Some(annotation),
            _ => None,
        }
    }

    pub fn annotation_mut(&mut self) -> Option<&mut Annotation> {
        match &mut self.payload {
            ValuePayload::Annotation(annotation) => Some(annotation),
            _ => None,
        }
    }

    /// Plain text of the value: literal text or the URI string.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            ValuePayload::Literal(text) | ValuePayload::Uri(text) => Some(text),
            _ => None,
        }
    }

    /// Exact comparison key, as stored.
    pub fn payload_key(&self) -> Option<PayloadKey> {
        PayloadKey::exact(&self.payload)
    }

    /// Comparison key with literal and URI text trimmed.
    pub fn dedup_key(&self) -> Option<PayloadKey> {
        PayloadKey::normalized(&self.payload)
    }
}

/// Payload-type-specific key used for duplicate detection and uniqueness.
///
/// Annotation payloads have no key: they are never duplicates of anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PayloadKey {
    Resource(ResourceId),
    Uri(String),
    Literal(String),
}

impl PayloadKey {
    pub fn exact(payload: &ValuePayload) -> Option<Self> {
        match payload {
            ValuePayload::Literal(text) => Some(PayloadKey::Literal(text.clone())),
            ValuePayload::Uri(uri) => Some(PayloadKey::Uri(uri.clone())),
            ValuePayload::Resource(id) => Some(PayloadKey::Resource(*id)),
            ValuePayload::Annotation(_) => None,
        }
    }

    pub fn normalized(payload: &ValuePayload) -> Option<Self> {
        match payload {
            ValuePayload::Literal(text) => Some(PayloadKey::Literal(text.trim().to_string())),
            ValuePayload::Uri(uri) => Some(PayloadKey::Uri(uri.trim().to_string())),
            ValuePayload::Resource(id) => Some(PayloadKey::Resource(*id)),
            ValuePayload::Annotation(_) => None,
        }
    }
}

/// Resource-like sub-record qualifying a single value.
///
/// The identifier is only known once the owning resource has been committed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Annotation {
    #[serde(default)]
    pub id: Option<ResourceId>,
    pub fields: ResourceFields,
}

impl Annotation {
    pub fn new(fields: ResourceFields) -> Self {
        Self { id: None, fields }
    }
}

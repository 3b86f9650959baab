//! Resources and their ordered property maps.
//!
//! Two shapes flow through the pipeline, mirroring the write lifecycle:
//!
//! ```text
//! ResourceFields  (write request, mutated by enrichment)
//!        │ hydrate (storage layer)
//!        ▼
//! Resource        (hydrated entity, inspected by validation)
//! ```
//!
//! Both carry a [`PropertyMap`]: property term to an ordered list of values,
//! iterated in insertion order.
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::types::{ClassId, ResourceId, ResourceKind, TemplateId};
use crate::value::{PayloadKey, Value};

/// Values stored under one property term.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyValues {
    pub term: String,
    pub values: Vec<Value>,
}

/// Insertion-ordered mapping from property term to values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct PropertyMap {
    entries: Vec<PropertyValues>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of property terms present (empty lists included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Values under `term`, empty when the term is absent.
    pub fn get(&self, term: &str) -> &[Value] {
        self.entries
            .iter()
            .find(|entry| entry.term == term)
            .map(|entry| entry.values.as_slice())
            .unwrap_or(&[])
    }

    pub fn get_mut(&mut self, term: &str) -> Option<&mut Vec<Value>> {
        self.entries
            .iter_mut()
            .find(|entry| entry.term == term)
            .map(|entry| &mut entry.values)
    }

    /// Values under `term`, inserting an empty list at the end when absent.
    pub fn entry(&mut self, term: &str) -> &mut Vec<Value> {
        let position = match self.entries.iter().position(|entry| entry.term == term) {
            Some(position) => position,
            None => {
                self.entries.push(PropertyValues {
                    term: term.to_string(),
                    values: Vec::new(),
                });
                self.entries.len() - 1
            }
        };
        &mut self.entries[position].values
    }

    /// Appends a value under its own property term.
    pub fn push(&mut self, value: Value) {
        let term = value.property.clone();
        self.entry(&term).push(value);
    }

    /// Replaces the values under `term`, keeping its position.
    pub fn set(&mut self, term: &str, values: Vec<Value>) {
        *self.entry(term) = values;
    }

    pub fn remove(&mut self, term: &str) -> Option<Vec<Value>> {
        let position = self.entries.iter().position(|entry| entry.term == term)?;
        Some(self.entries.remove(position).values)
    }

    pub fn has_values(&self, term: &str) -> bool {
        !self.get(term).is_empty()
    }

    /// True when a value under `term` has the same trimmed payload key.
    pub fn contains_payload(&self, term: &str, key: &PayloadKey) -> bool {
        self.get(term)
            .iter()
            .any(|value| value.dedup_key().as_ref() == Some(key))
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.term.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.entries
            .iter()
            .map(|entry| (entry.term.as_str(), entry.values.as_slice()))
    }

    /// Every value of every property, in order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().flat_map(|entry| entry.values.iter())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.entries.iter_mut().flat_map(|entry| entry.values.iter_mut())
    }
}

impl FromIterator<Value> for PropertyMap {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let mut map = PropertyMap::new();
        for value in iter {
            map.push(value);
        }
        map
    }
}

/// A media child as seen from its parent item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MediaRef {
    #[serde(default)]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub template: Option<TemplateId>,
    #[serde(default)]
    pub template_label: Option<String>,
}

/// Field map of a create or update request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceFields {
    /// Set for updates, empty for creates.
    #[serde(default)]
    pub id: Option<ResourceId>,
    pub kind: ResourceKind,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub template: Option<TemplateId>,
    #[serde(default)]
    pub class: Option<ClassId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub item_sets: Vec<ResourceId>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub properties: PropertyMap,
}

impl ResourceFields {
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            id: None,
            kind,
            is_public: false,
            template: None,
            class: None,
            title: None,
            item_sets: Vec::new(),
            media: Vec::new(),
            properties: PropertyMap::new(),
        }
    }

    /// Decodes a write request from JSON.
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        serde_json::from_str(text).map_err(|err| ModelError::decode("resource fields", err))
    }

    pub fn with_template(mut self, template: TemplateId) -> Self {
        self.template = Some(template);
        self
    }

    pub fn with_public(mut self, is_public: bool) -> Self {
        self.is_public = is_public;
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.properties.push(value);
        self
    }
}

/// Hydrated entity, as the storage layer is about to persist it.
///
/// `id` stays empty for a create until the enclosing transaction commits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Resource {
    #[serde(default)]
    pub id: Option<ResourceId>,
    pub kind: ResourceKind,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub template: Option<TemplateId>,
    #[serde(default)]
    pub class: Option<ClassId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub item_sets: Vec<ResourceId>,
    #[serde(default)]
    pub media: Vec<MediaRef>,
    #[serde(default)]
    pub properties: PropertyMap,
}

impl Resource {
    /// Title when present and non-empty.
    pub fn display_title(&self) -> Option<&str> {
        self.title.as_deref().filter(|title| !title.is_empty())
    }
}

impl From<ResourceFields> for Resource {
    fn from(fields: ResourceFields) -> Self {
        let ResourceFields {
            id,
            kind,
            is_public,
            template,
            class,
            title,
            item_sets,
            media,
            properties,
        } = fields;
        Self {
            id,
            kind,
            is_public,
            template,
            class,
            title,
            item_sets,
            media,
            properties,
        }
    }
}

impl From<Resource> for ResourceFields {
    fn from(resource: Resource) -> Self {
        let Resource {
            id,
            kind,
            is_public,
            template,
            class,
            title,
            item_sets,
            media,
            properties,
        } = resource;
        Self {
            id,
            kind,
            is_public,
            template,
            class,
            title,
            item_sets,
            media,
            properties,
        }
    }
}

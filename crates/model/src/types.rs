//! Identifiers, structural kinds and data-type tags shared by every stage.
//!
//! Identifiers are plain integers handed out by the external storage layer.
//! Data types are open-ended string tags (`literal`, `uri`, `resource:item`,
//! `customvocab:12`, ...) because the host application registers them at
//! runtime; [`DataType::main`] folds any tag onto the three payload families
//! the pipeline actually reasons about.
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a stored resource (item, item set, media, annotation).
pub type ResourceId = u64;
/// Identifier of a template.
pub type TemplateId = u64;
/// Identifier of a resource class.
pub type ClassId = u64;
/// Identifier of a vocabulary term list.
pub type VocabularyId = u64;

/// Structural kind of a resource.
///
/// The kind decides which template rules apply: automatic item sets and media
/// minimums only make sense for [`ResourceKind::Item`], the aggregate kind
/// that owns media children and belongs to item sets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Aggregate record: owns media, may belong to item sets.
    Item,
    /// Container grouping items.
    ItemSet,
    /// Leaf attached to an item.
    Media,
    /// Stand-alone annotation record.
    Annotation,
    /// Sub-record qualifying a single value.
    ValueAnnotation,
}

impl ResourceKind {
    /// Resource name as listed in a template's allowed kinds.
    pub fn resource_name(self) -> &'static str {
        match self {
            ResourceKind::Item => "items",
            ResourceKind::ItemSet => "item_sets",
            ResourceKind::Media => "media",
            ResourceKind::Annotation => "annotations",
            ResourceKind::ValueAnnotation => "value_annotations",
        }
    }

    /// Parses either the resource name (`items`) or the JSON-LD type (`o:Item`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "items" | "item" | "o:Item" => Some(ResourceKind::Item),
            "item_sets" | "item_set" | "o:ItemSet" => Some(ResourceKind::ItemSet),
            "media" | "o:Media" => Some(ResourceKind::Media),
            "annotations" | "annotation" | "oa:Annotation" => Some(ResourceKind::Annotation),
            "value_annotations" | "value_annotation" | "o:ValueAnnotation" => {
                Some(ResourceKind::ValueAnnotation)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.resource_name())
    }
}

/// Payload family a data type stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MainType {
    Literal,
    Uri,
    Resource,
}

/// Data-type tag carried by a value and declared by a data set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct DataType(String);

impl DataType {
    pub const LITERAL: &'static str = "literal";
    pub const URI: &'static str = "uri";
    pub const RESOURCE: &'static str = "resource";
    const CUSTOM_VOCAB_PREFIX: &'static str = "customvocab:";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn literal() -> Self {
        Self(Self::LITERAL.to_string())
    }

    pub fn uri() -> Self {
        Self(Self::URI.to_string())
    }

    pub fn resource() -> Self {
        Self(Self::RESOURCE.to_string())
    }

    pub fn custom_vocab(id: VocabularyId) -> Self {
        Self(format!("{}{id}", Self::CUSTOM_VOCAB_PREFIX))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True only for the plain `literal` tag.
    pub fn is_plain_literal(&self) -> bool {
        self.0 == Self::LITERAL
    }

    /// Payload family of this tag.
    ///
    /// `resource`, `resource:*` map to resources; `uri`, `uri:*` and
    /// `valuesuggest:*` map to URIs; everything else (including vocabulary
    /// backed tags) stores literal text.
    pub fn main(&self) -> MainType {
        let tag = self.0.as_str();
        if tag == Self::RESOURCE || tag.starts_with("resource:") {
            MainType::Resource
        } else if tag == Self::URI || tag.starts_with("uri:") || tag.starts_with("valuesuggest:")
        {
            MainType::Uri
        } else {
            MainType::Literal
        }
    }

    /// Vocabulary id when the tag is vocabulary backed (`customvocab:<id>`).
    pub fn vocabulary_id(&self) -> Option<VocabularyId> {
        self.0
            .strip_prefix(Self::CUSTOM_VOCAB_PREFIX)
            .and_then(|id| id.trim().parse().ok())
    }
}

impl From<&str> for DataType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_type_folds_prefixed_tags() {
        assert_eq!(DataType::new("resource:item").main(), MainType::Resource);
        assert_eq!(DataType::resource().main(), MainType::Resource);
        assert_eq!(DataType::new("valuesuggest:geonames").main(), MainType::Uri);
        assert_eq!(DataType::uri().main(), MainType::Uri);
        assert_eq!(DataType::custom_vocab(3).main(), MainType::Literal);
        assert_eq!(DataType::new("numeric:timestamp").main(), MainType::Literal);
    }

    #[test]
    fn vocabulary_id_only_for_custom_vocab_tags() {
        assert_eq!(DataType::custom_vocab(12).vocabulary_id(), Some(12));
        assert_eq!(DataType::new("customvocab:x").vocabulary_id(), None);
        assert_eq!(DataType::literal().vocabulary_id(), None);
    }

    #[test]
    fn resource_kind_names_round_trip() {
        for kind in [
            ResourceKind::Item,
            ResourceKind::ItemSet,
            ResourceKind::Media,
            ResourceKind::Annotation,
            ResourceKind::ValueAnnotation,
        ] {
            assert_eq!(ResourceKind::from_name(kind.resource_name()), Some(kind));
        }
        assert_eq!(ResourceKind::from_name("o:Item"), Some(ResourceKind::Item));
        assert_eq!(ResourceKind::from_name("sites"), None);
    }
}

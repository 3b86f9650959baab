//! Structured validation failures.
//!
//! Violations are data, not errors: the validator accumulates every failure
//! into a [`ViolationSet`] keyed by [`ViolationTarget`] before the write is
//! accepted or rejected as a whole. [`ViolationKind`] derives
//! [`thiserror::Error`] only for its display messages.
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ClassId, ResourceId, ResourceKind};

/// What a violation is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "scope", content = "term", rename_all = "snake_case")]
pub enum ViolationTarget {
    /// A property term.
    Property(String),
    /// The template reference of the resource.
    Template,
    /// The class reference of the resource.
    Class,
    /// The media children of an item.
    Media,
}

impl ViolationTarget {
    pub fn property(term: impl Into<String>) -> Self {
        ViolationTarget::Property(term.into())
    }

    /// Error-store key, as the host application names its form fields.
    pub fn key(&self) -> &str {
        match self {
            ViolationTarget::Property(term) => term,
            ViolationTarget::Template => "o:resource_template[o:id]",
            ViolationTarget::Class => "o:resource_class[o:id]",
            ViolationTarget::Media => "o:media",
        }
    }
}

impl fmt::Display for ViolationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Reason a constraint failed.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum ViolationKind {
    #[error("value \"{value}\" does not follow the input pattern \"{pattern}\"")]
    Pattern { value: String, pattern: String },

    #[error("value is shorter ({length} characters) than the minimal size ({min} characters)")]
    TooShort { length: usize, min: usize },

    #[error("value is longer ({length} characters) than the maximal size ({max} characters)")]
    TooLong { length: usize, max: usize },

    #[error("number of values ({count}) is lower than the minimal number of {min}")]
    TooFewValues { count: usize, min: usize },

    #[error("number of values ({count}) is greater than the maximal number of {max}")]
    TooManyValues { count: usize, max: usize },

    #[error("value should be unique, but is already set for resource #{conflicting}")]
    NotUnique { conflicting: ResourceId },

    #[error("template \"{template}\" cannot be used for {kind}")]
    KindNotAllowed { template: String, kind: ResourceKind },

    #[error("template \"{template}\" requires a class")]
    ClassRequired { template: String },

    #[error("class #{class:?} is not allowed by template \"{template}\"")]
    ClassNotAllowed {
        template: String,
        class: Option<ClassId>,
    },

    #[error("template \"{template}\" requires at least {min} media")]
    MediaMinimum { template: String, min: usize },

    #[error("cannot append new terms to vocabulary #{vocabulary}: {reason}")]
    VocabularyAppend { vocabulary: u64, reason: String },
}

/// One failure, scoped to a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub target: ViolationTarget,
    pub kind: ViolationKind,
}

impl Violation {
    pub fn new(target: ViolationTarget, kind: ViolationKind) -> Self {
        Self { target, kind }
    }

    pub fn on_property(term: impl Into<String>, kind: ViolationKind) -> Self {
        Self::new(ViolationTarget::property(term), kind)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.kind)
    }
}

/// Ordered accumulation of violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViolationSet {
    violations: Vec<Violation>,
}

impl ViolationSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    pub fn add(&mut self, target: ViolationTarget, kind: ViolationKind) {
        self.push(Violation::new(target, kind));
    }

    pub fn extend(&mut self, other: ViolationSet) {
        self.violations.extend(other.violations);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Violations scoped to a property term.
    pub fn for_property<'a>(&'a self, term: &'a str) -> impl Iterator<Item = &'a Violation> + 'a {
        self.violations
            .iter()
            .filter(move |violation| violation.target.key() == term)
    }

    pub fn has_target(&self, target: &ViolationTarget) -> bool {
        self.violations.iter().any(|violation| &violation.target == target)
    }
}

impl fmt::Display for ViolationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, violation) in self.violations.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

impl IntoIterator for ViolationSet {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a ViolationSet {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl FromIterator<Violation> for ViolationSet {
    fn from_iter<T: IntoIterator<Item = Violation>>(iter: T) -> Self {
        Self {
            violations: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_keys_match_form_fields() {
        assert_eq!(ViolationTarget::Template.key(), "o:resource_template[o:id]");
        assert_eq!(ViolationTarget::Class.key(), "o:resource_class[o:id]");
        assert_eq!(ViolationTarget::Media.key(), "o:media");
        assert_eq!(ViolationTarget::property("dcterms:title").key(), "dcterms:title");
    }

    #[test]
    fn set_filters_by_property() {
        let mut set = ViolationSet::new();
        set.push(Violation::on_property(
            "dcterms:identifier",
            ViolationKind::NotUnique { conflicting: 3 },
        ));
        set.add(
            ViolationTarget::Class,
            ViolationKind::ClassRequired { template: "Book".into() },
        );
        assert_eq!(set.len(), 2);
        assert_eq!(set.for_property("dcterms:identifier").count(), 1);
        assert!(set.has_target(&ViolationTarget::Class));
        assert!(set.to_string().contains("already set for resource #3"));
    }
}

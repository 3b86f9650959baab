//! Closed term lists and their append-only store.
use model::VocabularyId;
use serde::{Deserialize, Serialize};

use crate::StoreError;

/// What a vocabulary enumerates. Only literal term lists can grow.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyKind {
    #[default]
    Literal,
    /// Backed by an item set.
    ItemSet,
    /// List of URIs with labels.
    Uri,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Vocabulary {
    pub id: VocabularyId,
    pub label: String,
    #[serde(default)]
    pub kind: VocabularyKind,
    #[serde(default)]
    pub terms: Vec<String>,
}

impl Vocabulary {
    pub fn literal(id: VocabularyId, label: impl Into<String>, terms: &[&str]) -> Self {
        Self {
            id,
            label: label.into(),
            kind: VocabularyKind::Literal,
            terms: terms.iter().map(|term| term.to_string()).collect(),
        }
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|known| known == term)
    }
}

/// Read and append-only update of term lists.
///
/// `append_terms` adds terms at the end and leaves existing terms in order.
/// Implementations are not required to serialize a read followed by an append
/// from two concurrent writers.
pub trait VocabularyStore: Send + Sync {
    fn vocabulary(&self, id: VocabularyId) -> Result<Option<Vocabulary>, StoreError>;

    fn append_terms(&self, id: VocabularyId, terms: &[String]) -> Result<(), StoreError>;
}

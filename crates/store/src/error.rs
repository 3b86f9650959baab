//! Errors surfaced by collaborator implementations.
use model::{ResourceId, TemplateId, VocabularyId};
use thiserror::Error;

/// Failure reported by a template repository, resource store, vocabulary
/// store or rule evaluator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    #[error("resource #{0} not found")]
    ResourceNotFound(ResourceId),

    #[error("template #{0} not found")]
    TemplateNotFound(TemplateId),

    #[error("vocabulary #{0} not found")]
    VocabularyNotFound(VocabularyId),

    #[error("vocabulary #{0} is read-only")]
    VocabularyReadOnly(VocabularyId),

    #[error("rule evaluation failed: {0}")]
    Evaluator(String),

    /// Storage failure (lock poisoning, I/O, driver error).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend<S: Into<String>>(message: S) -> Self {
        StoreError::Backend(message.into())
    }

    pub fn evaluator<S: Into<String>>(message: S) -> Self {
        StoreError::Evaluator(message.into())
    }
}

use store::StoreError;
use thiserror::Error;

/// Failure of one enrichment step.
///
/// Enrichment fails open: [`crate::Enricher::enrich`] logs these and restores
/// the field map for the failing step only. They surface directly when a host
/// calls a step on its own.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EnrichError {
    #[error("collaborator failure: {0}")]
    Store(#[from] StoreError),
}

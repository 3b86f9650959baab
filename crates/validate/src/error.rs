use store::StoreError;
use thiserror::Error;

/// Validation could not run to completion.
///
/// Distinct from a violation: a violation is a verdict on the resource, this
/// is a failure to reach one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidateError {
    #[error("uniqueness lookup failed: {0}")]
    Store(#[from] StoreError),
}

//! External collaborators of the templar pipeline.
//!
//! The pipeline never owns storage. It talks to the outside world through the
//! traits defined here:
//!
//! | Trait | Role |
//! |-------|------|
//! | [`TemplateRepository`] | read template snapshots |
//! | [`ResourceStore`] | read resources, hydrate and commit writes, uniqueness lookups |
//! | [`VocabularyStore`] | read term lists, append new terms |
//! | [`RuleEvaluator`] | evaluate automatic-value rule text (optional) |
//! | [`Clock`] | current date |
//!
//! [`MemoryStore`] implements the first three in process memory and backs the
//! test suites and the demo binary.
mod clock;
mod error;
mod memory;
mod repository;
mod rules;
mod vocabulary;

pub use crate::clock::{Clock, FixedClock, SystemClock};
pub use crate::error::StoreError;
pub use crate::memory::{DEFAULT_TITLE_PROPERTY, MemoryStore};
pub use crate::repository::{ResourceStore, TemplateRepository};
pub use crate::rules::RuleEvaluator;
pub use crate::vocabulary::{Vocabulary, VocabularyKind, VocabularyStore};

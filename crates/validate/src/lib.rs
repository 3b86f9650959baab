//! Post-hydration validation.
//!
//! [`Validator::validate`] inspects the hydrated entity against its template
//! and returns every violation it finds; it never stops at the first one and
//! never mutates anything. An empty [`ViolationSet`] means the write may
//! commit.
//!
//! Checks, in order:
//!
//! | Scope | Check | Target |
//! |-------|-------|--------|
//! | template | resource kind allowed | `o:resource_template[o:id]` |
//! | template | class required, class in closed list | `o:resource_class[o:id]` |
//! | template | media minimums (items) | `o:media` |
//! | data set | input pattern, length | property |
//! | data set | value count | property |
//! | data set | uniqueness across resources | property |
//!
//! Minimum value counts only apply to required bindings and only when the
//! caller asks for them through [`ValidationOptions::enforce_min_values`].
use std::sync::Arc;
use std::time::Instant;

use model::{Resource, Template, ViolationSet};
use store::ResourceStore;
use tracing::{debug, Level};

mod error;
mod pattern;
mod property;
mod template;

pub use crate::error::ValidateError;
pub use crate::pattern::InputPattern;
pub use crate::property::{check_length, check_pattern, check_uniqueness, check_value_count};
pub use crate::template::{check_media_minimums, check_template_constraints};

/// Caller-supplied strictness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Enforce `min_values` on required bindings.
    pub enforce_min_values: bool,
}

impl ValidationOptions {
    pub fn strict() -> Self {
        Self {
            enforce_min_values: true,
        }
    }
}

/// Checks hydrated resources against their template.
#[derive(Clone)]
pub struct Validator {
    store: Arc<dyn ResourceStore>,
}

impl Validator {
    pub fn new(store: Arc<dyn ResourceStore>) -> Self {
        Self { store }
    }

    pub fn validate(
        &self,
        template: &Template,
        resource: &Resource,
        options: &ValidationOptions,
    ) -> Result<ViolationSet, ValidateError> {
        let start = Instant::now();
        let span = tracing::span!(
            Level::DEBUG,
            "validate.validate",
            template_id = template.id,
            resource_id = ?resource.id
        );
        let _guard = span.enter();

        let mut violations = ViolationSet::new();
        check_template_constraints(template, resource, &mut violations);
        check_media_minimums(template, resource, &mut violations);

        for (property, data_set) in template.data_sets() {
            if let Some(fragment) = data_set.input_control.as_deref() {
                if let Some(pattern) = InputPattern::compile(fragment, &template.label) {
                    check_pattern(&pattern, property, data_set, resource, &mut violations);
                }
            }
            check_length(property, data_set, resource, &mut violations);
            check_value_count(property, data_set, resource, options, &mut violations);
            check_uniqueness(
                self.store.as_ref(),
                property,
                data_set,
                resource,
                &mut violations,
            )?;
        }

        debug!(
            template_id = template.id,
            violations = violations.len(),
            elapsed_micros = start.elapsed().as_micros(),
            "validate_complete"
        );
        Ok(violations)
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator").finish_non_exhaustive()
    }
}

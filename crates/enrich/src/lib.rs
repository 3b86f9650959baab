//! Pre-hydration enrichment.
//!
//! Before the storage layer turns a write request into an entity, the
//! [`Enricher`] injects what the template derives on its own:
//!
//! 1. automatic item sets (items only),
//! 2. values produced by the template's automatic-value rule text,
//! 3. then, for every data set of every property binding, in template order:
//!    exploded delimited literals, the fixed automatic value or the
//!    issue-on-first-publish date, and linked-resource ordering.
//!
//! Every step fails open. When a step errors, the field map is restored to
//! what it was before that step, a `warn!` event is emitted, and the next step
//! runs. [`Enricher::enrich`] therefore never fails.
//!
//! ```
//! use std::sync::Arc;
//!
//! use enrich::Enricher;
//! use model::{PropertyBinding, ResourceFields, ResourceKind, Settings, Template, Value};
//! use store::{MemoryStore, SystemClock};
//!
//! let template = Template::new(1, "Article").with_binding(
//!     PropertyBinding::new("dcterms:subject").with_data_set(
//!         Settings::new()
//!             .with("o:data_type", serde_json::json!(["literal"]))
//!             .with("split_separator", ";"),
//!     ),
//! );
//! let fields = ResourceFields::new(ResourceKind::Item)
//!     .with_value(Value::literal("dcterms:subject", "maps; charts"));
//!
//! let enricher = Enricher::new(Arc::new(MemoryStore::new()), Arc::new(SystemClock));
//! let enriched = enricher.enrich(&template, fields);
//! assert_eq!(enriched.properties.get("dcterms:subject").len(), 2);
//! ```
use std::sync::Arc;
use std::time::Instant;

use model::{ResourceFields, Template};
use store::{Clock, ResourceStore, RuleEvaluator};
use tracing::{info, warn, Level};

mod automatic;
mod error;
mod explode;
mod natural;
mod order;
mod rules;

pub use crate::automatic::{
    append_automatic_item_sets, append_if_new, apply_template_rules, derive_automatic_value,
    resolve_automatic_value, ISSUED_DATE_FORMAT,
};
pub use crate::error::EnrichError;
pub use crate::explode::explode_delimited_literal;
pub use crate::natural::natural_cmp;
pub use crate::order::reorder_by_linked;
pub use crate::rules::{
    parse_rule_text, parse_target, MappingEvaluator, MappingRule, RuleSection, RuleTarget,
};

/// Applies a template's derivation rules to a not-yet-persisted field map.
#[derive(Clone)]
pub struct Enricher {
    store: Arc<dyn ResourceStore>,
    evaluator: Option<Arc<dyn RuleEvaluator>>,
    clock: Arc<dyn Clock>,
}

impl Enricher {
    pub fn new(store: Arc<dyn ResourceStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            evaluator: None,
            clock,
        }
    }

    /// Installs the evaluator for template-level rule text.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn RuleEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn has_evaluator(&self) -> bool {
        self.evaluator.is_some()
    }

    /// Runs every enrichment step; never fails.
    pub fn enrich(&self, template: &Template, mut fields: ResourceFields) -> ResourceFields {
        let start = Instant::now();
        let span = tracing::span!(
            Level::INFO,
            "enrich.enrich",
            template_id = template.id,
            kind = %fields.kind
        );
        let _guard = span.enter();

        let mut added = 0usize;
        let store = self.store.as_ref();

        added += self.run_step("automatic_item_sets", template, &mut fields, |fields| {
            append_automatic_item_sets(store, template, fields)
        });
        added += self.run_step("template_rules", template, &mut fields, |fields| {
            apply_template_rules(self.evaluator.as_deref(), template, fields)
        });

        for (property, data_set) in template.data_sets() {
            explode_delimited_literal(property, data_set, &mut fields);
            added += self.run_step("automatic_value", template, &mut fields, |fields| {
                derive_automatic_value(store, self.clock.as_ref(), property, data_set, fields)
            });
            self.run_step("order_by_linked", template, &mut fields, |fields| {
                reorder_by_linked(store, property, data_set, fields).map(|()| 0)
            });
        }

        let elapsed_micros = start.elapsed().as_micros();
        info!(
            template_id = template.id,
            values_added = added,
            item_sets = fields.item_sets.len(),
            elapsed_micros,
            "enrich_complete"
        );
        fields
    }

    /// Runs one step against the field map, restoring it if the step fails.
    fn run_step<F>(
        &self,
        step: &'static str,
        template: &Template,
        fields: &mut ResourceFields,
        apply: F,
    ) -> usize
    where
        F: FnOnce(&mut ResourceFields) -> Result<usize, EnrichError>,
    {
        let backup = fields.clone();
        match apply(fields) {
            Ok(added) => added,
            Err(err) => {
                warn!(step, template_id = template.id, error = %err, "enrich_step_failed");
                *fields = backup;
                0
            }
        }
    }
}

impl std::fmt::Debug for Enricher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enricher")
            .field("has_evaluator", &self.evaluator.is_some())
            .finish_non_exhaustive()
    }
}

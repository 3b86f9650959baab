//! Workspace umbrella crate for the templar pipeline.
//!
//! This crate stitches enrichment and validation together with the
//! post-hydration and post-commit steps so a write orchestrator can run a
//! template-governed write through one statically ordered interface:
//!
//! 1. [`TemplatePipeline::pre_hydrate`]: derive values the user did not type,
//!    including inside value annotations. Never fails.
//! 2. [`TemplatePipeline::post_hydrate`]: fill a missing title, check every
//!    constraint, then grow open vocabularies. Any violation rejects the
//!    whole write.
//! 3. [`TemplatePipeline::post_commit`]: link committed annotations to their
//!    templates. Failures are logged, never rolled back.
//!
//! [`TemplatePipeline::write`] runs the three stages around the store's own
//! `hydrate` and `commit` for hosts without their own transaction handling.
//!
//! ```
//! use std::sync::Arc;
//!
//! use templar::{
//!     MemoryStore, PipelineError, PropertyBinding, ResourceFields, ResourceKind, Settings,
//!     SystemClock, Template, TemplatePipeline, Value, WriteOptions,
//! };
//!
//! let store = Arc::new(MemoryStore::new());
//! store
//!     .insert_template(Template::new(1, "Report").with_binding(
//!         PropertyBinding::new("dcterms:identifier")
//!             .with_data_set(Settings::new().with("input_control", "[A-Z]{3}-[0-9]{4}")),
//!     ))
//!     .unwrap();
//! let pipeline = TemplatePipeline::new(store.clone(), store.clone(), store, Arc::new(SystemClock));
//!
//! let report = |identifier: &str| {
//!     ResourceFields::new(ResourceKind::Item)
//!         .with_template(1)
//!         .with_value(Value::literal("dcterms:identifier", identifier))
//! };
//! assert!(pipeline.write(report("ABC-1234"), &WriteOptions::default()).is_ok());
//! assert!(matches!(
//!     pipeline.write(report("abc-1234"), &WriteOptions::default()),
//!     Err(PipelineError::Rejected(_))
//! ));
//! ```

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{Level, debug, info, warn};

pub mod annotation;
pub mod config;
pub mod display;
pub mod metrics;
pub mod title;
pub mod vocab;

pub use crate::annotation::{LinkReport, ValueAnnotationResolver};
pub use crate::config::{ConfigLoadError, PipelineConfig};
pub use crate::display::display_values;
pub use crate::metrics::{PipelineMetrics, set_pipeline_metrics};
pub use crate::title::{apply_title_fallback, resolve_title};
pub use crate::vocab::CustomVocabExpander;

pub use enrich::{EnrichError, Enricher, MappingEvaluator};
pub use model::{
    Annotation, DataSet, DataType, ModelError, PayloadKey, PropertyBinding, PropertyMap, Resource,
    ResourceFields, ResourceId, ResourceKind, Settings, Template, TemplateId, Value, ValuePayload,
    Violation, ViolationKind, ViolationSet, ViolationTarget,
};
pub use store::{
    Clock, FixedClock, MemoryStore, ResourceStore, RuleEvaluator, StoreError, SystemClock,
    TemplateRepository, Vocabulary, VocabularyStore,
};
pub use validate::{ValidateError, ValidationOptions, Validator};

use crate::annotation::default_annotation_template;
use crate::metrics::MetricsSpan;

/// Errors that can occur while running a write through the pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PipelineError {
    #[error("storage failure: {0}")]
    Store(#[from] StoreError),

    #[error("validation could not complete: {0}")]
    Validate(#[from] ValidateError),

    /// The resource breaks template constraints; nothing was persisted.
    #[error("write rejected: {0}")]
    Rejected(ViolationSet),
}

impl PipelineError {
    pub fn violations(&self) -> Option<&ViolationSet> {
        match self {
            PipelineError::Rejected(violations) => Some(violations),
            _ => None,
        }
    }
}

/// Per-request caller choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Skip constraint checks for this write.
    pub skip_validation: bool,
    /// Enforce `min_values` on required bindings; `None` follows
    /// [`PipelineConfig::enforce_min_values`].
    pub enforce_min_values: Option<bool>,
}

impl WriteOptions {
    pub fn strict() -> Self {
        Self {
            skip_validation: false,
            enforce_min_values: Some(true),
        }
    }

    pub fn skip_validation() -> Self {
        Self {
            skip_validation: true,
            enforce_min_values: None,
        }
    }
}

/// Template snapshot of one write, with its default annotation template
/// resolved once.
#[derive(Debug, Clone)]
pub struct TemplateContext {
    template: Arc<Template>,
    annotation_default: Option<Arc<Template>>,
}

impl TemplateContext {
    pub fn new(template: Arc<Template>, annotation_default: Option<Arc<Template>>) -> Self {
        Self {
            template,
            annotation_default,
        }
    }

    pub fn template(&self) -> &Template {
        &self.template
    }

    pub fn annotation_default(&self) -> Option<&Arc<Template>> {
        self.annotation_default.as_ref()
    }
}

/// What post-hydration did besides accepting the resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HydrationReport {
    pub title_filled: bool,
    /// False when checks were skipped.
    pub validated: bool,
    /// Non-fatal violations, from vocabulary growth.
    pub warnings: ViolationSet,
}

/// Result of [`TemplatePipeline::write`].
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub resource: Resource,
    pub hydration: HydrationReport,
    pub links: LinkReport,
}

/// Template-driven write pipeline over external collaborators.
#[derive(Clone)]
pub struct TemplatePipeline {
    templates: Arc<dyn TemplateRepository>,
    store: Arc<dyn ResourceStore>,
    vocabularies: Arc<dyn VocabularyStore>,
    enricher: Enricher,
    validator: Validator,
    config: PipelineConfig,
}

impl TemplatePipeline {
    pub fn new(
        templates: Arc<dyn TemplateRepository>,
        store: Arc<dyn ResourceStore>,
        vocabularies: Arc<dyn VocabularyStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            enricher: Enricher::new(store.clone(), clock),
            validator: Validator::new(store.clone()),
            templates,
            store,
            vocabularies,
            config: PipelineConfig::default(),
        }
    }

    /// Installs the evaluator for template-level automatic-value rules.
    pub fn with_evaluator(mut self, evaluator: Arc<dyn RuleEvaluator>) -> Self {
        self.enricher = self.enricher.with_evaluator(evaluator);
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    fn annotations(&self) -> ValueAnnotationResolver<'_> {
        ValueAnnotationResolver::new(
            self.templates.as_ref(),
            &self.enricher,
            self.config.max_annotation_depth,
        )
    }

    /// Loads the template a write refers to. `Ok(None)` when it refers to none.
    pub fn context(&self, template: Option<TemplateId>) -> Result<Option<TemplateContext>, PipelineError> {
        let Some(id) = template else {
            return Ok(None);
        };
        let template = self
            .templates
            .template(id)?
            .ok_or(StoreError::TemplateNotFound(id))?;
        let annotation_default = default_annotation_template(self.templates.as_ref(), &template)?;
        Ok(Some(TemplateContext::new(template, annotation_default)))
    }

    /// Enriches the field map of a create or update request.
    pub fn pre_hydrate(&self, context: &TemplateContext, fields: ResourceFields) -> ResourceFields {
        let metrics = MetricsSpan::start();
        let template = context.template();
        let fields = self.enricher.enrich(template, fields);
        let fields = self
            .annotations()
            .resolve_for_hydration(template, context.annotation_default(), fields);
        if let Some(span) = metrics {
            span.record_pre_hydrate();
        }
        fields
    }

    /// Runs the checks and bookkeeping due before commit.
    ///
    /// Returns [`PipelineError::Rejected`] with every violation found when the
    /// resource breaks a constraint. Vocabularies only grow for accepted
    /// resources.
    pub fn post_hydrate(
        &self,
        context: &TemplateContext,
        resource: &mut Resource,
        options: &WriteOptions,
    ) -> Result<HydrationReport, PipelineError> {
        let template = context.template();
        let mut report = HydrationReport::default();

        match apply_title_fallback(
            self.store.as_ref(),
            template,
            &self.config.default_title_property,
            resource,
        ) {
            Ok(filled) => report.title_filled = filled,
            Err(err) => warn!(template_id = template.id, error = %err, "title_fallback_failed"),
        }

        if options.skip_validation || self.config.skip_checks {
            debug!(template_id = template.id, "validation_skipped");
        } else {
            let validation = ValidationOptions {
                enforce_min_values: options
                    .enforce_min_values
                    .unwrap_or(self.config.enforce_min_values),
            };
            let metrics = MetricsSpan::start();
            let violations = self.validator.validate(template, resource, &validation)?;
            if let Some(span) = metrics {
                span.record_validation(violations.len());
            }
            if !violations.is_empty() {
                warn!(
                    template_id = template.id,
                    violations = violations.len(),
                    "write_rejected"
                );
                return Err(PipelineError::Rejected(violations));
            }
            report.validated = true;
        }

        if self.config.expand_vocabularies {
            report.warnings = CustomVocabExpander::new(self.vocabularies.as_ref()).expand(template, resource);
        }
        Ok(report)
    }

    /// Links the committed resource's annotations to their templates.
    pub fn post_commit(&self, context: &TemplateContext, resource: &Resource) -> LinkReport {
        let metrics = MetricsSpan::start();
        let report = self.annotations().link_after_commit(
            self.store.as_ref(),
            context.template(),
            context.annotation_default(),
            resource,
        );
        if let Some(span) = metrics {
            span.record_post_commit(report.linked + report.cleared, report.failed);
        }
        report
    }

    /// Runs a whole write: pre-hydrate, hydrate, post-hydrate, commit,
    /// post-commit. Writes without a template are hydrated and committed
    /// as they are.
    pub fn write(&self, fields: ResourceFields, options: &WriteOptions) -> Result<WriteOutcome, PipelineError> {
        let start = Instant::now();
        let span = tracing::span!(Level::INFO, "templar.write", kind = %fields.kind, template_id = ?fields.template);
        let _guard = span.enter();

        let Some(context) = self.context(fields.template)? else {
            let resource = self.store.commit(self.store.hydrate(fields)?)?;
            return Ok(WriteOutcome {
                resource,
                hydration: HydrationReport::default(),
                links: LinkReport::default(),
            });
        };

        let fields = self.pre_hydrate(&context, fields);
        let mut resource = self.store.hydrate(fields)?;
        let hydration = self.post_hydrate(&context, &mut resource, options)?;
        let resource = self.store.commit(resource)?;
        let links = self.post_commit(&context, &resource);

        info!(
            template_id = context.template().id,
            resource_id = ?resource.id,
            warnings = hydration.warnings.len(),
            annotations_linked = links.linked,
            elapsed_micros = start.elapsed().as_micros(),
            "write_committed"
        );
        Ok(WriteOutcome {
            resource,
            hydration,
            links,
        })
    }
}

impl std::fmt::Debug for TemplatePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplatePipeline")
            .field("enricher", &self.enricher)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

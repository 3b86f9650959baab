//! Templates of value annotations.
//!
//! Annotations are enriched before hydration with the template their binding
//! resolves to, and linked to that template once the commit has given them an
//! identifier. Both sides resolve the template slightly differently:
//!
//! | Binding setting | Hydration | Post-commit linking |
//! |-----------------|-----------|---------------------|
//! | empty | default | default |
//! | default id | default | default |
//! | other id, found | that template | that template |
//! | other id, missing | none | none |
//! | `none` / `manual` | none | none |
//!
//! Hydration considers every data set of a binding, linking only its first.
use std::sync::Arc;

use enrich::Enricher;
use model::{AnnotationTemplateChoice, Resource, ResourceFields, ResourceId, ResourceKind, Template};
use store::{ResourceStore, StoreError, TemplateRepository};
use tracing::{debug, warn};

/// Template-level default annotation template, when it names one that exists.
pub fn default_annotation_template(
    templates: &dyn TemplateRepository,
    template: &Template,
) -> Result<Option<Arc<Template>>, StoreError> {
    match template.settings.value_annotations_template {
        AnnotationTemplateChoice::Id(id) => templates.template(id),
        _ => Ok(None),
    }
}

/// Annotation template of a data set for enrichment.
pub fn resolve_hydration_template(
    templates: &dyn TemplateRepository,
    choice: AnnotationTemplateChoice,
    default: Option<&Arc<Template>>,
) -> Result<Option<Arc<Template>>, StoreError> {
    match choice {
        AnnotationTemplateChoice::Inherit => Ok(default.cloned()),
        AnnotationTemplateChoice::Id(id) if default.is_some_and(|default| default.id == id) => {
            Ok(default.cloned())
        }
        AnnotationTemplateChoice::Id(id) => templates.template(id),
        AnnotationTemplateChoice::Manual | AnnotationTemplateChoice::None => Ok(None),
    }
}

/// Annotation template of a property for post-commit linking, read from the
/// first data set of its first binding.
pub fn resolve_link_template(
    templates: &dyn TemplateRepository,
    template: &Template,
    property: &str,
    default: Option<&Arc<Template>>,
) -> Result<Option<Arc<Template>>, StoreError> {
    let choice = template
        .binding(property)
        .and_then(|binding| binding.data_sets.first())
        .map(|data_set| data_set.annotation_template)
        .unwrap_or_default();
    match choice {
        AnnotationTemplateChoice::Id(id) => templates.template(id),
        AnnotationTemplateChoice::Inherit => Ok(default.cloned()),
        AnnotationTemplateChoice::Manual | AnnotationTemplateChoice::None => Ok(None),
    }
}

/// Outcome of linking annotations to their templates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// Annotations given a template.
    pub linked: usize,
    /// Annotations whose template was cleared.
    pub cleared: usize,
    pub failed: usize,
}

/// Resolves and applies annotation templates.
#[derive(Clone, Copy)]
pub struct ValueAnnotationResolver<'a> {
    templates: &'a dyn TemplateRepository,
    enricher: &'a Enricher,
    max_depth: usize,
}

impl<'a> ValueAnnotationResolver<'a> {
    pub fn new(templates: &'a dyn TemplateRepository, enricher: &'a Enricher, max_depth: usize) -> Self {
        Self {
            templates,
            enricher,
            max_depth,
        }
    }

    /// Enriches the field map of every annotation under the template's
    /// bindings with the annotation template each binding resolves to, then
    /// descends into the annotations' own annotations.
    ///
    /// Never fails: a template that cannot be read leaves the annotations of
    /// that binding as they are.
    pub fn resolve_for_hydration(
        &self,
        template: &Template,
        default: Option<&Arc<Template>>,
        fields: ResourceFields,
    ) -> ResourceFields {
        self.hydrate_level(template, default, fields, 0)
    }

    fn hydrate_level(
        &self,
        template: &Template,
        default: Option<&Arc<Template>>,
        mut fields: ResourceFields,
        depth: usize,
    ) -> ResourceFields {
        for (property, data_set) in template.data_sets() {
            let has_annotations = fields
                .properties
                .get(property)
                .iter()
                .any(|value| value.annotation_ref().is_some());
            if !has_annotations {
                continue;
            }
            if depth >= self.max_depth {
                warn!(
                    template_id = template.id,
                    property,
                    depth,
                    "annotation_depth_exceeded"
                );
                continue;
            }
            let annotation_template =
                match resolve_hydration_template(self.templates, data_set.annotation_template, default) {
                    Ok(Some(annotation_template)) => annotation_template,
                    Ok(None) => continue,
                    Err(err) => {
                        warn!(template_id = template.id, property, error = %err, "annotation_template_unreadable");
                        continue;
                    }
                };
            let nested_default = match default_annotation_template(self.templates, &annotation_template) {
                Ok(nested_default) => nested_default,
                Err(err) => {
                    warn!(template_id = annotation_template.id, error = %err, "annotation_template_unreadable");
                    None
                }
            };

            let Some(values) = fields.properties.get_mut(property) else {
                continue;
            };
            for value in values.iter_mut() {
                let Some(annotation) = value.annotation_mut() else {
                    continue;
                };
                let current = std::mem::replace(
                    &mut annotation.fields,
                    ResourceFields::new(ResourceKind::ValueAnnotation),
                );
                let enriched = self.enricher.enrich(&annotation_template, current);
                annotation.fields = self.hydrate_level(
                    &annotation_template,
                    nested_default.as_ref(),
                    enriched,
                    depth + 1,
                );
            }
        }
        fields
    }

    /// Sets or clears the template and class of every committed annotation
    /// held directly by the resource. Failures are logged and counted, never
    /// returned.
    pub fn link_after_commit(
        &self,
        store: &dyn ResourceStore,
        template: &Template,
        default: Option<&Arc<Template>>,
        resource: &Resource,
    ) -> LinkReport {
        let mut report = LinkReport::default();
        for (property, values) in resource.properties.iter() {
            let annotations: Vec<ResourceId> = values
                .iter()
                .filter_map(|value| value.annotation_ref())
                .filter_map(|annotation| annotation.id)
                .collect();
            if annotations.is_empty() {
                continue;
            }
            let resolved = match resolve_link_template(self.templates, template, property, default) {
                Ok(resolved) => resolved,
                Err(err) => {
                    warn!(template_id = template.id, property, error = %err, "annotation_template_unreadable");
                    report.failed += annotations.len();
                    continue;
                }
            };
            let template_id = resolved.as_ref().map(|resolved| resolved.id);
            let class = resolved.as_ref().and_then(|resolved| resolved.class);
            for annotation in annotations {
                match store.set_annotation_template(annotation, template_id, class) {
                    Ok(()) if template_id.is_some() => report.linked += 1,
                    Ok(()) => report.cleared += 1,
                    Err(err) => {
                        warn!(annotation_id = annotation, property, error = %err, "annotation_link_failed");
                        report.failed += 1;
                    }
                }
            }
            debug!(property, template_id = ?template_id, "annotations_linked");
        }
        report
    }
}

impl std::fmt::Debug for ValueAnnotationResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueAnnotationResolver")
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

//! Template-level constraints.
use std::collections::HashMap;

use model::{Resource, ResourceKind, Template, ViolationKind, ViolationSet, ViolationTarget};

/// Allowed kinds, required class and closed class list.
pub fn check_template_constraints(
    template: &Template,
    resource: &Resource,
    violations: &mut ViolationSet,
) {
    let settings = &template.settings;
    if !settings.use_for_resources.is_empty() && !settings.use_for_resources.contains(&resource.kind) {
        violations.add(
            ViolationTarget::Template,
            ViolationKind::KindNotAllowed {
                template: template.label.clone(),
                kind: resource.kind,
            },
        );
    }

    match resource.class {
        None if settings.require_resource_class => violations.add(
            ViolationTarget::Class,
            ViolationKind::ClassRequired {
                template: template.label.clone(),
            },
        ),
        Some(class)
            if settings.closed_class_list
                && !settings.suggested_classes.is_empty()
                && !settings.suggested_classes.contains(&class) =>
        {
            violations.add(
                ViolationTarget::Class,
                ViolationKind::ClassNotAllowed {
                    template: template.label.clone(),
                    class: Some(class),
                },
            )
        }
        _ => {}
    }
}

/// Minimum media counts of an item, keyed by media template id or label.
///
/// Each media counts under both its template id (`0` without template) and
/// its template label (empty without template). Fails when the item has
/// fewer media than the sum of all minimums, or when any keyed minimum is
/// unmet; one violation at most, reporting the summed minimum.
pub fn check_media_minimums(template: &Template, resource: &Resource, violations: &mut ViolationSet) {
    if resource.kind != ResourceKind::Item {
        return;
    }
    let minimums = &template.settings.media_templates_minimum;
    if minimums.is_empty() {
        return;
    }
    let total: usize = minimums.iter().map(|(_, min)| min).sum();
    let violation = || ViolationKind::MediaMinimum {
        template: template.label.clone(),
        min: total,
    };

    if resource.media.len() < total {
        violations.add(ViolationTarget::Media, violation());
        return;
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for media in &resource.media {
        let id = media.template.unwrap_or(0).to_string();
        let label = media.template_label.clone().unwrap_or_default();
        *counts.entry(id).or_default() += 1;
        *counts.entry(label).or_default() += 1;
    }
    let unmet = minimums
        .iter()
        .any(|(key, min)| counts.get(key).copied().unwrap_or(0) < *min);
    if unmet {
        violations.add(ViolationTarget::Media, violation());
    }
}

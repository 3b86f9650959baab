//! Display title fallback.
use model::{Resource, Template};
use store::{ResourceStore, StoreError};

/// Properties scanned for a title: the template's title property (or
/// `default_property`), then its fallback list.
pub fn title_candidates<'a>(template: &'a Template, default_property: &'a str) -> Vec<&'a str> {
    let title_property = template.title_property.as_deref().unwrap_or(default_property);
    std::iter::once(title_property)
        .chain(
            template
                .settings
                .title_fallback_properties
                .iter()
                .map(String::as_str),
        )
        .collect()
}

/// First non-empty title found along the fallback chain.
///
/// A literal contributes its text, a resource link the title of the linked
/// resource. Other payloads are skipped. Returns `Ok(None)` when nothing in
/// the chain yields a title.
pub fn resolve_title(
    store: &dyn ResourceStore,
    template: &Template,
    default_property: &str,
    resource: &Resource,
) -> Result<Option<String>, StoreError> {
    for property in title_candidates(template, default_property) {
        for value in resource.properties.get(property) {
            let title = match value.linked_resource() {
                Some(id) => store
                    .resource(id)?
                    .and_then(|linked| linked.display_title().map(str::to_string)),
                None => value
                    .literal_text()
                    .filter(|text| !text.is_empty())
                    .map(str::to_string),
            };
            if title.is_some() {
                return Ok(title);
            }
        }
    }
    Ok(None)
}

/// Fills an empty title from the fallback chain. Returns whether it was set.
pub fn apply_title_fallback(
    store: &dyn ResourceStore,
    template: &Template,
    default_property: &str,
    resource: &mut Resource,
) -> Result<bool, StoreError> {
    if resource.display_title().is_some() {
        return Ok(false);
    }
    match resolve_title(store, template, default_property, resource)? {
        Some(title) => {
            resource.title = Some(title);
            Ok(true)
        }
        None => Ok(false),
    }
}

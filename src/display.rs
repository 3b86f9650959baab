//! Property map shown to readers.
use model::{PropertyMap, Resource, Template, Value};

/// Values of a resource arranged for display.
///
/// Template properties come first, in template order. A template property
/// without values gets a single placeholder literal taken from the first of
/// its data sets declaring a `display_value`. Properties the template does not
/// know follow in their stored order.
pub fn display_values(template: &Template, resource: &Resource) -> PropertyMap {
    let mut display = PropertyMap::new();
    for binding in &template.bindings {
        let property = binding.property.as_str();
        if display.has_values(property) {
            continue;
        }
        let values = resource.properties.get(property);
        if !values.is_empty() {
            display.set(property, values.to_vec());
            continue;
        }
        let placeholder = binding.data_sets.iter().find_map(|data_set| {
            data_set
                .display_value
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
        });
        if let Some(text) = placeholder {
            display.push(Value::literal(property, text));
        }
    }
    for (property, values) in resource.properties.iter() {
        if template.binding(property).is_none() && !values.is_empty() {
            display.set(property, values.to_vec());
        }
    }
    display
}

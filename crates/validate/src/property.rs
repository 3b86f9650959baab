//! Per data-set constraints on property values.
use model::{
    DataSet, PayloadKey, Resource, Value, Violation, ViolationKind, ViolationSet,
};
use store::ResourceStore;

use crate::{InputPattern, ValidateError, ValidationOptions};

/// Literal texts of the values a data set governs.
fn governed_literals<'a>(
    property: &str,
    data_set: &'a DataSet,
    resource: &'a Resource,
) -> impl Iterator<Item = &'a str> + 'a {
    resource
        .properties
        .get(property)
        .iter()
        .filter(move |value| data_set.matches(value))
        .filter_map(Value::literal_text)
}

pub fn check_pattern(
    pattern: &InputPattern,
    property: &str,
    data_set: &DataSet,
    resource: &Resource,
    violations: &mut ViolationSet,
) {
    for text in governed_literals(property, data_set, resource) {
        if !pattern.is_match(text) {
            violations.push(Violation::on_property(
                property,
                ViolationKind::Pattern {
                    value: text.to_string(),
                    pattern: pattern.source().to_string(),
                },
            ));
        }
    }
}

/// Length bounds, counted in Unicode scalar values.
pub fn check_length(
    property: &str,
    data_set: &DataSet,
    resource: &Resource,
    violations: &mut ViolationSet,
) {
    if data_set.min_length.is_none() && data_set.max_length.is_none() {
        return;
    }
    for text in governed_literals(property, data_set, resource) {
        let length = text.chars().count();
        if let Some(min) = data_set.min_length.filter(|min| length < *min) {
            violations.push(Violation::on_property(
                property,
                ViolationKind::TooShort { length, min },
            ));
        }
        if let Some(max) = data_set.max_length.filter(|max| length > *max) {
            violations.push(Violation::on_property(
                property,
                ViolationKind::TooLong { length, max },
            ));
        }
    }
}

/// Count of values whose data type the data set declares.
pub fn check_value_count(
    property: &str,
    data_set: &DataSet,
    resource: &Resource,
    options: &ValidationOptions,
    violations: &mut ViolationSet,
) {
    if data_set.min_values.is_none() && data_set.max_values.is_none() {
        return;
    }
    let count = resource
        .properties
        .get(property)
        .iter()
        .filter(|value| data_set.matches(value))
        .count();
    if data_set.is_required && options.enforce_min_values {
        if let Some(min) = data_set.min_values.filter(|min| count < *min) {
            violations.push(Violation::on_property(
                property,
                ViolationKind::TooFewValues { count, min },
            ));
        }
    }
    if let Some(max) = data_set.max_values.filter(|max| count > *max) {
        violations.push(Violation::on_property(
            property,
            ViolationKind::TooManyValues { count, max },
        ));
    }
}

/// Looks for another resource holding one of this property's exact payloads.
pub fn check_uniqueness(
    store: &dyn ResourceStore,
    property: &str,
    data_set: &DataSet,
    resource: &Resource,
    violations: &mut ViolationSet,
) -> Result<(), ValidateError> {
    if !data_set.unique_value {
        return Ok(());
    }
    let mut keys: Vec<PayloadKey> = resource
        .properties
        .get(property)
        .iter()
        .filter_map(Value::payload_key)
        .collect();
    if keys.is_empty() {
        return Ok(());
    }
    keys.sort();
    keys.dedup();
    if let Some(conflicting) = store.find_value_owner(property, resource.id, &keys)? {
        violations.push(Violation::on_property(
            property,
            ViolationKind::NotUnique { conflicting },
        ));
    }
    Ok(())
}

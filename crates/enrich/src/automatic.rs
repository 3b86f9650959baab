//! Values and item sets the user did not type.
use std::sync::Once;

use model::{
    AutomaticValue, DataSet, MainType, ResourceFields, ResourceKind, Template, Value,
};
use serde_json::Value as JsonValue;
use store::{Clock, ResourceStore, RuleEvaluator};
use tracing::{debug, warn};

use crate::EnrichError;

static MISSING_EVALUATOR: Once = Once::new();

/// Date format written by the issue-on-first-publish rule.
pub const ISSUED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Appends `value` unless the property already holds the same trimmed
/// payload. Returns whether it was appended.
pub fn append_if_new(fields: &mut ResourceFields, value: Value) -> bool {
    if let Some(key) = value.dedup_key() {
        if fields.properties.contains_payload(&value.property, &key) {
            return false;
        }
    }
    fields.properties.push(value);
    true
}

/// Adds the template's item sets to an item, once each, when they exist.
pub fn append_automatic_item_sets(
    store: &dyn ResourceStore,
    template: &Template,
    fields: &mut ResourceFields,
) -> Result<usize, EnrichError> {
    if fields.kind != ResourceKind::Item {
        return Ok(0);
    }
    let mut appended = 0;
    for id in &template.settings.item_sets {
        if fields.item_sets.contains(id) {
            continue;
        }
        if store.item_set_exists(*id)? {
            fields.item_sets.push(*id);
            appended += 1;
        } else {
            debug!(template_id = template.id, item_set_id = id, "automatic_item_set_missing");
        }
    }
    Ok(appended)
}

/// Runs the template's rule text through the evaluator and appends the new
/// values. Without an evaluator this is a no-op, reported once per process.
pub fn apply_template_rules(
    evaluator: Option<&dyn RuleEvaluator>,
    template: &Template,
    fields: &mut ResourceFields,
) -> Result<usize, EnrichError> {
    let Some(rules) = template.settings.automatic_values.as_deref() else {
        return Ok(0);
    };
    let Some(evaluator) = evaluator else {
        MISSING_EVALUATOR.call_once(|| {
            warn!(
                template_id = template.id,
                "automatic values are configured but no rule evaluator is installed"
            );
        });
        return Ok(0);
    };
    let produced = evaluator.evaluate(rules, fields)?;
    let mut appended = 0;
    for value in produced {
        if append_if_new(fields, value) {
            appended += 1;
        }
    }
    Ok(appended)
}

/// Resolves a fixed automatic value to a value of `property`.
///
/// `Ok(None)` when the expression does not resolve: a type outside the data
/// set's declared ones, a malformed payload or a linked resource that does
/// not exist.
pub fn resolve_automatic_value(
    store: &dyn ResourceStore,
    property: &str,
    data_set: &DataSet,
    automatic: &AutomaticValue,
) -> Result<Option<Value>, EnrichError> {
    let value = match automatic {
        AutomaticValue::Object(object) => {
            let mut object = object.clone();
            match object.get("type").and_then(JsonValue::as_str) {
                Some(data_type) => {
                    let declared = data_set.data_types.is_empty()
                        || data_set
                            .data_types
                            .iter()
                            .any(|declared| declared.as_str() == data_type);
                    if !declared {
                        return Ok(None);
                    }
                }
                None => {
                    object.insert(
                        "type".to_string(),
                        JsonValue::String(data_set.primary_data_type().to_string()),
                    );
                }
            }
            match Value::from_object(property, &object) {
                Ok(value) => value,
                Err(err) => {
                    debug!(property, error = %err, "automatic_value_unresolved");
                    return Ok(None);
                }
            }
        }
        AutomaticValue::Text(text) => {
            let data_type = data_set.primary_data_type();
            match data_type.main() {
                MainType::Resource => match text.parse() {
                    Ok(id) => Value::resource(property, id),
                    Err(_) => return Ok(None),
                },
                MainType::Uri => Value::uri(property, text.as_str()),
                MainType::Literal => Value::literal(property, text.as_str()),
            }
            .with_data_type(data_type)
        }
    };
    if let Some(id) = value.linked_resource() {
        if !store.resource_exists(id)? {
            debug!(property, resource_id = id, "automatic_value_missing_resource");
            return Ok(None);
        }
    }
    Ok(Some(value.with_public(!data_set.is_private)))
}

/// Appends the data set's fixed automatic value, then stamps today's date on
/// a public resource whose property is still empty when the data set issues
/// on first publish.
///
/// Only the current field map is inspected: emptying the property and saving
/// again issues a new date.
pub fn derive_automatic_value(
    store: &dyn ResourceStore,
    clock: &dyn Clock,
    property: &str,
    data_set: &DataSet,
    fields: &mut ResourceFields,
) -> Result<usize, EnrichError> {
    let mut appended = 0;
    if let Some(automatic) = &data_set.automatic_value {
        if let Some(value) = resolve_automatic_value(store, property, data_set, automatic)? {
            if append_if_new(fields, value) {
                appended += 1;
            }
        }
    }

    if data_set.issue_on_first_publish
        && fields.is_public
        && appended == 0
        && !fields.properties.has_values(property)
    {
        let issued = clock.today().format(ISSUED_DATE_FORMAT).to_string();
        fields
            .properties
            .push(Value::literal(property, issued).with_public(!data_set.is_private));
        appended += 1;
    }
    Ok(appended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::{Resource, Settings, ValuePayload};
    use serde_json::json;
    use store::{FixedClock, MemoryStore, StoreError};

    fn fixed_clock() -> FixedClock {
        let Some(date) = NaiveDate::from_ymd_opt(2025, 3, 7) else {
            panic!("valid fixture date");
        };
        FixedClock(date)
    }

    fn data_set(settings: serde_json::Value) -> DataSet {
        let Ok(settings) = serde_json::from_value::<Settings>(settings) else {
            panic!("fixture settings must be an object");
        };
        DataSet::from(settings)
    }

    fn item_set(store: &MemoryStore) -> u64 {
        store
            .insert_resource(Resource::from(ResourceFields::new(ResourceKind::ItemSet)))
            .expect("insert item set")
    }

    struct FailingEvaluator;

    impl RuleEvaluator for FailingEvaluator {
        fn evaluate(&self, _: &str, _: &ResourceFields) -> Result<Vec<Value>, StoreError> {
            Err(StoreError::evaluator("boom"))
        }
    }

    #[test]
    fn item_sets_are_appended_once_and_only_when_they_exist() {
        let store = MemoryStore::new();
        let existing = item_set(&store);
        let template = Template::new(1, "Book")
            .with_settings(Settings::new().with("item_sets", json!([existing, 999])));
        let mut fields = ResourceFields::new(ResourceKind::Item);

        assert_eq!(append_automatic_item_sets(&store, &template, &mut fields).expect("first"), 1);
        let once = fields.item_sets.clone();
        assert_eq!(append_automatic_item_sets(&store, &template, &mut fields).expect("second"), 0);
        assert_eq!(fields.item_sets, once);
        assert_eq!(fields.item_sets, vec![existing]);
    }

    #[test]
    fn item_sets_skip_other_kinds() {
        let store = MemoryStore::new();
        let existing = item_set(&store);
        let template = Template::new(1, "Scan")
            .with_settings(Settings::new().with("item_sets", json!([existing])));
        let mut fields = ResourceFields::new(ResourceKind::Media);
        assert_eq!(append_automatic_item_sets(&store, &template, &mut fields).expect("media"), 0);
        assert!(fields.item_sets.is_empty());
    }

    #[test]
    fn template_rules_need_an_evaluator_and_propagate_its_errors() {
        let template = Template::new(1, "Book")
            .with_settings(Settings::new().with("automatic_values", "~ = dcterms:type ~ Text"));
        let mut fields = ResourceFields::new(ResourceKind::Item);
        assert_eq!(apply_template_rules(None, &template, &mut fields).expect("no-op"), 0);
        assert!(matches!(
            apply_template_rules(Some(&FailingEvaluator as &dyn RuleEvaluator), &template, &mut fields),
            Err(EnrichError::Store(StoreError::Evaluator(_)))
        ));
    }

    #[test]
    fn fixed_literal_is_deduplicated_on_trimmed_text() {
        let store = MemoryStore::new();
        let ds = data_set(json!({"automatic_value": "Text", "o:is_private": true}));
        let mut fields = ResourceFields::new(ResourceKind::Item);

        assert_eq!(derive_automatic_value(&store, &fixed_clock(), "dcterms:type", &ds, &mut fields).expect("first"), 1);
        assert!(!fields.properties.get("dcterms:type")[0].is_public);

        fields.properties.set("dcterms:type", vec![Value::literal("dcterms:type", " Text ")]);
        assert_eq!(derive_automatic_value(&store, &fixed_clock(), "dcterms:type", &ds, &mut fields).expect("second"), 0);
        assert_eq!(fields.properties.get("dcterms:type").len(), 1);
    }

    #[test]
    fn resource_automatic_value_requires_existing_target() {
        let store = MemoryStore::new();
        let target = item_set(&store);
        let present = data_set(json!({
            "o:data_type": ["resource:itemset"],
            "automatic_value": target.to_string(),
        }));
        let missing = data_set(json!({
            "o:data_type": ["resource:itemset"],
            "automatic_value": "4242",
        }));
        let mut fields = ResourceFields::new(ResourceKind::Item);

        derive_automatic_value(&store, &fixed_clock(), "dcterms:isPartOf", &missing, &mut fields).expect("missing");
        assert!(!fields.properties.has_values("dcterms:isPartOf"));
        derive_automatic_value(&store, &fixed_clock(), "dcterms:isPartOf", &present, &mut fields).expect("present");
        assert_eq!(
            fields.properties.get("dcterms:isPartOf")[0].payload,
            ValuePayload::Resource(target)
        );
    }

    #[test]
    fn object_automatic_value_must_use_a_declared_type() {
        let store = MemoryStore::new();
        let ds = data_set(json!({
            "o:data_type": ["literal"],
            "automatic_value": {"type": "uri", "@id": "https://x.test"},
        }));
        let resolved = resolve_automatic_value(
            &store,
            "dcterms:source",
            &ds,
            ds.automatic_value.as_ref().expect("configured"),
        )
        .expect("resolve");
        assert!(resolved.is_none());
    }

    #[test]
    fn issue_on_first_publish_stamps_public_empty_property() {
        let store = MemoryStore::new();
        let ds = data_set(json!({"automatic_value_issued": "first"}));

        let mut private = ResourceFields::new(ResourceKind::Item);
        derive_automatic_value(&store, &fixed_clock(), "dcterms:issued", &ds, &mut private).expect("private");
        assert!(!private.properties.has_values("dcterms:issued"));

        let mut public = ResourceFields::new(ResourceKind::Item).with_public(true);
        derive_automatic_value(&store, &fixed_clock(), "dcterms:issued", &ds, &mut public).expect("public");
        let issued: Vec<_> = public
            .properties
            .get("dcterms:issued")
            .iter()
            .filter_map(Value::literal_text)
            .collect();
        assert_eq!(issued, vec!["2025-03-07"]);

        derive_automatic_value(&store, &fixed_clock(), "dcterms:issued", &ds, &mut public).expect("again");
        assert_eq!(public.properties.get("dcterms:issued").len(), 1);
    }
}

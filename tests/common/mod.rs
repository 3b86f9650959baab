#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use templar::{
    FixedClock, MemoryStore, PropertyBinding, ResourceFields, ResourceKind, Settings, Template,
    TemplatePipeline, Value, Vocabulary,
};

pub const CATALOGUE: u64 = 1;
pub const NOTE_TEMPLATE: u64 = 2;
pub const SUBJECTS: u64 = 7;

pub fn today() -> NaiveDate {
    let Some(date) = NaiveDate::from_ymd_opt(2025, 6, 30) else {
        panic!("valid fixture date");
    };
    date
}

/// Template exercising every per-property rule the pipeline knows.
pub fn catalogue_template() -> Template {
    Template::new(CATALOGUE, "Catalogue entry")
        .with_settings(
            Settings::new()
                .with("use_for_resources", json!(["items"]))
                .with("value_annotations_template", NOTE_TEMPLATE)
                .with("title_fallback_properties", json!(["dcterms:alternative"])),
        )
        .with_binding(PropertyBinding::new("dcterms:identifier").with_data_set(
            Settings::new()
                .with("input_control", "[A-Z]{3}-[0-9]{4}")
                .with("unique_value", true),
        ))
        .with_binding(PropertyBinding::new("dcterms:title").with_data_set(
            Settings::new().with("min_length", 3).with("max_length", 6),
        ))
        .with_binding(PropertyBinding::new("dcterms:creator").with_data_set(
            Settings::new()
                .with("o:is_required", true)
                .with("min_values", 2)
                .with("max_values", 3),
        ))
        .with_binding(PropertyBinding::new("dcterms:subject").with_data_set(
            Settings::new()
                .with("o:data_type", json!([format!("customvocab:{SUBJECTS}")]))
                .with("custom_vocab_open", true),
        ))
        .with_binding(PropertyBinding::new("dcterms:coverage").with_data_set(
            Settings::new()
                .with("o:data_type", json!(["literal"]))
                .with("split_separator", ";"),
        ))
        .with_binding(PropertyBinding::new("dcterms:issued").with_data_set(
            Settings::new().with("automatic_value_issued", "first"),
        ))
        .with_binding(PropertyBinding::new("dcterms:description").with_data_set(Settings::new()))
}

pub fn note_template() -> Template {
    Template::new(NOTE_TEMPLATE, "Editorial note")
        .with_class(90)
        .with_binding(PropertyBinding::new("dcterms:type").with_data_set(
            Settings::new().with("automatic_value", "Editorial"),
        ))
}

pub fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let Ok(()) = store.insert_template(catalogue_template()) else {
        panic!("insert catalogue template");
    };
    let Ok(()) = store.insert_template(note_template()) else {
        panic!("insert note template");
    };
    let Ok(()) = store.insert_vocabulary(Vocabulary::literal(SUBJECTS, "Subjects", &["maps", "charts"]))
    else {
        panic!("insert vocabulary");
    };
    store
}

pub fn pipeline(store: &Arc<MemoryStore>) -> TemplatePipeline {
    TemplatePipeline::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(FixedClock(today())),
    )
}

/// A catalogue entry that satisfies every constraint.
pub fn valid_entry(identifier: &str) -> ResourceFields {
    ResourceFields::new(ResourceKind::Item)
        .with_template(CATALOGUE)
        .with_value(Value::literal("dcterms:identifier", identifier))
        .with_value(Value::literal("dcterms:creator", "Mercator"))
        .with_value(Value::literal("dcterms:creator", "Hondius"))
}

pub fn texts(fields: &templar::PropertyMap, term: &str) -> Vec<String> {
    fields
        .get(term)
        .iter()
        .filter_map(Value::literal_text)
        .map(str::to_string)
        .collect()
}

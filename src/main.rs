use std::error::Error;
use std::sync::Arc;

use serde_json::json;
use templar::{
    MappingEvaluator, MemoryStore, PipelineConfig, PipelineError, PropertyBinding, ResourceFields,
    ResourceKind, Settings, SystemClock, Template, TemplatePipeline, Value, Vocabulary,
    VocabularyStore, WriteOptions,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let log_json = std::env::var("TEMPLAR_LOG_FORMAT").is_ok_and(|format| format == "json");
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn report_template() -> Template {
    Template::new(1, "Field report")
        .with_settings(
            Settings::new()
                .with("use_for_resources", json!(["items"]))
                .with("automatic_values", "dcterms:identifier = dcterms:alternative")
                .with("title_fallback_properties", json!(["dcterms:subject"])),
        )
        .with_binding(PropertyBinding::new("dcterms:identifier").with_data_set(
            Settings::new()
                .with("input_control", "[A-Z]{3}-[0-9]{4}")
                .with("unique_value", true),
        ))
        .with_binding(PropertyBinding::new("dcterms:subject").with_data_set(
            Settings::new()
                .with("o:data_type", json!(["customvocab:1"]))
                .with("custom_vocab_open", true),
        ))
        .with_binding(PropertyBinding::new("dcterms:issued").with_data_set(
            Settings::new().with("automatic_value_issued", "first"),
        ))
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    let store = Arc::new(MemoryStore::new());
    store.insert_template(report_template())?;
    store.insert_vocabulary(Vocabulary::literal(1, "Subjects", &["survey"]))?;

    let pipeline = TemplatePipeline::new(store.clone(), store.clone(), store.clone(), Arc::new(SystemClock))
        .with_evaluator(Arc::new(MappingEvaluator::new()))
        .with_config(config);

    let report = |identifier: &str, subject: &str| {
        ResourceFields::new(ResourceKind::Item)
            .with_template(1)
            .with_public(true)
            .with_value(Value::literal("dcterms:identifier", identifier))
            .with_value(Value::literal("dcterms:subject", subject).with_data_type("customvocab:1"))
    };

    let accepted = pipeline.write(report("ABC-1234", "wetlands"), &WriteOptions::default())?;
    println!("{}", serde_json::to_string_pretty(&accepted.resource)?);

    for (identifier, subject) in [("ABC-1234", "dunes"), ("abc-9", "dunes")] {
        match pipeline.write(report(identifier, subject), &WriteOptions::default()) {
            Ok(outcome) => println!("accepted #{:?}", outcome.resource.id),
            Err(PipelineError::Rejected(violations)) => {
                println!("rejected {identifier}:\n{violations}");
            }
            Err(err) => return Err(err.into()),
        }
    }

    if let Some(subjects) = store.vocabulary(1)? {
        println!("vocabulary \"{}\": {:?}", subjects.label, subjects.terms);
    }
    Ok(())
}

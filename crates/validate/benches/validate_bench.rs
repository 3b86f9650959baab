use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use model::{PropertyBinding, Resource, ResourceFields, ResourceKind, Settings, Template, Value};
use serde_json::json;
use store::MemoryStore;
use validate::{ValidationOptions, Validator};

fn catalogue_template() -> Template {
    Template::new(1, "Catalogue")
        .with_settings(Settings::new().with("use_for_resources", json!(["items"])))
        .with_binding(PropertyBinding::new("dcterms:identifier").with_data_set(
            Settings::new()
                .with("input_control", "[A-Z]{3}-[0-9]{4}")
                .with("unique_value", true),
        ))
        .with_binding(PropertyBinding::new("dcterms:subject").with_data_set(
            Settings::new()
                .with("o:is_required", true)
                .with("min_values", 1)
                .with("max_values", 64)
                .with("max_length", 80),
        ))
}

fn bench_validate(c: &mut Criterion) {
    let store = Arc::new(MemoryStore::new());
    for n in 0..1_000u32 {
        let fields = ResourceFields::new(ResourceKind::Item)
            .with_value(Value::literal("dcterms:identifier", format!("OLD-{n:04}")));
        store
            .insert_resource(Resource::from(fields))
            .expect("seed resource");
    }
    let validator = Validator::new(store);
    let template = catalogue_template();
    let options = ValidationOptions::strict();

    let mut group = c.benchmark_group("validate");
    for subjects in [1usize, 8, 64] {
        let mut fields = ResourceFields::new(ResourceKind::Item)
            .with_value(Value::literal("dcterms:identifier", "NEW-0001"));
        for n in 0..subjects {
            fields = fields.with_value(Value::literal("dcterms:subject", format!("subject {n}")));
        }
        let resource = Resource::from(fields);
        group.throughput(Throughput::Elements(subjects as u64));
        group.bench_function(format!("subjects_{subjects}"), |b| {
            b.iter(|| {
                validator
                    .validate(black_box(&template), black_box(&resource), &options)
                    .expect("validate")
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);

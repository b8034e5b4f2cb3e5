//! Filter Evaluation Benchmarks
//!
//! Measures filter parsing and evaluation against validated User documents,
//! and compares engine-side filtering of a full list with a plain scan.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use scim_engine::filter::parse_filter;
use scim_engine::schema::{OperationContext, SchemaRegistry, SchemaValidator};
use scim_engine::{Document, ResourceType};
use serde_json::json;
use std::sync::Arc;

const FILTERS: &[(&str, &str)] = &[
    ("equality", r#"userName eq "user500""#),
    ("starts_with", r#"name.familyName sw "Fam""#),
    (
        "value_path",
        r#"emails[type eq "work" and value co "@example.com"]"#,
    ),
    (
        "compound",
        r#"(active eq true or title pr) and not (userName ew "7")"#,
    ),
];

fn users() -> Arc<ResourceType> {
    let registry = SchemaRegistry::with_embedded_schemas().expect("embedded schemas load");
    Arc::clone(registry.get_resource_type("User").expect("User is registered"))
}

fn documents(resource_type: &ResourceType, count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            let raw = json!({
                "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
                "userName": format!("user{}", i),
                "active": i % 2 == 0,
                "name": {"givenName": "Given", "familyName": format!("Family{}", i)},
                "emails": [
                    {"value": format!("user{}@example.com", i), "type": "work", "primary": true},
                    {"value": format!("user{}@home.example.org", i), "type": "home"}
                ]
            });
            SchemaValidator::new(resource_type, OperationContext::Create)
                .validate(&raw)
                .expect("fixture is valid")
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    let resource_type = users();
    let mut group = c.benchmark_group("filter_parse");
    for (name, text) in FILTERS {
        group.bench_with_input(BenchmarkId::from_parameter(name), text, |b, text| {
            b.iter(|| parse_filter(black_box(text), &resource_type).expect("filter parses"))
        });
    }
    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let resource_type = users();
    let mut group = c.benchmark_group("filter_evaluate");
    for size in [100usize, 1_000, 10_000] {
        let documents = documents(&resource_type, size);
        group.throughput(Throughput::Elements(size as u64));
        for (name, text) in FILTERS {
            let filter = parse_filter(text, &resource_type).expect("filter parses");
            group.bench_with_input(
                BenchmarkId::new(*name, size),
                &documents,
                |b, documents| {
                    b.iter(|| {
                        documents
                            .iter()
                            .filter(|document| filter.matches(black_box(document)))
                            .count()
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_raw_scan(c: &mut Criterion) {
    let resource_type = users();
    let documents: Vec<_> = documents(&resource_type, 10_000)
        .iter()
        .map(Document::to_json)
        .collect();

    c.bench_function("raw_json_username_scan_10000", |b| {
        b.iter(|| {
            documents
                .iter()
                .filter(|value| value["userName"] == black_box("user500"))
                .count()
        })
    });
}

criterion_group!(benches, bench_parse, bench_evaluate, bench_raw_scan);
criterion_main!(benches);

//! Parameter validation throughput.

use atb_core::ParameterSchema;
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use serde_json::json;

fn bench_validate(c: &mut Criterion) {
    let schema = ParameterSchema::from_value(json!({
        "type": "object",
        "properties": {
            "owner": {"type": "string"},
            "repo": {"type": "string"},
            "title": {"type": "string"},
            "body": {"type": "string"},
            "labels": {"type": "array", "items": {"type": "string"}},
        },
        "required": ["owner", "repo", "title"],
    }))
    .unwrap();

    let conformant = json!({
        "owner": "octocat",
        "repo": "hello-world",
        "title": "Found a bug",
        "labels": ["bug"],
    });
    let nonconformant = json!({"owner": 1, "labels": "bug"});

    c.bench_function("validate_conformant", |b| {
        b.iter(|| schema.validate(black_box(&conformant)).is_ok())
    });
    c.bench_function("validate_nonconformant", |b| {
        b.iter(|| schema.validate(black_box(&nonconformant)).is_err())
    });
}

criterion_group!(benches, bench_validate);
criterion_main!(benches);

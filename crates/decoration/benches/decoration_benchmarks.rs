use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};

use closet_core::{Attributes, FixedClock};
use closet_decoration::{DecorationOptions, DecorationPipeline, Promotion, PromotionTarget};

fn pipeline() -> DecorationPipeline {
    let clock = Arc::new(FixedClock::new(Utc.with_ymd_and_hms(2024, 11, 20, 12, 0, 0).unwrap()));
    let promotions = vec![Promotion {
        id: 1,
        title: "Promoção Camisetas".into(),
        description: "30% off em todas as camisetas".into(),
        discount_percentage: 30.0,
        store: "Loja Fashion".into(),
        valid_until: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        target: PromotionTarget::CategoryContains("camiseta".into()),
    }];
    let mut pipeline = DecorationPipeline::with_defaults(clock, promotions);
    pipeline.configure(DecorationOptions {
        log_decorations: false,
        ..DecorationOptions::default()
    });
    pipeline
}

fn item(id: u64) -> Attributes {
    let value = json!({
        "id": id,
        "name": format!("Camiseta {id}"),
        "category_name": "Camiseta",
        "colors": ["preto", "branco"],
        "is_favorite": id % 2 == 0,
        "usage_count": id % 30,
        "purchase_price": 79.9,
        "first_worn": "2024-01-10",
        "last_worn": "2024-11-01",
        "season": "verao",
    });
    match value {
        Value::Object(map) => map,
        _ => Attributes::new(),
    }
}

fn bench_single_item(c: &mut Criterion) {
    let pipeline = pipeline();
    let favorite = item(2);
    let plain = item(1);

    let mut group = c.benchmark_group("decorate_single");
    group.bench_function("all_enrichers_favorite", |b| {
        b.iter(|| pipeline.decorate(black_box(&favorite), None).unwrap());
    });
    group.bench_function("all_enrichers_plain", |b| {
        b.iter(|| pipeline.decorate(black_box(&plain), None).unwrap());
    });
    group.bench_function("usage_only", |b| {
        b.iter(|| pipeline.decorate(black_box(&plain), Some(&["usage"][..])).unwrap());
    });
    group.finish();
}

fn bench_listing(c: &mut Criterion) {
    let pipeline = pipeline();
    let mut group = c.benchmark_group("decorate_items");

    for size in [10u64, 100, 1_000] {
        let items: Vec<_> = (0..size).map(item).collect();
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| pipeline.decorate_items(black_box(items), None).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_item, bench_listing);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quotation_core::{Detection, MemoryCounterStore, QuotationEngine};

fn bench_generate(c: &mut Criterion) {
    let engine = QuotationEngine::with_default_prices(MemoryCounterStore::new());
    let detections: Vec<Detection> = (0..500)
        .map(|i| Detection::new(i % 5, 0.8, [i as i32, i as i32, i as i32 + 10, i as i32 + 10]))
        .collect();

    c.bench_function("price_500", |b| b.iter(|| engine.price(black_box(&detections))));
    c.bench_function("generate_500", |b| b.iter(|| engine.generate(black_box(&detections)).unwrap()));
}

criterion_group!(benches, bench_generate);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main};

mod common;

criterion_group!(
    math_benches,
    common::bench_price_math,
    common::bench_tree_math,
    common::bench_swap,
);
criterion_main!(math_benches);

use bin_pool_math::math::price_math::get_price_from_id;
use bin_pool_math::pool::liquidity::LiquidityShape;
use bin_pool_math::{Address, Amounts, BinPool, ProtocolFee, TreeIndex, MID_BIN_ID, PRECISION};
use criterion::{black_box, Criterion};

pub fn bench_price_math(c: &mut Criterion) {
    c.bench_function("price_math::get_price_from_id", |b| {
        b.iter(|| get_price_from_id(black_box(MID_BIN_ID + 5_000), black_box(25)).unwrap())
    });
}

pub fn bench_tree_math(c: &mut Criterion) {
    let mut tree = TreeIndex::new();
    for i in 0..512u32 {
        tree.add(MID_BIN_ID - 40_000 + i * 157);
    }
    c.bench_function("tree_math::find_first_right", |b| {
        b.iter(|| tree.find_first_right(black_box(MID_BIN_ID)))
    });
}

pub fn bench_swap(c: &mut Criterion) {
    let mut pool = BinPool::new();
    pool.initialize(MID_BIN_ID, ProtocolFee::ZERO, 10).unwrap();

    // ten bins of Y below and at the active id
    let shapes: Vec<LiquidityShape> = (0..10u32)
        .map(|i| LiquidityShape {
            id: MID_BIN_ID - i,
            dist_x: 0,
            dist_y: PRECISION / 10,
        })
        .collect();
    pool.mint(Address::ZERO, &shapes, Amounts::new(0, 10_000_000), 25)
        .unwrap();

    c.bench_function("pool::get_swap_out", |b| {
        b.iter(|| {
            pool.get_swap_out(black_box(true), 25, black_box(5_000_000))
                .unwrap()
        })
    });
}

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sgm_stereo::{CostVolume, ExecutionStrategy, PenaltyField, SgmAggregator, VolumeShape};

fn synthetic_cost(rows: usize, cols: usize, disp: usize) -> CostVolume {
    let shape = VolumeShape::new(rows, cols, disp);
    let data = (0..shape.len())
        .map(|i| (i.wrapping_mul(2654435761) % 97) as f32)
        .collect();
    CostVolume::from_vec(data, shape).unwrap()
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("SGM Aggregation");
    group.sample_size(10);

    for &(rows, cols, disp) in &[(64, 64, 32), (128, 160, 64), (240, 320, 64)] {
        let cost = synthetic_cost(rows, cols, disp);
        let p1 = PenaltyField::uniform(rows, cols, 8, 8.0);
        let p2 = PenaltyField::uniform(rows, cols, 8, 32.0);
        let size = format!("{rows}x{cols}x{disp}");

        for strategy in [ExecutionStrategy::Wavefront, ExecutionStrategy::RayParallel] {
            let sgm = SgmAggregator::new().with_strategy(strategy);
            let id = BenchmarkId::new(strategy.name(), &size);
            group.bench_with_input(id, &cost, |b, cost| {
                b.iter(|| sgm.aggregate(black_box(cost), &p1, &p2, None).unwrap())
            });
        }
    }

    group.finish();
}

fn bench_cost_paths(c: &mut Criterion) {
    let (rows, cols, disp) = (128, 160, 64);
    let cost = synthetic_cost(rows, cols, disp);
    let p1 = PenaltyField::uniform(rows, cols, 8, 8.0);
    let p2 = PenaltyField::uniform(rows, cols, 8, 32.0);

    let mut group = c.benchmark_group("SGM Outputs");
    group.sample_size(10);

    group.bench_function("Aggregated Only", |b| {
        let sgm = SgmAggregator::new();
        b.iter(|| sgm.aggregate(black_box(&cost), &p1, &p2, None).unwrap())
    });

    group.bench_function("With Cost Paths", |b| {
        let sgm = SgmAggregator::new()
            .with_cost_paths(true)
            .with_overcounting(true);
        b.iter(|| sgm.aggregate(black_box(&cost), &p1, &p2, None).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_cost_paths);
criterion_main!(benches);

//! Benchmarks for rank-core scoring math.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use rank_core::{
    BayesianPrior, ItemId, Rating, ScoreAggregate, ScoreRange, TrustScore, UserId, VoteCounters,
    WeightCalculator,
};

fn sample_ratings(n: usize) -> Vec<Rating> {
    let range = ScoreRange::default();
    let item = ItemId::new();
    (0..n)
        .map(|i| {
            let score = range.check((i % 10 + 1) as i64).unwrap();
            let comment = (i % 3 == 0).then(|| "solid pacing".to_string());
            let mut rating = Rating::new(item, UserId::new(), score, comment, TrustScore::NEUTRAL);
            rating.counters = VoteCounters::new((i % 50) as u32, (i % 7) as u32);
            rating.weight = 0.5 + (i % 4) as f64 * 0.25;
            rating
        })
        .collect()
}

fn benchmark_weight(c: &mut Criterion) {
    let calc = WeightCalculator::default();
    let ratings = sample_ratings(1);
    let rating = &ratings[0];

    c.bench_function("weight_single_rating", |b| {
        b.iter(|| calc.weight(black_box(rating), black_box(TrustScore::NEUTRAL)));
    });
}

fn benchmark_aggregate(c: &mut Criterion) {
    let prior = BayesianPrior::default();
    let ratings = sample_ratings(10_000);

    c.bench_function("aggregate_10k_ratings", |b| {
        b.iter(|| {
            let aggregate = ScoreAggregate::from_ratings(black_box(&ratings));
            prior.score(&aggregate)
        });
    });
}

criterion_group!(benches, benchmark_weight, benchmark_aggregate);
criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use collatz_rules::*;
use num_bigint::BigInt;
use num_traits::One;

fn bench_stop_27(c: &mut Criterion) {
    let n = BigInt::from(27u64);

    c.bench_function("stop label n=27", |b| {
        b.iter(|| find_collatz_stop_binary(black_box(&n)))
    });
}

fn bench_stop_large(c: &mut Criterion) {
    let n = (BigInt::one() << 1000u32) - BigInt::one();

    c.bench_function("stop label 2^1000-1", |b| {
        b.iter(|| find_collatz_stop_binary(black_box(&n)))
    });
}

fn bench_stop_generic_x5(c: &mut Criterion) {
    let n = BigInt::from(7u64);
    let params = MapParams::new(2, 5, 1).unwrap();

    c.bench_function("stop label 5n+1 n=7 (limit 1000)", |b| {
        b.iter(|| stop_binary_with(black_box(&n), params, 1000))
    });
}

fn bench_coefficient_long_label(c: &mut Criterion) {
    let n = (BigInt::one() << 1000u32) - BigInt::one();
    let label = find_collatz_stop_binary(&n).label;
    let classic = MapParams::default();

    c.bench_function("coefficient of 2^1000-1 label", |b| {
        b.iter(|| coefficient(black_box(&label), classic))
    });
}

fn bench_solve_small(c: &mut Criterion) {
    let problem = DiophantineProblem::new(37, 59, BigInt::from(1_000_003));

    c.bench_function("solve 3^37 x - 2^59 y", |b| {
        b.iter(|| black_box(&problem).solve())
    });
}

fn bench_solve_large(c: &mut Criterion) {
    let problem = DiophantineProblem::new(1000, 1585, BigInt::from(3u32).pow(500));

    c.bench_function("solve 3^1000 x - 2^1585 y", |b| {
        b.iter(|| black_box(&problem).solve())
    });
}

fn bench_coverage(c: &mut Criterion) {
    let conditions: Vec<String> = std::iter::once("x % 2 == 0".to_string())
        .chain((0..512).map(|i| format!("x % 1024 == {}", 2 * i + 1)))
        .collect();
    let set = RuleSet::from_conditions(conditions.as_slice()).unwrap();

    c.bench_function("coverage mod 1024 (513 rules)", |b| {
        b.iter(|| black_box(&set).coverage())
    });
}

fn bench_survey_10k(c: &mut Criterion) {
    let start = BigInt::from(1);
    let end = BigInt::from(10_000);

    c.bench_function("survey 1..=10000 (parallel)", |b| {
        b.iter(|| {
            survey_range_parallel(
                black_box(&start),
                black_box(&end),
                MapParams::default(),
                DEFAULT_STEP_LIMIT,
                |_, _| {},
            )
        })
    });
}

criterion_group!(
    benches,
    bench_stop_27,
    bench_stop_large,
    bench_stop_generic_x5,
    bench_coefficient_long_label,
    bench_solve_small,
    bench_solve_large,
    bench_coverage,
    bench_survey_10k,
);
criterion_main!(benches);

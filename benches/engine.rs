//! Engine benchmarks
//!
//! - Full-factorial design generation with volume calculation
//! - Regression fits per model family
//! - Gaussian-process suggestion latency

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use scout_doe::analysis::{ModelType, RegressionModel};
use scout_doe::design::ExperimentDesignBuilder;
use scout_doe::project::{Factor, FactorSet};
use scout_doe::roles::FactorRoles;
use scout_doe::table::{Dataset, Value};

/// `count` numeric factors with three levels each and a 1000× stock
fn create_factors(count: usize) -> FactorSet {
    let mut factors = FactorSet::new();
    for i in 0..count {
        let factor = Factor::numeric(format!("additive_{i}"), [10.0, 20.0, 40.0])
            .unwrap()
            .with_stock(1000.0)
            .unwrap();
        factors.add(factor).unwrap();
    }
    factors
}

/// Observed screen: one categorical and two numeric factors over `rows` rows
#[allow(clippy::cast_precision_loss)]
fn create_observations(rows: usize) -> Dataset {
    let buffers = ["Tris", "HEPES", "MES", "PBS"];
    let data = (0..rows)
        .map(|i| {
            let nacl = 50.0 * (i % 5) as f64;
            let glycerol = 2.5 * (i % 7) as f64;
            let shift = (i % buffers.len()) as f64;
            let tm = 0.01f64.mul_add(nacl, 50.0) + 0.4 * glycerol - 0.002 * glycerol * glycerol
                + shift
                + 0.05 * ((i * 7919) % 11) as f64;
            vec![
                Value::from(buffers[i % buffers.len()]),
                Value::from(nacl),
                Value::from(glycerol),
                Value::from(tm),
            ]
        })
        .collect();
    Dataset::from_rows(&["Buffer", "NaCl", "Glycerol", "Tm"], data).unwrap()
}

fn roles() -> FactorRoles {
    FactorRoles::new(&["Buffer", "NaCl", "Glycerol"], &["Buffer"], &[]).unwrap()
}

/// Benchmark design generation (3^n rows)
fn bench_design_generation(c: &mut Criterion) {
    let mut group = c.benchmark_group("design_generation");

    for count in [2, 4, 6].iter() {
        let factors = create_factors(*count);
        let builder = ExperimentDesignBuilder::new(200.0).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| {
                let design = builder.build(&factors).unwrap();
                black_box(design);
            });
        });
    }

    group.finish();
}

/// Benchmark regression fits per model family
fn bench_regression_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("regression_fit");
    let data = create_observations(96);
    let roles = roles();

    for model_type in ModelType::ALL {
        group.bench_with_input(
            BenchmarkId::from_parameter(model_type.as_str()),
            &model_type,
            |b, model_type| {
                b.iter(|| {
                    let model = RegressionModel::fit(&data, &roles, "Tm", *model_type).unwrap();
                    black_box(model);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark a single suggestion after `rows` historical observations
#[cfg(feature = "bayes")]
fn bench_suggest(c: &mut Criterion) {
    use scout_doe::config::OptimizerConfig;
    use scout_doe::optimize::{BayesianOptimizer, GaussianProcessProvider};

    let mut group = c.benchmark_group("gp_suggest");

    for rows in [24, 96].iter() {
        let config = OptimizerConfig {
            seed: Some(42),
            ..OptimizerConfig::default()
        };
        let mut optimizer =
            BayesianOptimizer::with_provider(Box::new(GaussianProcessProvider), config);
        optimizer.set_data(&create_observations(*rows), roles(), "Tm").unwrap();
        optimizer.initialize(false).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(rows), rows, |b, _| {
            b.iter(|| {
                let suggestion = optimizer.suggest().unwrap();
                black_box(suggestion);
            });
        });
    }

    group.finish();
}

#[cfg(feature = "bayes")]
criterion_group!(
    benches,
    bench_design_generation,
    bench_regression_fit,
    bench_suggest
);
#[cfg(not(feature = "bayes"))]
criterion_group!(benches, bench_design_generation, bench_regression_fit);
criterion_main!(benches);

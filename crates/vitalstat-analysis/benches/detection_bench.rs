//! Detection and correlation benchmarks.
//!
//! Benchmarks: isolation forest build+score, LOF, and a correlation matrix
//! over growing variable counts.
//! Run with: cargo bench -p vitalstat-analysis --bench detection_bench

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use vitalstat_analysis::anomaly::{AnomalyDetector, AnomalyMethod};
use vitalstat_analysis::correlation::{CorrelationEngine, CorrelationType};
use vitalstat_core::config::AnomalyConfig;

fn noisy_series(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| 70.0 + rng.gen_range(-5.0..5.0)).collect()
}

fn isolation_forest(c: &mut Criterion) {
    let mut group = c.benchmark_group("isolation_forest");
    group.sample_size(20);

    for parallel in [false, true] {
        let detector = AnomalyDetector::new(AnomalyConfig {
            seed: Some(1),
            parallel: Some(parallel),
            ..Default::default()
        });
        let method = AnomalyMethod::IsolationForest {
            num_trees: 100,
            contamination: 0.05,
        };
        for size in [1_000, 10_000] {
            let data = noisy_series(size, 3);
            let label = if parallel { "parallel" } else { "sequential" };
            group.bench_with_input(BenchmarkId::new(label, size), &data, |b, data| {
                b.iter(|| detector.detect_univariate_anomalies(data, None, &method).unwrap());
            });
        }
    }
    group.finish();
}

fn local_outlier_factor(c: &mut Criterion) {
    let mut group = c.benchmark_group("lof");
    group.sample_size(10);
    let detector = AnomalyDetector::with_defaults();
    let method = detector.lof_method();

    for size in [200, 1_000] {
        let data = noisy_series(size, 5);
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| detector.detect_univariate_anomalies(data, None, &method).unwrap());
        });
    }
    group.finish();
}

fn correlation_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("correlation_matrix");
    let engine = CorrelationEngine::with_defaults();

    for vars in [5usize, 20] {
        let variables: Vec<Vec<f64>> = (0..vars).map(|k| noisy_series(500, k as u64)).collect();
        let names: Vec<String> = (0..vars).map(|k| format!("metric_{k}")).collect();
        group.bench_with_input(BenchmarkId::new("kendall", vars), &variables, |b, variables| {
            b.iter(|| {
                engine
                    .calculate_correlation_matrix(variables, &names, CorrelationType::Kendall)
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, isolation_forest, local_outlier_factor, correlation_matrix);
criterion_main!(benches);

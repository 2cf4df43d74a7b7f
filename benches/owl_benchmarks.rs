use criterion::{black_box, criterion_group, criterion_main, Criterion};
use owl_frontier::classifier::scaler::StandardScaler;
use owl_frontier::classifier::svc::{SupportVectorClassifier, SvcParams};
use owl_frontier::constants::WEIGHT_COLUMN;
use owl_frontier::data::Matrix;
use owl_frontier::owl::{calculate_owl_weights, owl_weights, FrontierSweep, OwlColumns, OwlConfig, WeightParams};
use owl_frontier::simulate::SyntheticCohort;
use std::time::Duration;

pub fn owl_benchmarks(c: &mut Criterion) {
    let cohort = SyntheticCohort {
        n_subjects: 1000,
        ..Default::default()
    }
    .generate()
    .unwrap();
    let columns = OwlColumns::synthetic(5);
    let config = OwlConfig::default();

    let n = cohort.len();
    let risk: Vec<f64> = (0..n).map(|i| (i as f64 + 0.5) / n as f64).collect();
    let propensity = vec![0.5; n];
    let cost = cohort.column("cost").unwrap().to_vec();
    let treatment = cohort.binary_column("Tx").unwrap();
    let params = WeightParams {
        k: 0.5,
        alpha: 1.0,
        epsilon: 1e-8,
    };
    c.bench_function("owl_weights", |b| {
        b.iter(|| {
            owl_weights(
                black_box(&risk),
                black_box(&propensity),
                black_box(&cost),
                black_box(&treatment),
                black_box(&params),
            )
            .unwrap()
        })
    });
    c.bench_function("calculate_owl_weights", |b| {
        b.iter(|| calculate_owl_weights(black_box(&cohort), black_box(&columns), black_box(&config)).unwrap())
    });

    let weighted = calculate_owl_weights(&cohort, &columns, &config).unwrap();
    let data = weighted.feature_matrix(&columns.features).unwrap();
    let (_, scaled) = StandardScaler::fit_transform(&Matrix::new(&data, n, 5)).unwrap();
    let matrix = Matrix::new(&scaled, n, 5);
    let y = weighted.column("Tx").unwrap();
    let w = weighted.column(WEIGHT_COLUMN).unwrap();

    let mut svm_train = c.benchmark_group("train_svm");
    svm_train.warm_up_time(Duration::from_secs(5));
    svm_train.sample_size(20);
    svm_train.bench_function("train_svm_linear", |b| {
        b.iter(|| {
            SupportVectorClassifier::fit(black_box(&SvcParams::default()), black_box(&matrix), black_box(y), Some(w))
                .unwrap()
        })
    });
    svm_train.bench_function("train_svm_rbf", |b| {
        let params = SvcParams {
            kernel: "rbf".parse().unwrap(),
            ..Default::default()
        };
        b.iter(|| SupportVectorClassifier::fit(black_box(&params), black_box(&matrix), black_box(y), Some(w)).unwrap())
    });
    svm_train.finish();

    let small = SyntheticCohort {
        n_subjects: 200,
        ..Default::default()
    }
    .generate()
    .unwrap();
    let (train, test) = small.train_test_split(0.2, 42).unwrap();
    let sweep = FrontierSweep::new(vec![0.0, 0.5, 1.0]);
    let mut frontier = c.benchmark_group("frontier_sweep");
    frontier.sample_size(10);
    frontier.bench_function("sweep_sequential", |b| {
        b.iter(|| sweep.run(black_box(&train), black_box(&test), &columns, &config).unwrap())
    });
    let parallel = sweep.clone().parallel(true);
    frontier.bench_function("sweep_parallel", |b| {
        b.iter(|| parallel.run(black_box(&train), black_box(&test), &columns, &config).unwrap())
    });
    frontier.finish();
}

criterion_group!(benches, owl_benchmarks);
criterion_main!(benches);

//! # Fed-Ledger Selection Benchmarks
//!
//! | Operation | Expectation |
//! |-----------|-------------|
//! | Seed derivation | One Keccak-256 per transaction |
//! | Seeded shuffle | Linear in fresh check-ins |
//! | `startTraining` on the in-memory ledger | Dominated by the check-in scan |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fl_round_coordinator::{
    derive_selection_seed, select_trainers, shuffle_with_seed, RoundCoordinationApi,
    TrainerCheckIn,
};
use fl_tests::integration::fixtures::{admin, params, trainers, Network, MODEL_ID};
use rand::Rng;
use std::time::Duration;

fn check_ins(n: usize) -> Vec<TrainerCheckIn> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|i| TrainerCheckIn {
            client_id: format!("x509::CN=trainer{}", i),
            username: format!("trainer{}", i),
            organization_id: "Org1MSP".to_string(),
            checked_in_timestamp: 1_700_000_000_000 + rng.gen_range(0..50_000),
        })
        .collect()
}

fn bench_seed_derivation(c: &mut Criterion) {
    c.bench_function("derive_selection_seed", |b| {
        b.iter(|| {
            derive_selection_seed(
                black_box("3f1c9a9e-6a0b-4d0e-9a57-1f7b2f0e6c11"),
                black_box(1_700_000_000_000),
                black_box("mnist-cnn"),
                black_box(12),
            )
        })
    });
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("trainer-selection");
    let seed = derive_selection_seed("bench", 0, "mnist-cnn", 0);

    for size in [10usize, 100, 1_000, 10_000] {
        let pool = check_ins(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("shuffle", size), &pool, |b, pool| {
            b.iter(|| shuffle_with_seed(black_box(pool), &seed))
        });

        let k = (size / 10).max(1) as u64;
        group.bench_with_input(BenchmarkId::new("select_10pct", size), &pool, |b, pool| {
            b.iter(|| select_trainers(black_box(pool.clone()), k, &seed, 0))
        });
    }
    group.finish();
}

fn bench_start_training(c: &mut Criterion) {
    let mut group = c.benchmark_group("start-training");
    group.measurement_time(Duration::from_secs(10));

    for size in [10usize, 100, 500] {
        let net = Network::new();
        net.create_model(params((size / 5).max(1) as u64, 1, 10));
        net.check_in_all(&trainers(size));

        group.bench_with_input(BenchmarkId::from_parameter(size), &net, |b, net| {
            b.iter(|| {
                let peer = net.fork();
                peer.run(&admin(), |c, inv| c.start_training(inv, MODEL_ID))
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_seed_derivation,
    bench_selection,
    bench_start_training
);
criterion_main!(benches);

//! Performance benchmarks for hotswap-store.
//!
//! - Flattened-key reads, cached and uncached
//! - Scaling with concurrent readers
//! - Reads while a writer keeps applying updates
//! - Apply cost, with and without watchers

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hotswap_store::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn seeded_store() -> Store {
    let store = Store::new();
    for i in 0..100 {
        store
            .set(
                &format!("services.svc{}", i),
                json!({"dsn": format!("mysql://db{}", i), "pool": i, "enabled": true}),
            )
            .unwrap();
    }
    store
}

/// Benchmark single-threaded read latency
fn benchmark_read_latency(c: &mut Criterion) {
    let store = seeded_store();

    let mut group = c.benchmark_group("read_latency");
    group.bench_function("leaf_get", |b| {
        b.iter(|| black_box(store.get("services.svc42.dsn")));
    });
    group.bench_function("subtree_get", |b| {
        b.iter(|| black_box(store.get("services.svc42")));
    });
    group.bench_function("typed_get", |b| {
        b.iter(|| black_box(store.get_int("services.svc42.pool")));
    });
    group.bench_function("missing_get", |b| {
        b.iter(|| black_box(store.get("services.nope.dsn")));
    });
    group.finish();
}

/// Benchmark concurrent reads with varying thread counts
fn benchmark_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_reads");

    for num_threads in [1, 2, 4, 8, 16] {
        group.throughput(Throughput::Elements(num_threads as u64 * 1000));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_threads", num_threads)),
            &num_threads,
            |b, &num_threads| {
                let store = seeded_store();
                let barrier = Arc::new(Barrier::new(num_threads + 1));

                b.iter_custom(|iters| {
                    let mut handles = vec![];
                    let start_barrier = Arc::clone(&barrier);

                    for _ in 0..num_threads {
                        let store = store.clone();
                        let b = Arc::clone(&barrier);

                        handles.push(thread::spawn(move || {
                            b.wait();

                            let start = std::time::Instant::now();
                            for _ in 0..iters {
                                black_box(store.get("services.svc7.dsn"));
                            }
                            start.elapsed()
                        }));
                    }

                    start_barrier.wait();

                    let total_duration: Duration =
                        handles.into_iter().map(|h| h.join().unwrap()).sum();
                    total_duration / num_threads as u32
                });
            },
        );
    }

    group.finish();
}

/// Benchmark applies while 8 reader threads hammer the store
fn benchmark_apply_under_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_under_load");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("apply_with_8_readers", |b| {
        b.iter_custom(|iters| {
            let store = seeded_store();
            let keep_running = Arc::new(AtomicBool::new(true));
            let reads_completed = Arc::new(AtomicUsize::new(0));

            let readers: Vec<_> = (0..8)
                .map(|_| {
                    let store = store.clone();
                    let running = Arc::clone(&keep_running);
                    let counter = Arc::clone(&reads_completed);
                    thread::spawn(move || {
                        while running.load(Ordering::Relaxed) {
                            black_box(store.get("services.svc1.pool"));
                            counter.fetch_add(1, Ordering::Relaxed);
                        }
                    })
                })
                .collect();

            let start = std::time::Instant::now();
            for i in 0..iters {
                store.set("services.svc1.pool", i).unwrap();
            }
            let duration = start.elapsed();

            keep_running.store(false, Ordering::Relaxed);
            for reader in readers {
                reader.join().unwrap();
            }

            let total_reads = reads_completed.load(Ordering::Relaxed);
            println!("  Completed {} reads during {} applies", total_reads, iters);

            duration
        });
    });

    group.finish();
}

/// Benchmark apply cost
fn benchmark_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply");

    group.bench_function("set_leaf", |b| {
        let store = seeded_store();
        let mut counter = 0;
        b.iter(|| {
            counter += 1;
            store.set("services.svc3.pool", counter).unwrap();
        });
    });

    group.bench_function("set_leaf_with_watchers", |b| {
        let store = seeded_store();
        for i in 0..100 {
            store.watch(&format!("services.svc{}", i), |_| {});
        }
        let mut counter = 0;
        b.iter(|| {
            counter += 1;
            store.set("services.svc3.pool", counter).unwrap();
        });
    });

    group.bench_function("unchanged_apply", |b| {
        let store = seeded_store();
        let mut table = Table::new();
        table.insert("services".to_string(), json!({"svc3": {"pool": 3}}));
        b.iter(|| black_box(store.apply(table.clone())));
    });

    group.finish();
}

criterion_group!(
    benches,
    benchmark_read_latency,
    benchmark_concurrent_reads,
    benchmark_apply_under_load,
    benchmark_apply,
);

criterion_main!(benches);

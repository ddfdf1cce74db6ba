// Insert/remove/find throughput at increasing n, per SPEC_FULL.md 3.4.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use interval_skiplist::{Interval, IntervalHandle, IntervalSkipList};

fn populated(n: u64) -> (IntervalSkipList<u64, u64>, Vec<IntervalHandle<u64, u64>>) {
    let mut list = IntervalSkipList::with_seed(42);
    let mut handles = Vec::with_capacity(n as usize);
    for i in 0..n {
        let left = i * 2;
        let right = left + 10;
        let handle = Interval::new_handle(left, right, i).unwrap();
        list.insert(handle.clone()).unwrap();
        handles.push(handle);
    }
    (list, handles)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");

    for n in [100u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut list: IntervalSkipList<u64, u64> = IntervalSkipList::with_seed(7);
                for i in 0..n {
                    let left = i * 2;
                    list.insert(Interval::new_handle(left, left + 10, i).unwrap()).unwrap();
                }
                black_box(list);
            });
        });
    }

    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let mut group = c.benchmark_group("find");

    for n in [100u64, 1_000, 10_000] {
        let (list, _) = populated(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            b.iter(|| {
                let mut out = Vec::new();
                for probe in (0..n * 2).step_by(7) {
                    out.clear();
                    list.find(black_box(&probe), &mut out);
                }
            });
        });
    }

    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");

    for n in [100u64, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let (mut list, handles) = populated(n);
                for handle in &handles {
                    list.remove(handle).unwrap();
                }
                black_box(list);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_find, bench_remove);
criterion_main!(benches);

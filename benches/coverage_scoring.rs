/// Coverage Scoring Benchmarks
///
/// Scoring and ranking over a synthetic catalog sized like the Debian
/// static-analysis table (tens of thousands of packages, a few hundred
/// syscalls).
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use shimcov::catalog::{Package, UsageCatalog};
use shimcov::coverage::{score, CoverageAnalysis};
use shimcov::popularity::PopularityTable;
use shimcov::support::SupportSet;
use shimcov::syscalls::builtin_syscall_name;

const SYSCALLS_PER_PACKAGE: usize = 40;

fn syscall_names() -> Vec<&'static str> {
    (0..512).filter_map(builtin_syscall_name).collect()
}

/// Deterministic catalog: package `i` uses a sliding window of the syscall table
fn synthetic_inputs(packages: usize) -> (UsageCatalog, PopularityTable) {
    let names = syscall_names();
    let catalog = UsageCatalog::from_packages(
        "bench",
        (0..packages).map(|i| {
            let start = (i * 7) % names.len();
            let syscalls = (0..SYSCALLS_PER_PACKAGE).map(|k| names[(start + k * 3) % names.len()]);
            Package::with_syscalls(format!("pkg{}", i), syscalls)
        }),
    )
    .expect("synthetic ids are unique");
    let weights = (0..packages).map(|i| (format!("pkg{}", i), (packages - i) as f64));
    let total = (packages * (packages + 1) / 2) as f64;
    let popularity = PopularityTable::from_weights(weights, total).expect("weights are valid");
    (catalog, popularity)
}

fn support() -> SupportSet {
    SupportSet::new(syscall_names().into_iter().step_by(2).take(120))
}

fn bench_score(c: &mut Criterion) {
    let mut group = c.benchmark_group("score");
    for size in [1_000usize, 10_000, 30_000] {
        let (catalog, popularity) = synthetic_inputs(size);
        let support = support();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(score(&support, &catalog, &popularity)));
        });
    }
    group.finish();
}

fn bench_full_analysis(c: &mut Criterion) {
    let mut group = c.benchmark_group("analysis");
    group.sample_size(20);
    for size in [1_000usize, 10_000, 30_000] {
        let (catalog, popularity) = synthetic_inputs(size);
        let support = support();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| black_box(CoverageAnalysis::run(&support, &catalog, &popularity)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_score, bench_full_analysis);
criterion_main!(benches);

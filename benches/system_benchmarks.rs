use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use load_collector::{
    metrics::{namespace, procfs::parse_loadavg},
    CpuCount, CpuCountResolver, LoadCollector, LoadError, LoadSample, MetricType, Namespace,
    ProcfsSource, Result,
};
use std::fs;

struct FixedCpus;

impl CpuCountResolver for FixedCpus {
    fn resolve(&self) -> Result<CpuCount> {
        CpuCount::new(8).ok_or_else(|| LoadError::resolution_error("no CPUs"))
    }
}

/// Benchmark parsing a loadavg line
fn bench_parse_loadavg(c: &mut Criterion) {
    c.bench_function("parse_loadavg", |b| {
        b.iter(|| parse_loadavg(black_box("0.40 0.08 0.16 1/100 1111\n")).expect("Should parse"))
    });
}

/// Benchmark namespace enumeration and resolution
fn bench_namespace_mapping(c: &mut Criterion) {
    let raw = parse_loadavg("0.40 0.08 0.16 1/100 1111").expect("Should parse");
    let sample = LoadSample::build(&raw, CpuCount::new(8).expect("non-zero"));
    let prefix = Namespace::new(["intel", "procfs", "load"]);

    c.bench_function("enumerate", |b| {
        b.iter(|| namespace::enumerate(black_box(&sample), &prefix))
    });

    c.bench_function("resolve_all", |b| {
        b.iter(|| {
            namespace::field_names()
                .map(|name| namespace::resolve(black_box(&sample), name).expect("Should resolve"))
                .count()
        })
    });
}

/// Benchmark end-to-end collection from a loadavg file
fn bench_collect_metrics(c: &mut Criterion) {
    let dir = tempfile::TempDir::new().expect("Should create temp dir");
    fs::write(dir.path().join("loadavg"), "0.40 0.08 0.16 1/100 1111\n").expect("Should write");
    let mut collector = LoadCollector::with_source(&FixedCpus, ProcfsSource::from_root(dir.path()))
        .expect("Should create collector");

    let all: Vec<MetricType> = namespace::field_names()
        .map(|name| MetricType::new(LoadCollector::<ProcfsSource>::prefix().child(name)))
        .collect();

    for count in [1usize, 4, 8] {
        let requested = &all[..count];
        c.bench_with_input(BenchmarkId::new("collect_metrics", count), requested, |b, requested| {
            b.iter(|| collector.collect_metrics(requested).expect("Should collect"))
        });
    }
}

criterion_group!(
    benches,
    bench_parse_loadavg,
    bench_namespace_mapping,
    bench_collect_metrics
);
criterion_main!(benches);

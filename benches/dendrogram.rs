use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::prelude::*;
use sctree::cluster::{CutSelector, HierarchicalClustering, Linkage};
use sctree::hierarchy::{flatten, FlattenMode};
use sctree::results::ClusterSource;
use sctree::ObservationSet;

fn synthetic(n: usize, d: usize) -> ObservationSet {
    let mut rng = StdRng::seed_from_u64(42);
    ObservationSet::from_rows(
        (0..n).map(|i| (format!("cell{i}"), (0..d).map(|_| rng.random::<f64>()).collect())),
    )
    .unwrap()
}

fn bench_dendrogram(c: &mut Criterion) {
    let mut group = c.benchmark_group("dendrogram");
    let cells = synthetic(300, 16);

    for linkage in [Linkage::Complete, Linkage::Average] {
        group.bench_function(format!("fit_{linkage:?}_n300_d16"), |b| {
            b.iter(|| {
                HierarchicalClustering::new()
                    .with_linkage(linkage)
                    .fit_dendrogram(black_box(&cells))
                    .unwrap()
            })
        });
    }

    let dendrogram = HierarchicalClustering::new().fit_dendrogram(&cells).unwrap();
    let threshold = CutSelector::new().threshold(&dendrogram).unwrap();
    group.bench_function("flatten_n300", |b| {
        b.iter(|| {
            flatten(
                black_box(&cells),
                dendrogram.clone().into(),
                &FlattenMode::single(threshold),
                ClusterSource::Agglomerative,
            )
            .unwrap()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_dendrogram);
criterion_main!(benches);

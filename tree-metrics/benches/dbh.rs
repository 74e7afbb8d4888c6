use std::f64::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pcd_core::pointcloud::point::{Classification, TreePointSet};
use tree_metrics::{config::DbhConfig, dbh::tree_dbh};

fn trunk_ring(k: usize) -> TreePointSet {
    let xyz: Vec<[f64; 3]> = (0..k)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / k as f64;
            [0.25 * theta.cos(), 0.25 * theta.sin(), 1.3]
        })
        .collect();
    let classification = vec![Classification::Trunk; k];
    TreePointSet::new(xyz, classification)
}

fn bench_dbh(c: &mut Criterion) {
    let config = DbhConfig::default();
    for k in [16, 64, 256] {
        let tree = trunk_ring(k);
        c.bench_function(&format!("dbh_{}_points", k), |b| {
            b.iter(|| tree_dbh(black_box(&tree), black_box(&config)))
        });
    }
}

criterion_group!(benches, bench_dbh);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use kd_index::kdtree::{KDTree, KDTreeBuilder, KDTreeIndex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstar::RTree;

fn generate_points(n: usize, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            [
                rng.gen_range(-1000.0..1000.0),
                rng.gen_range(-1000.0..1000.0),
                rng.gen_range(-1000.0..1000.0),
            ]
        })
        .collect()
}

fn construct_kdtree(points: &[[f64; 3]], max_leaf_size: usize) -> KDTree<f64> {
    let mut builder =
        KDTreeBuilder::with_capacity(3, points.len()).with_max_leaf_size(max_leaf_size);
    for point in points {
        builder.add(point).unwrap();
    }
    builder.finish()
}

fn construct_rstar(points: Vec<[f64; 3]>) -> RTree<[f64; 3]> {
    RTree::bulk_load(points)
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let points = generate_points(100_000, 42);
    let queries = generate_points(1_000, 7);

    let mut group = c.benchmark_group("construction");
    for max_leaf_size in [1, 8, 32] {
        group.bench_with_input(
            BenchmarkId::new("kdtree", max_leaf_size),
            &max_leaf_size,
            |b, &max_leaf_size| b.iter(|| construct_kdtree(&points, max_leaf_size)),
        );
    }
    group.bench_function("rstar bulk", |b| {
        b.iter(|| construct_rstar(points.to_vec()))
    });
    group.finish();

    let tree = construct_kdtree(&points, 8);
    let rstar_tree = construct_rstar(points.to_vec());

    c.bench_function("nearest (kdtree)", |b| {
        b.iter(|| {
            for query in &queries {
                tree.nearest(query).unwrap();
            }
        })
    });

    c.bench_function("nearest approx (kdtree)", |b| {
        b.iter(|| {
            for query in &queries {
                tree.nearest_approx(query).unwrap();
            }
        })
    });

    c.bench_function("nearest (rstar)", |b| {
        b.iter(|| {
            for query in &queries {
                rstar_tree.nearest_neighbor(query).unwrap();
            }
        })
    });

    let text = tree.to_text();
    c.bench_function("write text", |b| b.iter(|| tree.to_text()));
    c.bench_function("read text", |b| {
        b.iter(|| KDTree::<f64>::from_text(&text, 3).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

//! Randomized checks of the tree against brute force and against `rstar`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstar::RTree;

use crate::kdtree::{KDTree, KDTreeBuilder, KDTreeIndex, RoundRobinSplit};
use crate::point::{sq_dist, Point};

fn random_points<const D: usize>(rng: &mut StdRng, n: usize) -> Vec<[f64; D]> {
    (0..n)
        .map(|_| std::array::from_fn(|_| rng.gen_range(-100.0..100.0)))
        .collect()
}

/// Coordinates snapped to a coarse grid, so that many points coincide or share a plane.
fn grid_points<const D: usize>(rng: &mut StdRng, n: usize) -> Vec<[f64; D]> {
    (0..n)
        .map(|_| std::array::from_fn(|_| rng.gen_range(0..4) as f64))
        .collect()
}

fn build<const D: usize>(coords: &[[f64; D]], max_leaf_size: usize) -> KDTree<f64> {
    let mut builder =
        KDTreeBuilder::with_capacity(D, coords.len()).with_max_leaf_size(max_leaf_size);
    for c in coords {
        builder.add(c).unwrap();
    }
    builder.finish()
}

fn brute_force_dist<const D: usize>(coords: &[[f64; D]], query: &[f64; D]) -> f64 {
    coords
        .iter()
        .map(|c| sq_dist(c, query).unwrap())
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn exact_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    for n in [1, 2, 7, 100, 1000] {
        for max_leaf_size in [1, 4, 16] {
            let coords = random_points::<3>(&mut rng, n);
            let tree = build(&coords, max_leaf_size);

            for query in random_points::<3>(&mut rng, 50) {
                let neighbor = tree.nearest_neighbor(&query).unwrap();
                assert_eq!(neighbor.dist_squared, brute_force_dist(&coords, &query));
                let index = neighbor.point.index() as usize;
                assert_eq!(neighbor.point.coords(), &coords[index]);
            }
        }
    }
}

#[test]
fn exact_matches_brute_force_with_duplicates() {
    let mut rng = StdRng::seed_from_u64(7);
    let coords = grid_points::<2>(&mut rng, 500);
    let tree = build(&coords, 2);

    assert_eq!(tree.num_items(), 500);
    for leaf in tree.leaves() {
        let points = leaf.points();
        if points.len() > 2 {
            // oversized leaves only hold identical points
            assert!(points.iter().all(|p| p.coords() == points[0].coords()));
        }
    }
    for query in grid_points::<2>(&mut rng, 100) {
        let dist = tree.nearest_neighbor(&query).unwrap().dist_squared;
        assert_eq!(dist, brute_force_dist(&coords, &query));
    }
}

#[test]
fn exact_matches_rstar() {
    let mut rng = StdRng::seed_from_u64(1234);
    let coords = random_points::<2>(&mut rng, 2000);
    let tree = build(&coords, 8);
    let rstar_tree = RTree::bulk_load(coords.clone());

    for query in random_points::<2>(&mut rng, 200) {
        let expected = rstar_tree.nearest_neighbor(&query).unwrap();
        let found = tree.nearest(&query).unwrap();
        assert_eq!(
            sq_dist(found.coords(), &query).unwrap(),
            sq_dist(expected, &query).unwrap()
        );
    }
}

#[test]
fn approximate_is_never_better_than_exact() {
    let mut rng = StdRng::seed_from_u64(99);
    let coords = random_points::<4>(&mut rng, 500);
    let tree = build(&coords, 3);
    let depth = tree.depth();

    for query in random_points::<4>(&mut rng, 200) {
        let exact = tree.nearest_neighbor(&query).unwrap();
        let approx = tree.nearest_neighbor_approx(&query).unwrap();
        assert!(approx.dist_squared >= exact.dist_squared);
        assert!(approx.nodes_visited <= depth + 1);
    }
}

#[test]
fn pruning_skips_subtrees() {
    let mut rng = StdRng::seed_from_u64(5);
    let coords = random_points::<2>(&mut rng, 5000);
    let tree = build(&coords, 4);
    let num_nodes = tree.num_nodes();

    let visited: usize = random_points::<2>(&mut rng, 100)
        .iter()
        .map(|query| tree.nearest_neighbor(query).unwrap().nodes_visited)
        .sum();
    assert!(visited / 100 < num_nodes / 10);
}

#[test]
fn round_trip_answers_identically() {
    let mut rng = StdRng::seed_from_u64(2024);
    let coords = random_points::<3>(&mut rng, 300);
    let tree = build(&coords, 5);

    let mut buf = Vec::new();
    tree.write_to(&mut buf).unwrap();
    let loaded = KDTree::<f64>::read_from(buf.as_slice(), 3).unwrap();

    assert_eq!(loaded, tree);
    for query in random_points::<3>(&mut rng, 100) {
        assert_eq!(loaded.nearest(&query).unwrap(), tree.nearest(&query).unwrap());
        assert_eq!(
            loaded.nearest_approx(&query).unwrap(),
            tree.nearest_approx(&query).unwrap()
        );
    }
}

#[test]
fn round_trip_f32() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut builder = KDTreeBuilder::<f32>::new(2).with_max_leaf_size(2);
    for _ in 0..200 {
        builder
            .add(&[rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)])
            .unwrap();
    }
    let tree = builder.finish();

    let loaded = KDTree::<f32>::from_text(&tree.to_text(), 2).unwrap();
    assert_eq!(loaded, tree);
}

#[test]
fn round_robin_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(11);
    let coords = random_points::<3>(&mut rng, 400);
    let mut builder = KDTreeBuilder::new(3).with_split_policy(RoundRobinSplit::new(3));
    for c in &coords {
        builder.add(c).unwrap();
    }
    let tree = builder.finish();

    for query in random_points::<3>(&mut rng, 50) {
        let dist = tree.nearest_neighbor(&query).unwrap().dist_squared;
        assert_eq!(dist, brute_force_dist(&coords, &query));
    }
}

#[test]
fn within_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(8);
    let coords = random_points::<2>(&mut rng, 1000);
    let tree = build(&coords, 6);

    for query in random_points::<2>(&mut rng, 20) {
        let r = rng.gen_range(1.0..40.0);
        let mut found = tree.within(&query, r).unwrap();
        found.sort_unstable();
        let expected: Vec<u32> = coords
            .iter()
            .enumerate()
            .filter(|(_, c)| sq_dist(*c, &query).unwrap() <= r * r)
            .map(|(i, _)| i as u32)
            .collect();
        assert_eq!(found, expected);
    }
}

#[test]
fn coord_trait_queries() {
    let coords = [[0., 0.], [3., 4.], [-2., 1.]];
    let tree = build(&coords, 1);
    let query = Point::new(vec![2.5, 3.5], 0);
    assert_eq!(tree.nearest_coord(&query).unwrap().index(), 1);
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_batch_queries() {
    let mut rng = StdRng::seed_from_u64(17);
    let coords = random_points::<2>(&mut rng, 500);
    let tree = build(&coords, 4);

    let queries: Vec<Vec<f64>> = random_points::<2>(&mut rng, 64)
        .iter()
        .map(|q| q.to_vec())
        .collect();
    let results = tree.nearest_many(&queries);
    for (query, result) in queries.iter().zip(results) {
        assert_eq!(result.unwrap(), tree.nearest(query).unwrap().index());
    }
}

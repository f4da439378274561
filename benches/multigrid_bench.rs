use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use dual_grid::algs::communicator::LocalComm;
use dual_grid::config::{MeshConfig, MultigridConfig};
use dual_grid::mesh::{
    BoundaryDescription, ElementDescription, Mesh, MarkerDescription, MeshDescription,
};
use dual_grid::multigrid::MultigridHierarchy;
use dual_grid::topology::CellType;

// n x n quads on the unit square with interior points jittered by up to a
// quarter cell, so orientation and dual volumes see non-trivial geometry.
fn jittered_square(n: usize, seed: u64) -> MeshDescription {
    let mut rng = SmallRng::seed_from_u64(seed);
    let h = 1.0 / n as f64;
    let id = |i: usize, j: usize| j * (n + 1) + i;
    let mut coords = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            let mut x = [i as f64 * h, j as f64 * h, 0.0];
            if i > 0 && i < n && j > 0 && j < n {
                x[0] += rng.gen_range(-0.25..0.25) * h;
                x[1] += rng.gen_range(-0.25..0.25) * h;
            }
            coords.push(x);
        }
    }
    let elements = (0..n)
        .flat_map(|j| (0..n).map(move |i| (i, j)))
        .map(|(i, j)| ElementDescription {
            cell_type: CellType::Quadrilateral,
            nodes: vec![id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)],
        })
        .collect();
    let side = |tag: &str, pairs: Vec<(usize, usize)>| MarkerDescription {
        tag: tag.into(),
        send_recv: None,
        elements: pairs
            .into_iter()
            .map(|(a, b)| BoundaryDescription {
                cell_type: CellType::Line,
                nodes: vec![a, b],
                rotation: 0,
            })
            .collect(),
    };
    MeshDescription {
        dim: 2,
        coords,
        elements,
        markers: vec![
            side("lower", (0..n).map(|k| (id(k, 0), id(k + 1, 0))).collect()),
            side("right", (0..n).map(|k| (id(n, k), id(n, k + 1))).collect()),
            side("upper", (0..n).map(|k| (id(k + 1, n), id(k, n))).collect()),
            side("left", (0..n).map(|k| (id(0, k + 1), id(0, k))).collect()),
        ],
        ..Default::default()
    }
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("control-volumes");
    let config = MeshConfig::default();
    for &n in &[32, 64, 128] {
        let desc = jittered_square(n, 42);
        group.bench_with_input(BenchmarkId::new("build", n), &desc, |b, desc| {
            b.iter(|| Mesh::build(desc.clone(), &config).unwrap());
        });
    }
    group.finish();
}

fn bench_multigrid(c: &mut Criterion) {
    let mut group = c.benchmark_group("multigrid");
    let config = MeshConfig {
        multigrid: MultigridConfig {
            n_levels: 4,
            max_dimension: 1.0,
            ..Default::default()
        },
        ..Default::default()
    };
    let comm = LocalComm::serial();
    for &n in &[32, 64, 128] {
        let fine = Mesh::build(jittered_square(n, 7), &config).unwrap();
        group.bench_with_input(BenchmarkId::new("hierarchy", n), &fine, |b, fine| {
            b.iter(|| MultigridHierarchy::build(fine.clone(), &config, &comm).unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_multigrid);
criterion_main!(benches);

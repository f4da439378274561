mod util;

use dual_grid::algs::communicator::LocalComm;
use dual_grid::config::{MeshConfig, MultigridConfig};
use dual_grid::mesh::Mesh;
use dual_grid::multigrid::MultigridHierarchy;
use dual_grid::topology::orientation::{fixed_order, is_inverted};
use dual_grid::topology::CellType;
use proptest::prelude::*;
use util::{grid, total_volume};

fn area2(c: &[[f64; 3]]) -> f64 {
    (c[1][0] - c[0][0]) * (c[2][1] - c[0][1]) - (c[1][1] - c[0][1]) * (c[2][0] - c[0][0])
}

const UNIT_CUBE: [[f64; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

fn jitter() -> impl Strategy<Value = Vec<[f64; 3]>> {
    prop::collection::vec(prop::array::uniform3(-0.1f64..0.1), 8)
}

// Node list of the unit cube seen through a signed axis permutation: local
// node k becomes the cube vertex at the image of UNIT_CUBE[k]. Every one of
// the 48 cube symmetries is reachable, half of them mirror images.
fn cube_symmetry(axes: &[usize], flip: [bool; 3]) -> Vec<usize> {
    UNIT_CUBE
        .iter()
        .map(|x| {
            let image: [f64; 3] =
                [0, 1, 2].map(|i| if flip[i] { 1.0 - x[axes[i]] } else { x[axes[i]] });
            UNIT_CUBE.iter().position(|&v| v == image).unwrap()
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn orientation_is_idempotent(
        pts in prop::collection::vec((-10.0f64..10.0, -10.0f64..10.0), 3)
    ) {
        let coords: Vec<[f64; 3]> = pts.iter().map(|&(x, y)| [x, y, 0.0]).collect();
        prop_assume!(area2(&coords).abs() > 1e-6);
        let gather = |nodes: &[usize]| nodes.iter().map(|&n| coords[n]).collect::<Vec<_>>();

        let once = fixed_order(CellType::Triangle, &[0, 1, 2], &gather(&[0, 1, 2]));
        let twice = fixed_order(CellType::Triangle, &once, &gather(&once));
        prop_assert_eq!(&once, &twice);
        prop_assert!(area2(&gather(&once)) > 0.0);
    }

    #[test]
    fn tetrahedron_orientation_is_idempotent(
        order in Just(vec![0usize, 1, 2, 3]).prop_shuffle(),
        shift in jitter(),
    ) {
        let coords: Vec<[f64; 3]> = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]]
            .iter()
            .zip(&shift)
            .map(|(x, d)| [x[0] + d[0], x[1] + d[1], x[2] + d[2]])
            .collect();
        let gather = |nodes: &[usize]| nodes.iter().map(|&n| coords[n]).collect::<Vec<_>>();

        let once = fixed_order(CellType::Tetrahedron, &order, &gather(&order));
        let twice = fixed_order(CellType::Tetrahedron, &once, &gather(&once));
        prop_assert_eq!(&once, &twice);
        prop_assert!(!is_inverted(CellType::Tetrahedron, &gather(&once)));
        let mut sorted = once.clone();
        sorted.sort_unstable();
        prop_assert_eq!(sorted, vec![0, 1, 2, 3]);
    }

    #[test]
    fn hexahedron_orientation_is_idempotent(
        axes in Just(vec![0usize, 1, 2]).prop_shuffle(),
        flip in prop::array::uniform3(any::<bool>()),
        shift in jitter(),
    ) {
        let coords: Vec<[f64; 3]> = UNIT_CUBE
            .iter()
            .zip(&shift)
            .map(|(x, d)| [x[0] + d[0], x[1] + d[1], x[2] + d[2]])
            .collect();
        let gather = |nodes: &[usize]| nodes.iter().map(|&n| coords[n]).collect::<Vec<_>>();
        let order = cube_symmetry(&axes, flip);

        let once = fixed_order(CellType::Hexahedron, &order, &gather(&order));
        let twice = fixed_order(CellType::Hexahedron, &once, &gather(&once));
        prop_assert_eq!(&once, &twice);
        prop_assert!(!is_inverted(CellType::Hexahedron, &gather(&once)));
    }

    #[test]
    fn find_edge_is_symmetric(nx in 1usize..6, ny in 1usize..6) {
        let m = Mesh::build(grid(nx, ny, 1.0), &MeshConfig::default()).unwrap();
        // Horizontal, vertical and no diagonal edges.
        prop_assert_eq!(m.edges.len(), nx * (ny + 1) + ny * (nx + 1));
        for (k, e) in m.edges.iter().enumerate() {
            let [a, b] = e.nodes;
            prop_assert!(a < b);
            prop_assert_eq!(m.find_edge(a, b).unwrap(), k);
            prop_assert_eq!(m.find_edge(b, a).unwrap(), k);
        }
        prop_assert!(m.find_edge(0, m.n_point() - 1).is_err());
    }

    #[test]
    fn coarsening_partitions_the_fine_points(n in 3usize..9, levels in 1usize..4) {
        let config = MeshConfig {
            multigrid: MultigridConfig {
                n_levels: levels,
                max_dimension: 1.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let fine = Mesh::build(grid(n, n, 1.0), &config).unwrap();
        let h = MultigridHierarchy::build(fine, &config, &LocalComm::serial()).unwrap();
        for w in h.levels.windows(2) {
            let (f, c) = (&w[0], &w[1]);
            prop_assert!(c.n_point() <= f.n_point());
            let mut seen = vec![0usize; f.n_point()];
            for (ci, p) in c.points.iter().enumerate() {
                for &child in &p.children {
                    seen[child] += 1;
                    prop_assert_eq!(f.points[child].parent, Some(ci));
                }
            }
            prop_assert!(seen.iter().all(|&s| s == 1));
            prop_assert!((total_volume(c) - total_volume(f)).abs() < 1e-12);
        }
    }
}

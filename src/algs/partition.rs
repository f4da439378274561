//! Point coloring: one owning domain per point.
//!
//! The graph work is delegated to a [`Partitioner`]
//! ([`MetisPartitioner`](super::metis_partition::MetisPartitioner) with
//! `metis-support`, the built-in [`GreedyPartitioner`] otherwise).
//! Afterwards points around periodic markers are pulled into the majority
//! color of their 2-hop neighbourhood so periodic partners tend to share a
//! domain.

use super::connectivity::{point_graph, simplex_connectivity, SimplexConnectivity};
use crate::config::MeshConfig;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::BoundaryKind;
use std::collections::VecDeque;

/// Anything that maps simplex connectivity to one part per point.
pub trait Partitioner {
    fn partition(&self, conn: &SimplexConnectivity, n_parts: usize) -> Result<Vec<usize>, MeshError>;
}

/// Breadth-first graph growing: parts of `ceil(n / n_parts)` points are
/// grown one after the other from the lowest unassigned point.
#[derive(Debug, Default, Clone)]
pub struct GreedyPartitioner;

impl Partitioner for GreedyPartitioner {
    fn partition(&self, conn: &SimplexConnectivity, n_parts: usize) -> Result<Vec<usize>, MeshError> {
        if n_parts == 0 {
            return Err(MeshError::Partition("zero parts requested".into()));
        }
        let n = conn.n_point;
        let graph = point_graph(conn);
        let target = n.div_ceil(n_parts).max(1);
        let mut part = vec![usize::MAX; n];
        let mut current = 0usize;
        let mut filled = 0usize;
        let mut queue = VecDeque::new();
        let mut next_seed = 0usize;
        loop {
            let p = match queue.pop_front() {
                Some(p) => p,
                None => {
                    while next_seed < n && part[next_seed] != usize::MAX {
                        next_seed += 1;
                    }
                    if next_seed == n {
                        break;
                    }
                    next_seed
                }
            };
            if part[p] != usize::MAX {
                continue;
            }
            part[p] = current;
            filled += 1;
            if filled == target && current + 1 < n_parts {
                current += 1;
                filled = 0;
                queue.clear();
                continue;
            }
            for &q in graph.neighbors(p) {
                if part[q] == usize::MAX {
                    queue.push_back(q);
                }
            }
        }
        Ok(part)
    }
}

/// Color every point of `mesh` into `n_domains` domains and store the color
/// on the points.
pub fn color_points<P: Partitioner + ?Sized>(
    mesh: &mut Mesh,
    n_domains: usize,
    partitioner: &P,
    config: &MeshConfig,
) -> Result<Vec<usize>, MeshError> {
    let mut colors = if n_domains <= 1 {
        vec![0; mesh.n_point()]
    } else {
        let conn = simplex_connectivity(mesh);
        let colors = partitioner.partition(&conn, n_domains)?;
        if colors.len() != mesh.n_point() {
            return Err(MeshError::Partition(format!(
                "partitioner returned {} colors for {} points",
                colors.len(),
                mesh.n_point()
            )));
        }
        if let Some(&bad) = colors.iter().find(|&&c| c >= n_domains) {
            return Err(MeshError::Partition(format!("color {bad} out of range")));
        }
        colors
    };
    if n_domains > 1 {
        periodic_majority(mesh, config, n_domains, &mut colors);
    }
    for (p, &c) in mesh.points.iter_mut().zip(&colors) {
        p.color = c;
    }
    let mut sizes = vec![0usize; n_domains.max(1)];
    for &c in &colors {
        sizes[c] += 1;
    }
    log::info!("colored {} points into {n_domains} domains: {sizes:?}", colors.len());
    Ok(colors)
}

/// Give every point within two hops of a periodic vertex the majority color
/// of that neighbourhood (ties go to the lowest color).
fn periodic_majority(mesh: &Mesh, config: &MeshConfig, n_domains: usize, colors: &mut [usize]) {
    for (im, m) in mesh.markers.iter().enumerate() {
        let periodic =
            m.kind == BoundaryKind::Periodic || config.marker_kind(&m.tag) == BoundaryKind::Periodic;
        if !periodic || m.is_send_receive() {
            continue;
        }
        for v in &mesh.markers[im].vertices {
            let mut hood = vec![v.point];
            for &q in &mesh.points[v.point].points {
                hood.push(q);
                hood.extend(mesh.points[q].points.iter().copied());
            }
            hood.sort_unstable();
            hood.dedup();
            let mut votes = vec![0usize; n_domains];
            for &q in &hood {
                votes[colors[q]] += 1;
            }
            let winner = votes
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
                .map_or(0, |(c, _)| c);
            for &q in &hood {
                colors[q] = winner;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::connectivity::simplex_connectivity;
    use crate::mesh::{ElementDescription, MeshDescription};
    use crate::topology::CellType;

    /// `nx` x 1 strip of unit quads.
    fn strip(nx: usize) -> Mesh {
        let mut coords = Vec::new();
        for j in 0..2 {
            for i in 0..=nx {
                coords.push([i as f64, j as f64, 0.0]);
            }
        }
        let elements = (0..nx)
            .map(|i| ElementDescription {
                cell_type: CellType::Quadrilateral,
                nodes: vec![i, i + 1, nx + 2 + i, nx + 1 + i],
            })
            .collect();
        let desc = MeshDescription {
            dim: 2,
            coords,
            elements,
            ..Default::default()
        };
        Mesh::build(desc, &MeshConfig::default()).unwrap()
    }

    #[test]
    fn greedy_parts_are_balanced_and_connected() {
        let m = strip(7);
        let part = GreedyPartitioner.partition(&simplex_connectivity(&m), 2).unwrap();
        assert_eq!(part.len(), 16);
        assert_eq!(part.iter().filter(|&&c| c == 0).count(), 8);
        assert_eq!(part.iter().filter(|&&c| c == 1).count(), 8);
        // Grown from point 0: the left end is part 0, the right end part 1.
        assert_eq!(part[0], 0);
        assert_eq!(part[7], 1);
        assert_eq!(part[15], 1);
    }

    #[test]
    fn single_domain_is_all_zero() {
        let mut m = strip(3);
        let colors = color_points(&mut m, 1, &GreedyPartitioner, &MeshConfig::default()).unwrap();
        assert!(colors.iter().all(|&c| c == 0));
    }

    struct Fixed(Vec<usize>);
    impl Partitioner for Fixed {
        fn partition(&self, _: &SimplexConnectivity, _: usize) -> Result<Vec<usize>, MeshError> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn bad_partitioner_output_is_rejected() {
        let mut m = strip(1);
        let err = color_points(&mut m, 2, &Fixed(vec![0, 1]), &MeshConfig::default());
        assert!(matches!(err, Err(MeshError::Partition(_))));
        let err = color_points(&mut m, 2, &Fixed(vec![0, 1, 5, 0]), &MeshConfig::default());
        assert!(matches!(err, Err(MeshError::Partition(_))));
    }
}

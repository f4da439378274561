//! Global geometric queries: wall distance, projected monitored area and
//! normal-direction neighbours.
//!
//! The distributed queries are collectives: every rank calls them in the
//! same order, with or without walls of its own.

use super::{distance, dot, norm, sub};
use crate::algs::collective::{all_gather, all_reduce_sum};
use crate::algs::communicator::Communicator;
use crate::algs::wire::{decode, encode, WireLocatedPoint};
use crate::config::MeshConfig;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Wall distance of a mesh without walls.
pub const NO_WALL_DISTANCE: f64 = f64::MAX;

impl Mesh {
    fn is_wall_marker(&self, config: &MeshConfig, im: usize) -> bool {
        let m = &self.markers[im];
        !m.is_send_receive() && (m.kind.is_wall() || config.marker_kind(&m.tag).is_wall())
    }

    /// Coordinates of every wall vertex on every rank.
    fn gather_wall_coords<C: Communicator + ?Sized>(
        &self,
        config: &MeshConfig,
        comm: &C,
    ) -> Result<Vec<[f64; 3]>, MeshError> {
        let local: Vec<WireLocatedPoint> = (0..self.markers.len())
            .filter(|&im| self.is_wall_marker(config, im))
            .flat_map(|im| self.markers[im].vertices.iter())
            .filter(|v| self.points[v.point].domain)
            .map(|v| WireLocatedPoint::new(v.point, 0, self.points[v.point].coord))
            .collect();
        let mut out = Vec::new();
        for buf in all_gather(comm, &encode(&local))? {
            let recs: Vec<WireLocatedPoint> = decode(&buf)?;
            out.extend(recs.iter().map(WireLocatedPoint::coord));
        }
        Ok(out)
    }

    /// Distance from every point to the closest wall point (Euler or
    /// no-slip markers) over all ranks, by brute force.
    pub fn set_wall_distance<C: Communicator + ?Sized>(
        &mut self,
        config: &MeshConfig,
        comm: &C,
    ) -> Result<(), MeshError> {
        let walls = self.gather_wall_coords(config, comm)?;
        log::debug!("wall distance against {} wall points", walls.len());
        let nearest = |x: [f64; 3]| {
            walls
                .iter()
                .map(|&w| distance(x, w))
                .fold(NO_WALL_DISTANCE, f64::min)
        };
        #[cfg(feature = "rayon")]
        self.points
            .par_iter_mut()
            .for_each(|p| p.wall_distance = nearest(p.coord));
        #[cfg(not(feature = "rayon"))]
        for p in &mut self.points {
            p.wall_distance = nearest(p.coord);
        }
        Ok(())
    }

    /// Sum over monitored markers of the negative part of the last normal
    /// component, reduced over ranks.
    pub fn positive_z_area<C: Communicator + ?Sized>(
        &self,
        config: &MeshConfig,
        comm: &C,
    ) -> Result<f64, MeshError> {
        let last = self.dim - 1;
        let mut area = 0.0;
        for m in &self.markers {
            if m.is_send_receive() || !config.is_monitored(&m.tag) {
                continue;
            }
            for v in &m.vertices {
                let nz = v.normal[last];
                if self.points[v.point].domain && nz < 0.0 {
                    area -= nz;
                }
            }
        }
        all_reduce_sum(comm, area)
    }

    /// For every physical boundary vertex, the neighbour whose direction is
    /// closest to the inward normal.
    pub fn find_normal_neighbor(&mut self) {
        for m in &mut self.markers {
            if m.is_send_receive() {
                continue;
            }
            for v in &mut m.vertices {
                let inward = v.normal.map(|x| -x);
                let n_len = norm(inward);
                let x = self.points[v.point].coord;
                let mut best = None;
                let mut best_cos = f64::NEG_INFINITY;
                for &q in &self.points[v.point].points {
                    let d = sub(self.points[q].coord, x);
                    let len = norm(d) * n_len;
                    if len == 0.0 {
                        continue;
                    }
                    let cos = dot(d, inward) / len;
                    if cos > best_cos {
                        best_cos = cos;
                        best = Some(q);
                    }
                }
                v.normal_neighbor = best;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::algs::communicator::LocalComm;
    use crate::config::MeshConfig;
    use crate::mesh::tests::two_quads;
    use crate::mesh::Mesh;
    use crate::topology::BoundaryKind;

    #[test]
    fn distance_to_the_lower_wall() {
        let cfg = MeshConfig::default().with_marker("lower", BoundaryKind::NoSlipWall);
        let mut m = Mesh::build(two_quads(), &cfg).unwrap();
        m.set_wall_distance(&cfg, &LocalComm::serial()).unwrap();
        assert_eq!(m.points[0].wall_distance, 0.0);
        assert_eq!(m.points[4].wall_distance, 1.0);
        assert_eq!(m.points[3].wall_distance, 1.0);
    }

    #[test]
    fn no_walls_leaves_the_sentinel() {
        let cfg = MeshConfig::default();
        let mut m = Mesh::build(two_quads(), &cfg).unwrap();
        m.set_wall_distance(&cfg, &LocalComm::serial()).unwrap();
        assert!(m.points.iter().all(|p| p.wall_distance == super::NO_WALL_DISTANCE));
    }

    #[test]
    fn monitored_area_counts_downward_normals() {
        let cfg = MeshConfig::default()
            .with_marker("lower", BoundaryKind::EulerWall)
            .with_monitoring("lower")
            .with_monitoring("upper");
        let m = Mesh::build(two_quads(), &cfg).unwrap();
        let area = m.positive_z_area(&cfg, &LocalComm::serial()).unwrap();
        // Lower side faces -y (counted), upper side faces +y (ignored).
        assert!((area - 1.0).abs() < 1e-14);
    }

    #[test]
    fn normal_neighbour_points_inward() {
        let mut m = Mesh::build(two_quads(), &MeshConfig::default()).unwrap();
        m.find_normal_neighbor();
        let lower = m.marker_index("lower").unwrap();
        let v = &m.markers[lower].vertices[1];
        assert_eq!(v.point, 1);
        assert_eq!(v.normal_neighbor, Some(4));
    }
}

//! Partner search for near-field and interface markers.
//!
//! Every vertex of a marker of the given kind is matched to the closest
//! vertex of the same kind anywhere in the partitioned mesh, itself
//! excluded. Candidates are all-gathered, so this is a collective. A best
//! match farther than the tolerance is reported and kept.

use super::distance;
use crate::algs::collective::all_gather;
use crate::algs::communicator::Communicator;
use crate::algs::wire::{decode, encode, WireLocatedPoint};
use crate::config::MeshConfig;
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::{BoundaryKind, DonorPoint};

impl Mesh {
    pub fn match_near_field<C: Communicator + ?Sized>(
        &mut self,
        config: &MeshConfig,
        comm: &C,
    ) -> Result<(), MeshError> {
        self.match_kind(BoundaryKind::NearField, config.tolerances.near_field, config, comm)
    }

    pub fn match_interface<C: Communicator + ?Sized>(
        &mut self,
        config: &MeshConfig,
        comm: &C,
    ) -> Result<(), MeshError> {
        self.match_kind(BoundaryKind::Interface, config.tolerances.interface, config, comm)
    }

    fn marker_has_kind(&self, config: &MeshConfig, im: usize, kind: BoundaryKind) -> bool {
        let m = &self.markers[im];
        m.kind == kind || config.marker_kind(&m.tag) == kind
    }

    fn match_kind<C: Communicator + ?Sized>(
        &mut self,
        kind: BoundaryKind,
        eps: f64,
        config: &MeshConfig,
        comm: &C,
    ) -> Result<(), MeshError> {
        let markers: Vec<usize> = (0..self.markers.len())
            .filter(|&im| self.marker_has_kind(config, im, kind))
            .collect();
        let local: Vec<WireLocatedPoint> = markers
            .iter()
            .flat_map(|&im| self.markers[im].vertices.iter())
            .filter(|v| self.points[v.point].domain)
            .map(|v| WireLocatedPoint::new(v.point, 0, self.points[v.point].coord))
            .collect();

        let mut candidates: Vec<(usize, usize, [f64; 3])> = Vec::new();
        for (rank, buf) in all_gather(comm, &encode(&local))?.into_iter().enumerate() {
            let recs: Vec<WireLocatedPoint> = decode(&buf)?;
            candidates.extend(recs.iter().map(|r| (rank, r.point(), r.coord())));
        }
        candidates.sort_by_key(|&(rank, point, _)| (rank, point));
        candidates.dedup_by_key(|&mut (rank, point, _)| (rank, point));

        let me = comm.rank();
        let mut worst = 0.0f64;
        for &im in &markers {
            for iv in 0..self.markers[im].vertices.len() {
                let p = self.markers[im].vertices[iv].point;
                let x = self.points[p].coord;
                let best = candidates
                    .iter()
                    .filter(|&&(rank, point, _)| !(rank == me && point == p))
                    .map(|&(rank, point, c)| (distance(x, c), rank, point))
                    .min_by(|a, b| a.0.total_cmp(&b.0));
                let v = &mut self.markers[im].vertices[iv];
                match best {
                    Some((d, domain, point)) => {
                        if d > eps {
                            log::warn!(
                                "{kind:?} point {p}: closest partner {point}@{domain} at distance {d:e} (tolerance {eps:e})"
                            );
                        }
                        worst = worst.max(d);
                        v.donor = Some(DonorPoint { point, domain });
                    }
                    None => {
                        log::warn!("{kind:?} point {p}: no partner vertex found");
                        v.donor = None;
                    }
                }
            }
        }
        if !markers.is_empty() {
            log::debug!("{kind:?} matching: worst distance {worst:e}");
        }
        Ok(())
    }
}

//! Agglomeration multigrid.
//!
//! Each coarse level is built from the level above it in three steps:
//! greedy agglomeration ([`agglomeration`]), halo reconciliation so ghost
//! agglomerates mirror their donors ([`halo`]), and geometry restriction
//! ([`restriction`]). Coarse levels carry points, edges and marker vertices
//! only; they have no elements.

pub mod agglomeration;
mod halo;
mod restriction;

pub use agglomeration::{suitable_neighbors, Agglomeration};

use crate::algs::collective::{all_reduce_count, all_reduce_max};
use crate::algs::communicator::Communicator;
use crate::config::{MeshConfig, MultigridConfig};
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use agglomeration::Agglomerator;

/// Agglomerate `fine` into the next coarser level. Collective.
///
/// On return every fine point records its coarse parent.
pub fn coarsen<C: Communicator + ?Sized>(
    fine: &mut Mesh,
    config: &MultigridConfig,
    comm: &C,
) -> Result<Mesh, MeshError> {
    let domain_volume = fine.domain_volume(comm)?;
    let mut agg = Agglomerator::new(fine, config, domain_volume).run();
    halo::reconcile(fine, &mut agg, comm)?;
    restriction::restrict(fine, &agg)
}

/// The finest mesh and every coarse level built from it.
#[derive(Clone, Debug)]
pub struct MultigridHierarchy {
    pub levels: Vec<Mesh>,
}

impl MultigridHierarchy {
    /// Coarsen up to `config.multigrid.n_levels` times. Collective.
    ///
    /// Stops early, without error, when a level would not reduce the global
    /// point count or when no partition has more than one owned point left.
    pub fn build<C: Communicator + ?Sized>(
        fine: Mesh,
        config: &MeshConfig,
        comm: &C,
    ) -> Result<Self, MeshError> {
        config.validate()?;
        let mut levels = vec![fine];
        for level in 1..=config.multigrid.n_levels {
            let Some(finer) = levels.last_mut() else {
                break;
            };
            let coarse = coarsen(finer, &config.multigrid, comm)?;
            let n_fine = all_reduce_count(comm, finer.n_point_domain)?;
            let n_coarse = all_reduce_count(comm, coarse.n_point_domain)?;
            if n_coarse >= n_fine {
                for p in &mut finer.points {
                    p.parent = None;
                    p.agglomerated = false;
                }
                log::info!("multigrid: level {level} does not coarsen ({n_coarse} points), stopping");
                break;
            }
            let largest = all_reduce_max(comm, coarse.n_point_domain as f64)?;
            log::info!(
                "multigrid: level {level} has {n_coarse} points ({:.2} reduction)",
                n_fine as f64 / n_coarse as f64
            );
            levels.push(coarse);
            if largest <= 1.0 {
                log::info!("multigrid: one point per partition reached at level {level}");
                break;
            }
        }
        Ok(MultigridHierarchy { levels })
    }

    pub fn n_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn finest(&self) -> &Mesh {
        &self.levels[0]
    }

    pub fn coarsest(&self) -> &Mesh {
        &self.levels[self.levels.len() - 1]
    }
}

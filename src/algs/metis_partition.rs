//! METIS nodal partitioning (feature `metis-support`).

use super::connectivity::SimplexConnectivity;
use super::partition::Partitioner;
use crate::mesh_error::MeshError;
use metis::Idx;

/// Calls `METIS_PartMeshNodal` on the simplex connectivity.
#[derive(Debug, Default, Clone)]
pub struct MetisPartitioner;

impl Partitioner for MetisPartitioner {
    fn partition(&self, conn: &SimplexConnectivity, n_parts: usize) -> Result<Vec<usize>, MeshError> {
        let to_idx = |v: usize| {
            Idx::try_from(v).map_err(|_| MeshError::Partition(format!("{v} overflows METIS idx_t")))
        };
        let mut eptr = conn.eptr.iter().map(|&v| to_idx(v)).collect::<Result<Vec<_>, _>>()?;
        let mut eind = conn.eind.iter().map(|&v| to_idx(v)).collect::<Result<Vec<_>, _>>()?;
        let mut epart = vec![0 as Idx; conn.n_simplex()];
        let mut npart = vec![0 as Idx; conn.n_point];

        metis::Mesh::new(to_idx(n_parts)?, &mut eptr, &mut eind)
            .map_err(|e| MeshError::Partition(format!("{e:?}")))?
            .part_nodal(&mut epart, &mut npart)
            .map_err(|e| MeshError::Partition(format!("{e:?}")))?;

        Ok(npart.into_iter().map(|p| p as usize).collect())
    }
}

#![cfg_attr(docsrs, feature(doc_cfg))]
//! # dual-grid
//!
//! dual-grid is the unstructured mesh engine of a vertex-centred
//! finite-volume solver. It ingests 2-D and 3-D meshes of mixed cell types,
//! builds the median-dual control volumes the solver integrates over, splits
//! a mesh into partitions connected through send/receive halo markers, and
//! coarsens it into an agglomeration multigrid hierarchy.
//!
//! ## Features
//! - Arena mesh ([`mesh::Mesh`]) with index cross references: points,
//!   elements, edges, boundary markers and their vertices
//! - Median-dual geometry: edge normals, point volumes, boundary vertex
//!   normals, wall distance, near-field and interface matching
//! - Periodic boundary replication through image points and halo markers
//! - Partitioning (greedy built-in, METIS behind `metis-support`), send and
//!   receive lists, per-partition extraction
//! - Agglomeration multigrid with halo-consistent coarse levels
//! - Native keyword format reader/writer, tagged-block and structured-grid
//!   adapters, VTK, block plot and STL export
//! - Pluggable transport (in-process [`algs::communicator::LocalComm`], MPI
//!   behind `mpi-support`) behind one [`algs::communicator::Communicator`]
//!   trait
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! dual-grid = "0.4"
//! # features = ["mpi-support", "rayon", "metis-support"]
//! ```
//!
//! A typical single-process pipeline:
//!
//! ```no_run
//! use dual_grid::prelude::*;
//! use std::fs::File;
//!
//! # fn main() -> Result<(), MeshError> {
//! let config = MeshConfig::default().with_marker("wall", BoundaryKind::NoSlipWall);
//! let desc = NativeReader.read(File::open("grid.su2")?)?;
//! let mut mesh = Mesh::build(desc, &config)?;
//! let comm = LocalComm::serial();
//! mesh.set_wall_distance(&config, &comm)?;
//! let hierarchy = MultigridHierarchy::build(mesh, &config, &comm)?;
//! println!("{} levels", hierarchy.n_levels());
//! # Ok(())
//! # }
//! ```
//!
//! ## Determinism
//!
//! Every pass iterates points, markers and partners in index order and keeps
//! its maps ordered, so the same input and domain count give the same mesh,
//! send lists and agglomeration on every run.

pub mod algs;
pub mod config;
pub mod geometry;
pub mod io;
pub mod mesh;
pub mod mesh_error;
pub mod multigrid;
pub mod topology;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::algs::communicator::{Communicator, LocalComm};
    #[cfg(feature = "mpi-support")]
    pub use crate::algs::communicator::MpiComm;
    pub use crate::algs::{
        color_points, DomainGeometry, GreedyPartitioner, Partitioner, PeriodicGeometry, SendReceive,
    };
    pub use crate::config::{MarkerConfig, MatchTolerances, MeshConfig, MultigridConfig, PeriodicPair};
    pub use crate::io::native::{NativeReader, NativeWriter};
    pub use crate::io::{MeshReader, MeshWriter};
    pub use crate::mesh::{Mesh, MeshDescription};
    pub use crate::mesh_error::MeshError;
    pub use crate::multigrid::MultigridHierarchy;
    pub use crate::topology::{BoundaryKind, CellType, Marker, PeriodicTransform, Point};
}

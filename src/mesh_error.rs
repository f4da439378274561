//! MeshError: unified error type for dual-grid public APIs
//!
//! Every fatal condition of mesh ingestion, topology construction,
//! partitioning and transport is reported through this enum. Callers
//! propagate it with `?`; a driver binary aborts the run on any of them.
//! Geometric-tolerance problems are not errors and go to `log::warn!`.

use thiserror::Error;

/// Unified error type for dual-grid operations.
#[derive(Debug, Error)]
pub enum MeshError {
    /// Underlying reader/writer failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A mesh file could not be parsed.
    #[error("Mesh parse error: {0}")]
    Parse(String),
    /// A cell-type tag outside the supported set.
    #[error("Unsupported cell type tag {0}")]
    UnsupportedCellType(i64),
    /// The mesh dimension must be 2 or 3.
    #[error("Invalid mesh dimension {0} (expected 2 or 3)")]
    InvalidDimension(usize),
    /// A declared count does not match the data that follows it.
    #[error("Count mismatch in {section}: declared {declared}, found {found}")]
    CountMismatch {
        section: &'static str,
        declared: usize,
        found: usize,
    },
    /// An element references a point index that does not exist.
    #[error("Node index {node} out of range ({n_point} points)")]
    NodeOutOfRange { node: usize, n_point: usize },
    /// Edge lookup on a pair of points with no common edge.
    #[error("No edge between points {0} and {1}")]
    MissingEdge(usize, usize),
    /// A boundary element whose nodes are not contained in any volume element.
    #[error("Boundary element {elem} of marker `{marker}` has no domain element")]
    MissingDomainElement { marker: String, elem: usize },
    /// Operation needs the boundary-to-domain element map first.
    #[error("Domain elements are not set for marker `{0}`")]
    NoAdjacentDomainElement(String),
    /// A configured marker tag is not present in the mesh.
    #[error("Unknown marker `{0}`")]
    UnknownMarker(String),
    /// Graph partitioner failure.
    #[error("Partitioner error: {0}")]
    Partition(String),
    /// Message-passing failure (short or malformed buffer, missing peer).
    #[error("Transport error: {0}")]
    Transport(String),
    /// Feature that is not available in this build or run mode.
    #[error("Unsupported: {0}")]
    Unsupported(String),
    /// Inconsistent configuration values.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// A mesh invariant does not hold.
    #[error("Invariant violated: {0}")]
    Invariant(String),
}

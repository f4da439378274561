//! Volumetric and boundary elements.

use super::cell_type::CellType;
use crate::mesh_error::MeshError;
use serde::{Deserialize, Serialize};

/// A volumetric cell (triangle/quad in 2-D, tetra/hexa/wedge/pyramid in 3-D).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub cell_type: CellType,
    pub nodes: Vec<usize>,
    /// Element across each face, `None` on the boundary.
    pub neighbors: Vec<Option<usize>>,
    pub cg: [f64; 3],
    pub global_index: usize,
}

impl Element {
    /// Build an element after checking the node arity of its cell type.
    pub fn new(cell_type: CellType, nodes: Vec<usize>) -> Result<Self, MeshError> {
        check_arity(cell_type, &nodes)?;
        Ok(Self {
            cell_type,
            neighbors: vec![None; cell_type.n_faces()],
            nodes,
            cg: [0.0; 3],
            global_index: 0,
        })
    }

    /// Global node indices of face `face`, in outward winding order.
    pub fn face_nodes(&self, face: usize) -> impl Iterator<Item = usize> + '_ {
        self.cell_type.faces()[face].iter().map(|&l| self.nodes[l])
    }

    /// Position of global point `point` within `nodes`.
    pub fn local_index(&self, point: usize) -> Option<usize> {
        self.nodes.iter().position(|&n| n == point)
    }
}

/// A lower-dimensional cell on a marker (line in 2-D, triangle/quad in 3-D,
/// or a `Vertex` placeholder on a send/receive marker).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryElement {
    pub cell_type: CellType,
    pub nodes: Vec<usize>,
    /// Volumetric element that contains every node of this element.
    pub domain_element: Option<usize>,
    /// Periodic transform index carried by send/receive entries (0 = none).
    pub rotation: usize,
    pub cg: [f64; 3],
}

impl BoundaryElement {
    pub fn new(cell_type: CellType, nodes: Vec<usize>) -> Result<Self, MeshError> {
        check_arity(cell_type, &nodes)?;
        Ok(Self {
            cell_type,
            nodes,
            domain_element: None,
            rotation: 0,
            cg: [0.0; 3],
        })
    }

    /// Send/receive placeholder for one halo point.
    pub fn halo(node: usize, rotation: usize) -> Self {
        Self {
            cell_type: CellType::Vertex,
            nodes: vec![node],
            domain_element: None,
            rotation,
            cg: [0.0; 3],
        }
    }
}

fn check_arity(cell_type: CellType, nodes: &[usize]) -> Result<(), MeshError> {
    if nodes.len() != cell_type.n_nodes() {
        return Err(MeshError::Parse(format!(
            "{cell_type:?} needs {} nodes, got {}",
            cell_type.n_nodes(),
            nodes.len()
        )));
    }
    Ok(())
}

//! Cell type tags and their fixed local topology.
//!
//! Every element carries one [`CellType`]. All topology questions (node
//! count, faces, nodes of a face, graph neighbours of a local node) are
//! answered from static tables, so an element is just a tag plus its node
//! list.
//!
//! Local node numbering follows the legacy VTK convention. Face tables are
//! written so that, for a positively oriented cell, the right-hand normal of
//! every face points out of the cell (in 2-D every face is an edge and the
//! cell lies to its left).

use crate::mesh_error::MeshError;
use serde::{Deserialize, Serialize};

/// Closed set of supported cell shapes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum CellType {
    /// Halo placeholder used by send/receive markers.
    Vertex,
    Line,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
    Wedge,
    Pyramid,
}

const VERTEX_FACES: &[&[usize]] = &[];
const LINE_FACES: &[&[usize]] = &[&[0], &[1]];
const TRIANGLE_FACES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 0]];
const QUAD_FACES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const TETRA_FACES: &[&[usize]] = &[&[0, 2, 1], &[0, 1, 3], &[1, 2, 3], &[0, 3, 2]];
const HEXA_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];
const WEDGE_FACES: &[&[usize]] = &[
    &[0, 2, 1],
    &[3, 4, 5],
    &[0, 1, 4, 3],
    &[1, 2, 5, 4],
    &[2, 0, 3, 5],
];
const PYRAMID_FACES: &[&[usize]] = &[
    &[0, 3, 2, 1],
    &[0, 1, 4],
    &[1, 2, 4],
    &[2, 3, 4],
    &[3, 0, 4],
];

const VERTEX_NEIGHBORS: &[&[usize]] = &[&[]];
const LINE_NEIGHBORS: &[&[usize]] = &[&[1], &[0]];
const TRIANGLE_NEIGHBORS: &[&[usize]] = &[&[1, 2], &[2, 0], &[0, 1]];
const QUAD_NEIGHBORS: &[&[usize]] = &[&[1, 3], &[2, 0], &[3, 1], &[0, 2]];
const TETRA_NEIGHBORS: &[&[usize]] = &[&[1, 2, 3], &[0, 2, 3], &[0, 1, 3], &[0, 1, 2]];
const HEXA_NEIGHBORS: &[&[usize]] = &[
    &[1, 3, 4],
    &[0, 2, 5],
    &[1, 3, 6],
    &[0, 2, 7],
    &[0, 5, 7],
    &[4, 6, 1],
    &[2, 5, 7],
    &[4, 3, 6],
];
const WEDGE_NEIGHBORS: &[&[usize]] = &[
    &[1, 2, 3],
    &[0, 2, 4],
    &[1, 0, 5],
    &[0, 4, 5],
    &[3, 5, 1],
    &[4, 3, 2],
];
const PYRAMID_NEIGHBORS: &[&[usize]] = &[
    &[1, 3, 4],
    &[0, 2, 4],
    &[1, 3, 4],
    &[2, 0, 4],
    &[0, 1, 2, 3],
];

impl CellType {
    /// All cell types, in tag order.
    pub const ALL: [CellType; 8] = [
        CellType::Vertex,
        CellType::Line,
        CellType::Triangle,
        CellType::Quadrilateral,
        CellType::Tetrahedron,
        CellType::Hexahedron,
        CellType::Wedge,
        CellType::Pyramid,
    ];

    /// Numeric tag used by the native format (legacy VTK cell codes).
    pub const fn vtk_tag(self) -> i64 {
        match self {
            CellType::Vertex => 1,
            CellType::Line => 3,
            CellType::Triangle => 5,
            CellType::Quadrilateral => 9,
            CellType::Tetrahedron => 10,
            CellType::Hexahedron => 12,
            CellType::Wedge => 13,
            CellType::Pyramid => 14,
        }
    }

    /// Inverse of [`CellType::vtk_tag`].
    pub fn from_vtk_tag(tag: i64) -> Result<Self, MeshError> {
        match tag {
            1 => Ok(CellType::Vertex),
            3 => Ok(CellType::Line),
            5 => Ok(CellType::Triangle),
            9 => Ok(CellType::Quadrilateral),
            10 => Ok(CellType::Tetrahedron),
            12 => Ok(CellType::Hexahedron),
            13 => Ok(CellType::Wedge),
            14 => Ok(CellType::Pyramid),
            other => Err(MeshError::UnsupportedCellType(other)),
        }
    }

    /// Topological dimension of the cell.
    pub const fn dimension(self) -> usize {
        match self {
            CellType::Vertex => 0,
            CellType::Line => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Hexahedron | CellType::Wedge | CellType::Pyramid => 3,
        }
    }

    pub const fn n_nodes(self) -> usize {
        match self {
            CellType::Vertex => 1,
            CellType::Line => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral => 4,
            CellType::Tetrahedron => 4,
            CellType::Hexahedron => 8,
            CellType::Wedge => 6,
            CellType::Pyramid => 5,
        }
    }

    /// Local node lists of the faces, outward-wound.
    pub const fn faces(self) -> &'static [&'static [usize]] {
        match self {
            CellType::Vertex => VERTEX_FACES,
            CellType::Line => LINE_FACES,
            CellType::Triangle => TRIANGLE_FACES,
            CellType::Quadrilateral => QUAD_FACES,
            CellType::Tetrahedron => TETRA_FACES,
            CellType::Hexahedron => HEXA_FACES,
            CellType::Wedge => WEDGE_FACES,
            CellType::Pyramid => PYRAMID_FACES,
        }
    }

    pub const fn n_faces(self) -> usize {
        self.faces().len()
    }

    /// Local nodes joined to local node `node` by an edge of the cell.
    pub const fn neighbor_nodes(self, node: usize) -> &'static [usize] {
        match self {
            CellType::Vertex => VERTEX_NEIGHBORS[node],
            CellType::Line => LINE_NEIGHBORS[node],
            CellType::Triangle => TRIANGLE_NEIGHBORS[node],
            CellType::Quadrilateral => QUAD_NEIGHBORS[node],
            CellType::Tetrahedron => TETRA_NEIGHBORS[node],
            CellType::Hexahedron => HEXA_NEIGHBORS[node],
            CellType::Wedge => WEDGE_NEIGHBORS[node],
            CellType::Pyramid => PYRAMID_NEIGHBORS[node],
        }
    }

    /// True for the tensor-product shapes that seed indirect agglomeration.
    pub const fn is_structured(self) -> bool {
        matches!(self, CellType::Quadrilateral | CellType::Hexahedron)
    }

    /// Mirror permutation applied by orientation fixing.
    ///
    /// Applying it to a cell flips the sign of every orientation test of
    /// that cell type.
    pub const fn reversal(self) -> &'static [usize] {
        match self {
            CellType::Vertex => &[0],
            CellType::Line => &[1, 0],
            CellType::Triangle => &[0, 2, 1],
            CellType::Quadrilateral => &[0, 3, 2, 1],
            CellType::Tetrahedron => &[1, 0, 2, 3],
            CellType::Hexahedron => &[0, 3, 2, 1, 4, 7, 6, 5],
            CellType::Wedge => &[0, 2, 1, 3, 5, 4],
            CellType::Pyramid => &[0, 3, 2, 1, 4],
        }
    }

    /// Local simplices covering the cell, used to hand mixed meshes to a
    /// partitioner as triangles/tetrahedra.
    pub const fn simplex_split(self) -> &'static [&'static [usize]] {
        match self {
            CellType::Vertex => &[&[0]],
            CellType::Line => &[&[0, 1]],
            CellType::Triangle => &[&[0, 1, 2]],
            CellType::Quadrilateral => &[&[0, 1, 2], &[0, 2, 3]],
            CellType::Tetrahedron => &[&[0, 1, 2, 3]],
            CellType::Hexahedron => &[
                &[0, 1, 3, 4],
                &[1, 2, 3, 6],
                &[1, 4, 5, 6],
                &[3, 4, 6, 7],
                &[1, 3, 4, 6],
            ],
            CellType::Wedge => &[&[0, 1, 2, 3], &[1, 2, 3, 4], &[2, 3, 4, 5]],
            CellType::Pyramid => &[&[0, 1, 2, 4], &[0, 2, 3, 4]],
        }
    }

    /// Simplices covering a cell whose nodes carry the ids `nodes`.
    ///
    /// A quadrilateral is cut along the diagonal through its smallest id.
    /// A 3-D cell is pulled from its smallest id: every face missing that
    /// node is cut the same way and each piece is joined to it. The cut of a
    /// shared face only depends on the face's own ids, so neighbouring cells
    /// (and the boundary faces on them) agree.
    pub fn conforming_simplices(self, nodes: &[usize]) -> Vec<Vec<usize>> {
        match self {
            CellType::Quadrilateral => split_quad(nodes),
            CellType::Hexahedron | CellType::Wedge | CellType::Pyramid => {
                let Some(apex) = (0..nodes.len()).min_by_key(|&l| nodes[l]) else {
                    return Vec::new();
                };
                let mut out = Vec::new();
                for face in self.faces().iter().filter(|f| !f.contains(&apex)) {
                    let ids: Vec<usize> = face.iter().map(|&l| nodes[l]).collect();
                    let pieces = if ids.len() == 4 { split_quad(&ids) } else { vec![ids] };
                    for tri in pieces {
                        let mut tet = Vec::with_capacity(4);
                        tet.push(nodes[apex]);
                        tet.extend(tri);
                        out.push(tet);
                    }
                }
                out
            }
            _ => vec![nodes.to_vec()],
        }
    }
}

/// The two triangles of a quadrilateral, cut through its smallest id and
/// keeping the winding.
fn split_quad(nodes: &[usize]) -> Vec<Vec<usize>> {
    let k = (0..4).min_by_key(|&l| nodes[l]).unwrap_or(0);
    let at = |i: usize| nodes[(k + i) % 4];
    vec![vec![at(0), at(1), at(2)], vec![at(0), at(2), at(3)]]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    /// Sorted triangles of the simplices that lie on the node set `face`.
    fn traces(simplices: &[Vec<usize>], face: &[usize]) -> BTreeSet<Vec<usize>> {
        let mut out = BTreeSet::new();
        for s in simplices {
            for skip in 0..s.len() {
                let mut tri: Vec<usize> =
                    s.iter().enumerate().filter(|&(k, _)| k != skip).map(|(_, &n)| n).collect();
                if tri.iter().all(|n| face.contains(n)) {
                    tri.sort_unstable();
                    out.insert(tri);
                }
            }
        }
        out
    }

    #[test]
    fn conforming_split_agrees_with_face_cuts() {
        let ids = [15, 3, 27, 9, 4, 21, 8, 30];
        for (ct, count) in [
            (CellType::Hexahedron, 6),
            (CellType::Wedge, 3),
            (CellType::Pyramid, 2),
        ] {
            let nodes = &ids[..ct.n_nodes()];
            let tets = ct.conforming_simplices(nodes);
            assert_eq!(tets.len(), count, "{ct:?}");
            assert!(tets.iter().all(|t| t.len() == 4));
            for face in ct.faces().iter().filter(|f| f.len() == 4) {
                let quad: Vec<usize> = face.iter().map(|&l| nodes[l]).collect();
                let expected: BTreeSet<Vec<usize>> = split_quad(&quad)
                    .into_iter()
                    .map(|mut t| {
                        t.sort_unstable();
                        t
                    })
                    .collect();
                assert_eq!(traces(&tets, &quad), expected, "{ct:?} face {face:?}");
            }
        }
    }

    #[test]
    fn quads_are_cut_through_their_smallest_id() {
        assert_eq!(
            CellType::Quadrilateral.conforming_simplices(&[7, 2, 9, 4]),
            vec![vec![2, 9, 4], vec![2, 4, 7]]
        );
        assert_eq!(CellType::Tetrahedron.conforming_simplices(&[1, 2, 3, 4]), vec![vec![1, 2, 3, 4]]);
    }

    #[test]
    fn vtk_tags_round_trip() {
        for ct in CellType::ALL {
            assert_eq!(CellType::from_vtk_tag(ct.vtk_tag()).unwrap(), ct);
        }
        assert!(matches!(
            CellType::from_vtk_tag(7),
            Err(MeshError::UnsupportedCellType(7))
        ));
    }

    #[test]
    fn neighbor_tables_are_symmetric() {
        for ct in CellType::ALL {
            for a in 0..ct.n_nodes() {
                for &b in ct.neighbor_nodes(a) {
                    assert!(
                        ct.neighbor_nodes(b).contains(&a),
                        "{ct:?}: {a}->{b} not mirrored"
                    );
                }
            }
        }
    }

    #[test]
    fn every_face_edge_is_a_cell_edge() {
        for ct in [
            CellType::Tetrahedron,
            CellType::Hexahedron,
            CellType::Wedge,
            CellType::Pyramid,
        ] {
            for face in ct.faces() {
                for k in 0..face.len() {
                    let (a, b) = (face[k], face[(k + 1) % face.len()]);
                    assert!(ct.neighbor_nodes(a).contains(&b), "{ct:?} face edge {a}-{b}");
                }
            }
        }
    }

    #[test]
    fn each_cell_edge_is_shared_by_two_faces_in_opposite_directions() {
        for ct in [
            CellType::Tetrahedron,
            CellType::Hexahedron,
            CellType::Wedge,
            CellType::Pyramid,
        ] {
            let mut directed = Vec::new();
            for face in ct.faces() {
                for k in 0..face.len() {
                    directed.push((face[k], face[(k + 1) % face.len()]));
                }
            }
            for &(a, b) in &directed {
                assert_eq!(directed.iter().filter(|&&e| e == (a, b)).count(), 1);
                assert_eq!(directed.iter().filter(|&&e| e == (b, a)).count(), 1);
            }
        }
    }
}

//! Orientation normalization of element node lists.
//!
//! Volumetric cells are brought to positive orientation: counter-clockwise
//! in 2-D, positive signed volume in 3-D, so that the face tables of
//! [`CellType`] wind outward. Boundary cells are wound so that their
//! right-hand normal points out of the domain.
//!
//! Both helpers are pure and idempotent: a fixed node list is returned
//! unchanged.

use super::cell_type::CellType;
use crate::geometry::{centroid, cross2, dot, polygon_area_vector, sub, triple};

/// Apply the cell type's mirror permutation to `nodes`.
pub fn reversed(cell_type: CellType, nodes: &[usize]) -> Vec<usize> {
    cell_type.reversal().iter().map(|&l| nodes[l]).collect()
}

/// True when the cell's sign tests say it is inverted.
///
/// `coords[k]` is the position of local node `k`.
pub fn is_inverted(cell_type: CellType, coords: &[[f64; 3]]) -> bool {
    let p = coords;
    match cell_type {
        CellType::Vertex | CellType::Line => false,
        CellType::Triangle => cross2(p[0], p[1], p[2]) < 0.0,
        CellType::Quadrilateral => cross2(p[0], p[1], p[2]) + cross2(p[0], p[2], p[3]) < 0.0,
        CellType::Tetrahedron => triple(p[0], p[1], p[2], p[3]) < 0.0,
        CellType::Hexahedron => {
            triple(p[0], p[1], p[3], p[4]) < 0.0 && triple(p[6], p[5], p[7], p[2]) < 0.0
        }
        CellType::Wedge => {
            let above = [
                2.0 * p[3][0] - p[0][0],
                2.0 * p[3][1] - p[0][1],
                2.0 * p[3][2] - p[0][2],
            ];
            triple(p[0], p[1], p[2], p[3]) < 0.0 && triple(p[3], p[4], p[5], above) < 0.0
        }
        CellType::Pyramid => {
            triple(p[0], p[1], p[3], p[4]) < 0.0 && triple(p[2], p[3], p[1], p[4]) < 0.0
        }
    }
}

/// Node order of a volumetric cell with positive orientation.
pub fn fixed_order(cell_type: CellType, nodes: &[usize], coords: &[[f64; 3]]) -> Vec<usize> {
    if is_inverted(cell_type, coords) {
        reversed(cell_type, nodes)
    } else {
        nodes.to_vec()
    }
}

/// Node order of a boundary cell whose normal points away from `interior`
/// (a point inside the adjacent domain element, usually its centroid).
pub fn fixed_boundary_order(
    cell_type: CellType,
    nodes: &[usize],
    coords: &[[f64; 3]],
    interior: [f64; 3],
) -> Vec<usize> {
    let flip = match cell_type {
        // Domain must lie to the left of A->B.
        CellType::Line => cross2(coords[0], coords[1], interior) < 0.0,
        CellType::Triangle | CellType::Quadrilateral => {
            let n = polygon_area_vector(coords);
            let c = centroid(coords.iter().copied());
            dot(n, sub(interior, c)) > 0.0
        }
        _ => false,
    };
    if flip {
        reversed(cell_type, nodes)
    } else {
        nodes.to_vec()
    }
}

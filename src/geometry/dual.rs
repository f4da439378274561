//! Median-dual control volumes.
//!
//! The dual face between the two endpoints of an edge is assembled
//! element by element:
//! - 2-D: each element face is one edge and contributes the segment from the
//!   edge midpoint `M` to the element centroid `C`;
//! - 3-D: each edge of each element face contributes the triangle
//!   `(M, F, C)` where `F` is the face centroid.
//!
//! The piece is oriented along the face traversal `a -> b` and negated when
//! `a > b`, so every edge normal points from its lower to its higher index
//! point. Each endpoint `P` also receives the triangle `(P, M, C)` (2-D) or
//! tetrahedron `(P, M, F, C)` (3-D) as control volume.

use super::{add, centroid, cross, cross2, dot, norm, polygon_area_vector, scale, sub, triple};
use crate::mesh::Mesh;

/// Boundary points whose faces turn by more than this angle (radians) are
/// reported as sharp corners.
pub const SHARP_CORNER_ANGLE: f64 = 2.0 * std::f64::consts::FRAC_PI_3;

impl Mesh {
    /// Centroids of elements and boundary elements.
    pub fn set_cg(&mut self) {
        for ie in 0..self.elements.len() {
            let cg = centroid(self.elements[ie].nodes.iter().map(|&n| self.points[n].coord));
            self.elements[ie].cg = cg;
        }
        for m in &mut self.markers {
            for be in &mut m.elements {
                be.cg = centroid(be.nodes.iter().map(|&n| self.points[n].coord));
            }
        }
    }

    /// Edge normals and point volumes. Needs `set_edges` and `set_cg`.
    pub fn set_control_volume(&mut self) {
        for e in &mut self.edges {
            e.normal = [0.0; 3];
        }
        for p in &mut self.points {
            p.volume[0] = 0.0;
        }

        for ie in 0..self.elements.len() {
            let c = self.elements[ie].cg;
            let ct = self.elements[ie].cell_type;
            for f in 0..ct.n_faces() {
                let face: Vec<usize> = self.elements[ie].face_nodes(f).collect();
                if self.dim == 2 {
                    let (a, b) = (face[0], face[1]);
                    let (pa, pb) = (self.points[a].coord, self.points[b].coord);
                    let mid = scale(add(pa, pb), 0.5);
                    let d = sub(c, mid);
                    let piece = [d[1], -d[0], 0.0];
                    self.add_edge_piece(a, b, piece);
                    self.points[a].volume[0] += 0.5 * cross2(pa, mid, c).abs();
                    self.points[b].volume[0] += 0.5 * cross2(pb, mid, c).abs();
                } else {
                    let fc = centroid(face.iter().map(|&n| self.points[n].coord));
                    for k in 0..face.len() {
                        let (a, b) = (face[k], face[(k + 1) % face.len()]);
                        let (pa, pb) = (self.points[a].coord, self.points[b].coord);
                        let mid = scale(add(pa, pb), 0.5);
                        let piece = scale(cross(sub(c, mid), sub(fc, mid)), 0.5);
                        // Each element edge is met by two faces; each adds half.
                        self.add_edge_piece(a, b, piece);
                        self.points[a].volume[0] += triple(pa, mid, fc, c).abs() / 6.0;
                        self.points[b].volume[0] += triple(pb, mid, fc, c).abs() / 6.0;
                    }
                }
            }
        }
    }

    fn add_edge_piece(&mut self, a: usize, b: usize, piece: [f64; 3]) {
        // Adjacency is built from the same tables, so the edge exists.
        let Some(k) = self.points[a].edge_to(b) else {
            log::warn!("no edge {a}-{b} for a dual face piece");
            return;
        };
        let piece = if a < b { piece } else { scale(piece, -1.0) };
        self.edges[k].add_normal(piece);
    }

    /// Outward boundary normals per vertex. Needs `set_vertex` and an
    /// oriented boundary.
    pub fn set_bound_control_volume(&mut self) {
        for im in 0..self.markers.len() {
            for v in &mut self.markers[im].vertices {
                v.normal = [0.0; 3];
            }
            if self.markers[im].is_send_receive() {
                continue;
            }
            for ib in 0..self.markers[im].elements.len() {
                let nodes = self.markers[im].elements[ib].nodes.clone();
                let coords = self.gather(&nodes);
                let pieces: Vec<[f64; 3]> = if self.dim == 2 {
                    let d = sub(coords[1], coords[0]);
                    let half = [0.5 * d[1], -0.5 * d[0], 0.0];
                    vec![half, half]
                } else {
                    let fc = centroid(coords.iter().copied());
                    let n = coords.len();
                    (0..n)
                        .map(|k| {
                            let p = coords[k];
                            let next = scale(add(p, coords[(k + 1) % n]), 0.5);
                            let prev = scale(add(p, coords[(k + n - 1) % n]), 0.5);
                            polygon_area_vector(&[p, next, fc, prev])
                        })
                        .collect()
                };
                for (&node, piece) in nodes.iter().zip(pieces) {
                    if let Some(iv) = self.points[node].vertex_on(im) {
                        self.markers[im].vertices[iv].add_normal(piece);
                    }
                }
            }
        }
    }

    /// Largest angle between the unit normals of the physical boundary
    /// faces around each point.
    pub fn set_corner_angles(&mut self) {
        let mut normals: Vec<Vec<[f64; 3]>> = vec![Vec::new(); self.n_point()];
        for m in self.markers.iter().filter(|m| !m.is_send_receive()) {
            for be in &m.elements {
                let coords = self.gather(&be.nodes);
                let n = match (self.dim, coords.len()) {
                    (2, 2) => {
                        let d = sub(coords[1], coords[0]);
                        [d[1], -d[0], 0.0]
                    }
                    (3, 3..) => polygon_area_vector(&coords),
                    _ => continue,
                };
                let len = norm(n);
                if len == 0.0 {
                    continue;
                }
                for &node in &be.nodes {
                    normals[node].push(scale(n, 1.0 / len));
                }
            }
        }
        let mut sharp = 0;
        for (p, around) in normals.iter().enumerate() {
            let mut angle = 0.0f64;
            for (i, a) in around.iter().enumerate() {
                for b in &around[i + 1..] {
                    angle = angle.max(dot(*a, *b).clamp(-1.0, 1.0).acos());
                }
            }
            self.points[p].sharp_corner_angle = angle;
            if angle > SHARP_CORNER_ANGLE && self.points[p].domain {
                sharp += 1;
                log::warn!(
                    "point {p} at {:?}: sharp corner, boundary faces turn by {:.1} degrees",
                    self.points[p].coord,
                    angle.to_degrees()
                );
            }
        }
        if sharp > 0 {
            log::debug!("{sharp} sharp boundary corners");
        }
    }
}

//! Boundary vertex construction.

use super::Mesh;
use crate::topology::Vertex;

impl Mesh {
    /// Create the vertices of every marker.
    ///
    /// A point gets one vertex per marker, the first time it is met. On
    /// send/receive markers every occurrence makes a new vertex, in marker
    /// order, carrying the element's rotation tag: the order is how sender
    /// and receiver lists are matched across domains.
    pub fn set_vertex(&mut self) {
        let n_marker = self.markers.len();
        for p in &mut self.points {
            p.vertex = vec![None; n_marker];
            p.boundary = false;
            p.physical_boundary = false;
        }
        for (im, m) in self.markers.iter_mut().enumerate() {
            m.vertices.clear();
            let halo = m.is_send_receive();
            for be in &m.elements {
                for &n in &be.nodes {
                    let p = &mut self.points[n];
                    if halo || p.vertex[im].is_none() {
                        let mut v = Vertex::new(n);
                        v.rotation = be.rotation;
                        m.vertices.push(v);
                        p.vertex[im] = Some(m.vertices.len() - 1);
                    }
                    p.boundary = true;
                    if !halo {
                        p.physical_boundary = true;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::MeshConfig;
    use crate::mesh::tests::two_quads;
    use crate::mesh::{BoundaryDescription, MarkerDescription, Mesh};
    use crate::topology::CellType;

    #[test]
    fn one_vertex_per_point_and_marker() {
        let m = Mesh::build(two_quads(), &MeshConfig::default()).unwrap();
        let lower = m.marker_index("lower").unwrap();
        let pts: Vec<usize> = m.markers[lower].vertices.iter().map(|v| v.point).collect();
        assert_eq!(pts, vec![0, 1, 2]);
        assert_eq!(m.points[1].vertex_on(lower), Some(1));
        assert!(m.points[0].physical_boundary);
        // Corner 0 sits on two markers.
        assert_eq!(m.points[0].markers().count(), 2);
    }

    #[test]
    fn send_receive_markers_keep_duplicates_in_order() {
        let mut d = two_quads();
        let halo = |n: usize, rot: usize| BoundaryDescription {
            cell_type: CellType::Vertex,
            nodes: vec![n],
            rotation: rot,
        };
        d.markers.push(MarkerDescription {
            tag: "SEND_RECEIVE".into(),
            send_recv: Some(1),
            elements: vec![halo(4, 0), halo(1, 0), halo(4, 2)],
        });
        let m = Mesh::build(d, &MeshConfig::default()).unwrap();
        let sr = &m.markers[4];
        let got: Vec<(usize, usize)> = sr.vertices.iter().map(|v| (v.point, v.rotation)).collect();
        assert_eq!(got, vec![(4, 0), (1, 0), (4, 2)]);
        // The point keeps the index of its last occurrence.
        assert_eq!(m.points[4].vertex_on(4), Some(2));
    }
}

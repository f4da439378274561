//! Element/point adjacency passes.

use super::Mesh;
use crate::mesh_error::MeshError;
use itertools::Itertools;

impl Mesh {
    /// Elements surrounding each point.
    pub fn set_esup(&mut self) {
        for p in &mut self.points {
            p.elements.clear();
        }
        for (ie, e) in self.elements.iter().enumerate() {
            for &n in &e.nodes {
                self.points[n].elements.push(ie);
            }
        }
    }

    /// Points surrounding each point, through the neighbour-node table of
    /// every incident element. Needs `set_esup`.
    pub fn set_psup(&mut self) {
        for ip in 0..self.points.len() {
            let mut nbrs = Vec::new();
            for &ie in &self.points[ip].elements {
                let e = &self.elements[ie];
                if let Some(local) = e.local_index(ip) {
                    nbrs.extend(e.cell_type.neighbor_nodes(local).iter().map(|&l| e.nodes[l]));
                }
            }
            nbrs.sort_unstable();
            nbrs.dedup();
            let p = &mut self.points[ip];
            p.points = nbrs;
            p.edges.clear();
        }
    }

    /// Element neighbours across faces. Faces without a partner stay `None`.
    /// Needs `set_esup`.
    pub fn set_esue(&mut self) {
        for e in &mut self.elements {
            e.neighbors.iter_mut().for_each(|n| *n = None);
        }
        for ie in 0..self.elements.len() {
            for f in 0..self.elements[ie].cell_type.n_faces() {
                if self.elements[ie].neighbors[f].is_some() {
                    continue;
                }
                let face: Vec<usize> = self.elements[ie].face_nodes(f).sorted_unstable().collect();
                let first = self.elements[ie].face_nodes(f).next();
                let Some(first) = first else { continue };
                let hit = self.points[first]
                    .elements
                    .iter()
                    .filter(|&&je| je > ie)
                    .find_map(|&je| {
                        let other = &self.elements[je];
                        (0..other.cell_type.n_faces()).find_map(|g| {
                            let cand: Vec<usize> = other.face_nodes(g).sorted_unstable().collect();
                            (cand == face).then_some((je, g))
                        })
                    });
                if let Some((je, g)) = hit {
                    self.elements[ie].neighbors[f] = Some(je);
                    self.elements[je].neighbors[g] = Some(ie);
                }
            }
        }
    }

    /// Attach every boundary element to the volumetric element containing
    /// all of its nodes. Needs `set_esup`.
    pub fn set_bound_volume(&mut self) -> Result<(), MeshError> {
        for m in &mut self.markers {
            for (ib, be) in m.elements.iter_mut().enumerate() {
                let found = self.points[be.nodes[0]]
                    .elements
                    .iter()
                    .copied()
                    .find(|&ie| be.nodes.iter().all(|n| self.elements[ie].nodes.contains(n)));
                match found {
                    Some(ie) => be.domain_element = Some(ie),
                    None => {
                        return Err(MeshError::MissingDomainElement {
                            marker: m.tag.clone(),
                            elem: ib,
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::MeshConfig;
    use crate::mesh::tests::two_quads;
    use crate::mesh::Mesh;
    use crate::mesh_error::MeshError;

    #[test]
    fn neighbours_of_the_two_quad_strip() {
        let m = Mesh::build(two_quads(), &MeshConfig::default()).unwrap();
        assert_eq!(m.points[1].points, vec![0, 2, 4]);
        assert_eq!(m.points[0].points, vec![1, 3]);
        assert_eq!(m.points[4].elements, vec![0, 1]);
        // Only the shared face 1-4 has a partner.
        let n0: Vec<_> = m.elements[0].neighbors.iter().flatten().collect();
        let n1: Vec<_> = m.elements[1].neighbors.iter().flatten().collect();
        assert_eq!(n0, vec![&1]);
        assert_eq!(n1, vec![&0]);
    }

    #[test]
    fn boundary_elements_find_their_domain_element() {
        let m = Mesh::build(two_quads(), &MeshConfig::default()).unwrap();
        let right = m.marker_index("right").unwrap();
        assert_eq!(m.markers[right].elements[0].domain_element, Some(1));
        let lower = m.marker_index("lower").unwrap();
        assert_eq!(m.markers[lower].elements[0].domain_element, Some(0));
    }

    #[test]
    fn orphan_boundary_element_is_an_error() {
        let mut d = two_quads();
        // 0-5 is a diagonal, not an element edge.
        d.markers[3].elements[0].nodes = vec![0, 5];
        let mut m = Mesh::from_description(d, &MeshConfig::default()).unwrap();
        m.set_esup();
        assert!(matches!(
            m.set_bound_volume(),
            Err(MeshError::MissingDomainElement { .. })
        ));
    }
}

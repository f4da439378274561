//! Primal-graph edges.

use super::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::Edge;

impl Mesh {
    /// One edge per unordered pair of neighbouring points. Needs `set_psup`.
    ///
    /// Points are visited in ascending order, so when `i` meets a lower
    /// neighbour `j` the edge already exists and is found through `j`'s
    /// table.
    pub fn set_edges(&mut self) {
        self.edges.clear();
        for i in 0..self.points.len() {
            let nbrs = self.points[i].points.clone();
            let mut table = Vec::with_capacity(nbrs.len());
            for &j in &nbrs {
                let k = if j < i {
                    // j < i has been visited, its table is complete.
                    match self.points[j].edge_to(i) {
                        Some(k) => k,
                        None => self.push_edge(i, j),
                    }
                } else {
                    self.push_edge(i, j)
                };
                table.push(k);
            }
            self.points[i].edges = table;
        }
        log::debug!("{} edges", self.edges.len());
    }

    fn push_edge(&mut self, a: usize, b: usize) -> usize {
        let mut e = Edge::new(a, b);
        let (pa, pb) = (self.points[a].coord, self.points[b].coord);
        e.cg = [
            0.5 * (pa[0] + pb[0]),
            0.5 * (pa[1] + pb[1]),
            0.5 * (pa[2] + pb[2]),
        ];
        self.edges.push(e);
        self.edges.len() - 1
    }

    /// Edge joining `a` and `b`. A miss means the adjacency is corrupt.
    pub fn find_edge(&self, a: usize, b: usize) -> Result<usize, MeshError> {
        self.points
            .get(a)
            .and_then(|p| p.edge_to(b))
            .ok_or(MeshError::MissingEdge(a, b))
    }
}

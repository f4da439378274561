//! Element-node connectivity handed to a graph partitioner.
//
// Mixed meshes are split into triangles/tetrahedra so the partitioner
// sees one cell family. Returned in METIS-ready CSR form:
//
// * `eptr[i] .. eptr[i+1]` = nodes of simplex *i* inside `eind`
// * `eind`                 = concatenated node indices
//
// `point_graph` turns it into the nodal CSR graph (`xadj`/`adjncy`), two
// points being adjacent when they share a simplex. The graph is symmetric
// and self-free.

use crate::mesh::Mesh;

#[derive(Debug, Clone, PartialEq)]
pub struct SimplexConnectivity {
    pub eptr: Vec<usize>,
    pub eind: Vec<usize>,
    pub n_point: usize,
}

impl SimplexConnectivity {
    pub fn n_simplex(&self) -> usize {
        self.eptr.len() - 1
    }

    pub fn simplex(&self, i: usize) -> &[usize] {
        &self.eind[self.eptr[i]..self.eptr[i + 1]]
    }
}

/// Split every volumetric element of `mesh` into simplices.
pub fn simplex_connectivity(mesh: &Mesh) -> SimplexConnectivity {
    let mut eptr = vec![0];
    let mut eind = Vec::new();
    for e in &mesh.elements {
        for s in e.cell_type.simplex_split() {
            eind.extend(s.iter().map(|&l| e.nodes[l]));
            eptr.push(eind.len());
        }
    }
    SimplexConnectivity {
        eptr,
        eind,
        n_point: mesh.n_point(),
    }
}

/// Nodal CSR graph.
#[derive(Debug, Clone, PartialEq)]
pub struct PointGraph {
    pub xadj: Vec<usize>,
    pub adjncy: Vec<usize>,
}

impl PointGraph {
    pub fn neighbors(&self, p: usize) -> &[usize] {
        &self.adjncy[self.xadj[p]..self.xadj[p + 1]]
    }
}

pub fn point_graph(conn: &SimplexConnectivity) -> PointGraph {
    let mut adj: Vec<Vec<usize>> = vec![Vec::new(); conn.n_point];
    for i in 0..conn.n_simplex() {
        let s = conn.simplex(i);
        for &a in s {
            adj[a].extend(s.iter().copied().filter(|&b| b != a));
        }
    }
    let mut xadj = Vec::with_capacity(conn.n_point + 1);
    let mut adjncy = Vec::new();
    xadj.push(0);
    for mut nbrs in adj {
        nbrs.sort_unstable();
        nbrs.dedup();
        adjncy.extend(nbrs);
        xadj.push(adjncy.len());
    }
    PointGraph { xadj, adjncy }
}

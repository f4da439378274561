//! Primal-graph edges carrying the dual-face normal.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    /// Endpoints, lower index first.
    pub nodes: [usize; 2],
    /// Dual-face normal, pointing from `nodes[0]` to `nodes[1]`.
    pub normal: [f64; 3],
    /// `normal` at the previous and second previous time level, kept for
    /// grid motion.
    pub normal_history: [[f64; 3]; 2],
    /// Midpoint of the two endpoints.
    pub cg: [f64; 3],
}

impl Edge {
    pub fn new(a: usize, b: usize) -> Self {
        Self {
            nodes: if a < b { [a, b] } else { [b, a] },
            normal: [0.0; 3],
            normal_history: [[0.0; 3]; 2],
            cg: [0.0; 3],
        }
    }

    /// Add `v` to the normal.
    #[inline]
    pub fn add_normal(&mut self, v: [f64; 3]) {
        for (n, x) in self.normal.iter_mut().zip(v) {
            *n += x;
        }
    }

    /// The endpoint that is not `p`.
    pub fn other(&self, p: usize) -> usize {
        if self.nodes[0] == p { self.nodes[1] } else { self.nodes[0] }
    }
}

//! Boundary vertices: a point seen through one marker.

use serde::{Deserialize, Serialize};

/// Partner point of a periodic, near-field or interface vertex.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonorPoint {
    /// Point index on the owning rank.
    pub point: usize,
    /// Rank that owns `point`.
    pub domain: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub point: usize,
    /// Boundary dual-face normal, pointing out of the domain.
    pub normal: [f64; 3],
    pub donor: Option<DonorPoint>,
    /// Periodic transform index, 0 for plain halo entries.
    pub rotation: usize,
    /// Interior neighbour closest to the inward normal direction.
    pub normal_neighbor: Option<usize>,
}

impl Vertex {
    pub fn new(point: usize) -> Self {
        Self {
            point,
            normal: [0.0; 3],
            donor: None,
            rotation: 0,
            normal_neighbor: None,
        }
    }

    #[inline]
    pub fn add_normal(&mut self, v: [f64; 3]) {
        for (n, x) in self.normal.iter_mut().zip(v) {
            *n += x;
        }
    }
}

//! `Point`: one mesh vertex and everything the finite-volume scheme keeps on
//! it.
//!
//! Points live in `Mesh::points` and refer to other records by index only.
//! Adjacency lists (`points`, `edges`, `elements`) are filled by the
//! construction passes of [`crate::mesh`]; agglomeration state is filled by
//! [`crate::multigrid`].

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Position; the third component is zero in 2-D.
    pub coord: [f64; 3],
    /// Index of this point in the global (unpartitioned) mesh.
    pub global_index: usize,
    /// Owning domain (partition color).
    pub color: usize,
    /// True when this rank owns the point (not a ghost, not a periodic copy).
    pub domain: bool,
    /// Lies on any marker, including send/receive markers.
    pub boundary: bool,
    /// Lies on a marker that is not send/receive.
    pub physical_boundary: bool,
    /// Control volume at the current, previous and second previous level.
    pub volume: [f64; 3],
    /// Neighbouring points in the primal graph, sorted ascending.
    pub points: Vec<usize>,
    /// Edge index for each entry of `points`.
    pub edges: Vec<usize>,
    /// Elements that contain this point.
    pub elements: Vec<usize>,
    /// Vertex index per marker, `None` when the point is not on that marker.
    pub vertex: Vec<Option<usize>>,
    pub wall_distance: f64,
    /// Grid velocity of a rotating frame at this point.
    pub rotational_velocity: [f64; 3],
    /// Largest angle (radians) between the physical boundary faces meeting
    /// at this point; zero inside the domain and on flat walls.
    pub sharp_corner_angle: f64,
    /// Coarse point that absorbed this point.
    pub parent: Option<usize>,
    pub agglomerated: bool,
    /// Fine points merged into this point, when this is a coarse point.
    pub children: Vec<usize>,
    /// May absorb indirect (2/3-hop) neighbours during agglomeration.
    pub agglomerate_indirect: bool,
}

impl Point {
    pub fn new(coord: [f64; 3], global_index: usize) -> Self {
        Self {
            coord,
            global_index,
            color: 0,
            domain: true,
            boundary: false,
            physical_boundary: false,
            volume: [0.0; 3],
            points: Vec::new(),
            edges: Vec::new(),
            elements: Vec::new(),
            vertex: Vec::new(),
            wall_distance: 0.0,
            rotational_velocity: [0.0; 3],
            sharp_corner_angle: 0.0,
            parent: None,
            agglomerated: false,
            children: Vec::new(),
            agglomerate_indirect: false,
        }
    }

    /// Current control volume.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.volume[0]
    }

    /// Edge joining this point to `other`, if they are neighbours.
    pub fn edge_to(&self, other: usize) -> Option<usize> {
        self.points
            .binary_search(&other)
            .ok()
            .map(|k| self.edges[k])
    }

    /// Vertex of this point on marker `marker`.
    #[inline]
    pub fn vertex_on(&self, marker: usize) -> Option<usize> {
        self.vertex.get(marker).copied().flatten()
    }

    /// Markers this point has a vertex on.
    pub fn markers(&self) -> impl Iterator<Item = usize> + '_ {
        self.vertex
            .iter()
            .enumerate()
            .filter_map(|(m, v)| v.map(|_| m))
    }
}

//! The mesh arena and its construction pipeline.
//!
//! A [`Mesh`] owns flat vectors of points, elements, edges and markers; every
//! cross reference is an index into one of them. It is built from a
//! [`MeshDescription`] (what a reader produces) by [`Mesh::build`], which runs
//! the construction phases in their fixed order:
//!
//! ```text
//! ingest -> esup -> bound volume -> orientation -> psup -> esue
//!        -> vertices -> centroids -> edges -> control volumes
//! ```
//!
//! Each phase is also a public method so tests and the partitioning code can
//! re-run pieces on their own.

mod adjacency;
mod edges;
mod vertices;

use crate::algs::collective::all_reduce_sum;
use crate::algs::communicator::Communicator;
use crate::config::MeshConfig;
use crate::geometry::{centroid, cross, sub};
use crate::mesh_error::MeshError;
use crate::topology::orientation::{fixed_boundary_order, fixed_order};
use crate::topology::{
    BoundaryElement, BoundaryKind, CellType, Edge, Element, Marker, PeriodicTransform, Point,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One volumetric element of a description.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ElementDescription {
    pub cell_type: CellType,
    pub nodes: Vec<usize>,
}

/// One boundary element of a description. `rotation` is only meaningful on
/// send/receive markers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundaryDescription {
    pub cell_type: CellType,
    pub nodes: Vec<usize>,
    pub rotation: usize,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarkerDescription {
    pub tag: String,
    /// Partner code of a send/receive marker (see [`Marker::send_recv`]).
    pub send_recv: Option<i64>,
    pub elements: Vec<BoundaryDescription>,
}

/// Semantic content of a mesh file: points, cells, boundary tags and
/// periodic transforms.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshDescription {
    pub dim: usize,
    pub coords: Vec<[f64; 3]>,
    /// Global index per point; identity when absent.
    pub global_index: Option<Vec<usize>>,
    /// Number of owned points; the rest are ghosts. All points when absent.
    pub n_point_domain: Option<usize>,
    pub elements: Vec<ElementDescription>,
    pub markers: Vec<MarkerDescription>,
    pub periodic: BTreeMap<usize, PeriodicTransform>,
}

impl MeshDescription {
    /// Replace every cell by triangles (2-D) or tetrahedra (3-D), see
    /// [`CellType::conforming_simplices`]. In 3-D the quadrilateral faces of
    /// the markers are cut along the same diagonals as the cells behind
    /// them; boundary lines are unaffected.
    pub fn divide_simplices(&mut self) {
        let before = self.elements.len();
        let mut out = Vec::with_capacity(before);
        for e in self.elements.drain(..) {
            for nodes in e.cell_type.conforming_simplices(&e.nodes) {
                let cell_type = match nodes.len() {
                    3 => CellType::Triangle,
                    4 => CellType::Tetrahedron,
                    _ => e.cell_type,
                };
                out.push(ElementDescription { cell_type, nodes });
            }
        }
        self.elements = out;

        for m in &mut self.markers {
            let mut faces = Vec::with_capacity(m.elements.len());
            for b in m.elements.drain(..) {
                if b.cell_type != CellType::Quadrilateral {
                    faces.push(b);
                    continue;
                }
                for nodes in b.cell_type.conforming_simplices(&b.nodes) {
                    faces.push(BoundaryDescription {
                        cell_type: CellType::Triangle,
                        nodes,
                        rotation: b.rotation,
                    });
                }
            }
            m.elements = faces;
        }
        log::debug!("divided {before} cells into {} simplices", self.elements.len());
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// 2 or 3.
    pub dim: usize,
    pub points: Vec<Point>,
    /// Points `0..n_point_domain` are owned, the rest are ghosts or
    /// periodic copies.
    pub n_point_domain: usize,
    pub elements: Vec<Element>,
    pub edges: Vec<Edge>,
    pub markers: Vec<Marker>,
    /// Index 0 is always the identity.
    pub periodic: Vec<PeriodicTransform>,
    /// Multigrid level, 0 on the finest mesh.
    pub level: usize,
}

impl Mesh {
    /// Ingest and run every construction phase.
    pub fn build(desc: MeshDescription, config: &MeshConfig) -> Result<Self, MeshError> {
        let mut mesh = Self::from_description(desc, config)?;
        mesh.preprocess()?;
        Ok(mesh)
    }

    /// Turn a description into points, elements and markers, without any
    /// derived structure.
    pub fn from_description(desc: MeshDescription, config: &MeshConfig) -> Result<Self, MeshError> {
        if desc.dim != 2 && desc.dim != 3 {
            return Err(MeshError::InvalidDimension(desc.dim));
        }
        let n_point = desc.coords.len();
        let n_point_domain = desc.n_point_domain.unwrap_or(n_point);
        if n_point_domain > n_point {
            return Err(MeshError::CountMismatch {
                section: "NPOIN",
                declared: n_point_domain,
                found: n_point,
            });
        }
        if let Some(g) = &desc.global_index {
            if g.len() != n_point {
                return Err(MeshError::CountMismatch {
                    section: "NPOIN",
                    declared: n_point,
                    found: g.len(),
                });
            }
        }

        let conv = config.conversion;
        let points: Vec<Point> = desc
            .coords
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let gi = desc.global_index.as_ref().map_or(i, |g| g[i]);
                let mut p = Point::new([c[0] * conv, c[1] * conv, c[2] * conv], gi);
                p.domain = i < n_point_domain;
                p
            })
            .collect();

        let check_nodes = |nodes: &[usize]| -> Result<(), MeshError> {
            match nodes.iter().find(|&&n| n >= n_point) {
                Some(&node) => Err(MeshError::NodeOutOfRange { node, n_point }),
                None => Ok(()),
            }
        };

        let mut elements = Vec::with_capacity(desc.elements.len());
        for (i, ed) in desc.elements.into_iter().enumerate() {
            if ed.cell_type.dimension() != desc.dim {
                return Err(MeshError::Parse(format!(
                    "element {i}: {:?} in a {}-D mesh",
                    ed.cell_type, desc.dim
                )));
            }
            check_nodes(&ed.nodes)?;
            let mut e = Element::new(ed.cell_type, ed.nodes)?;
            e.global_index = i;
            elements.push(e);
        }

        let mut markers = Vec::with_capacity(desc.markers.len());
        for md in desc.markers {
            let mut m = match md.send_recv {
                Some(code) => {
                    let mut m = Marker::new(md.tag, BoundaryKind::SendReceive);
                    m.send_recv = Some(code);
                    m
                }
                None => {
                    let kind = config.marker_kind(&md.tag);
                    Marker::new(md.tag, kind)
                }
            };
            for bd in md.elements {
                let expected = if m.is_send_receive() { 0 } else { desc.dim - 1 };
                if bd.cell_type.dimension() != expected {
                    return Err(MeshError::Parse(format!(
                        "marker `{}`: {:?} is not a boundary cell of a {}-D mesh",
                        m.tag, bd.cell_type, desc.dim
                    )));
                }
                check_nodes(&bd.nodes)?;
                let mut b = BoundaryElement::new(bd.cell_type, bd.nodes)?;
                b.rotation = bd.rotation;
                m.elements.push(b);
            }
            markers.push(m);
        }

        let periodic = if desc.periodic.is_empty() {
            vec![PeriodicTransform::identity()]
        } else {
            for (k, idx) in desc.periodic.keys().enumerate() {
                if *idx != k {
                    return Err(MeshError::Parse(format!(
                        "periodic transforms must be numbered 0..N, found index {idx}"
                    )));
                }
            }
            desc.periodic.into_values().collect()
        };

        log::info!(
            "ingested {}-D mesh: {} points ({} owned), {} elements, {} markers",
            desc.dim,
            points.len(),
            n_point_domain,
            elements.len(),
            markers.len()
        );

        Ok(Mesh {
            dim: desc.dim,
            points,
            n_point_domain,
            elements,
            edges: Vec::new(),
            markers,
            periodic,
            level: 0,
        })
    }

    /// Run every construction phase after ingestion.
    pub fn preprocess(&mut self) -> Result<(), MeshError> {
        self.set_esup();
        self.set_bound_volume()?;
        self.check_orientation();
        self.set_psup();
        self.set_esue();
        self.set_vertex();
        self.set_cg();
        self.set_edges();
        self.set_control_volume();
        self.set_bound_control_volume();
        self.set_corner_angles();
        self.set_agglomerate_indirect();
        log::debug!(
            "mesh ready: {} points, {} edges, {} boundary vertices",
            self.points.len(),
            self.edges.len(),
            self.markers.iter().map(|m| m.vertices.len()).sum::<usize>()
        );
        Ok(())
    }

    #[inline]
    pub fn n_point(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn coord(&self, p: usize) -> [f64; 3] {
        self.points[p].coord
    }

    /// Coordinates of `nodes`, in order.
    pub fn gather(&self, nodes: &[usize]) -> Vec<[f64; 3]> {
        nodes.iter().map(|&n| self.points[n].coord).collect()
    }

    /// Index of the marker tagged `tag`.
    pub fn marker_index(&self, tag: &str) -> Result<usize, MeshError> {
        self.markers
            .iter()
            .position(|m| m.tag == tag)
            .ok_or_else(|| MeshError::UnknownMarker(tag.to_string()))
    }

    /// Bring every volumetric element to positive orientation and wind
    /// every boundary element so that its normal leaves the domain.
    ///
    /// Boundary elements need `set_bound_volume` to have run; those without
    /// a domain element are left as they are.
    pub fn check_orientation(&mut self) {
        let mut n_fixed = 0usize;
        for i in 0..self.elements.len() {
            let e = &self.elements[i];
            let fixed = fixed_order(e.cell_type, &e.nodes, &self.gather(&e.nodes));
            if fixed != e.nodes {
                n_fixed += 1;
                self.elements[i].nodes = fixed;
            }
        }
        for m in 0..self.markers.len() {
            for b in 0..self.markers[m].elements.len() {
                let be = &self.markers[m].elements[b];
                let Some(de) = be.domain_element else { continue };
                if be.cell_type == CellType::Vertex {
                    continue;
                }
                let interior = centroid(self.gather(&self.elements[de].nodes));
                let fixed =
                    fixed_boundary_order(be.cell_type, &be.nodes, &self.gather(&be.nodes), interior);
                if fixed != be.nodes {
                    n_fixed += 1;
                    self.markers[m].elements[b].nodes = fixed;
                }
            }
        }
        if n_fixed > 0 {
            log::info!("reoriented {n_fixed} elements");
        }
    }

    /// Flag points touching a quadrilateral or hexahedron; only they may
    /// absorb indirect neighbours during agglomeration.
    pub fn set_agglomerate_indirect(&mut self) {
        for p in &mut self.points {
            p.agglomerate_indirect = false;
        }
        for e in &self.elements {
            if e.cell_type.is_structured() {
                for &n in &e.nodes {
                    self.points[n].agglomerate_indirect = true;
                }
            }
        }
    }

    /// Rotate the time history of point volumes and edge normals:
    /// current -> n -> n-1.
    pub fn shift_time_levels(&mut self) {
        for p in &mut self.points {
            p.volume[2] = p.volume[1];
            p.volume[1] = p.volume[0];
        }
        for e in &mut self.edges {
            e.normal_history[1] = e.normal_history[0];
            e.normal_history[0] = e.normal;
        }
    }

    /// Velocity of every point in a frame rotating at `omega` (rad/s per
    /// axis) about `center`.
    pub fn set_rotational_velocity(&mut self, omega: [f64; 3], center: [f64; 3]) {
        for p in &mut self.points {
            p.rotational_velocity = cross(omega, sub(p.coord, center));
        }
    }

    /// Sum of owned control volumes over all ranks.
    pub fn domain_volume<C: Communicator + ?Sized>(&self, comm: &C) -> Result<f64, MeshError> {
        let local: f64 = self.points[..self.n_point_domain]
            .iter()
            .map(Point::volume)
            .sum();
        all_reduce_sum(comm, local)
    }

    /// Check the structural invariants of a fully built mesh.
    pub fn validate_invariants(&self) -> Result<(), MeshError> {
        let n_point = self.points.len();
        for (i, e) in self.elements.iter().enumerate() {
            if e.nodes.len() != e.cell_type.n_nodes() || e.nodes.iter().any(|&n| n >= n_point) {
                return Err(MeshError::Invariant(format!("element {i} has bad connectivity")));
            }
        }
        for (k, edge) in self.edges.iter().enumerate() {
            let [a, b] = edge.nodes;
            if a >= b {
                return Err(MeshError::Invariant(format!("edge {k} is not lower-index first")));
            }
            if self.find_edge(a, b)? != k || self.find_edge(b, a)? != k {
                return Err(MeshError::Invariant(format!("edge {k} is not unique")));
            }
        }
        for (i, p) in self.points.iter().enumerate() {
            if p.points.len() != p.edges.len() {
                return Err(MeshError::Invariant(format!("point {i}: edge table out of sync")));
            }
            for &q in &p.points {
                if !self.points[q].points.contains(&i) {
                    return Err(MeshError::Invariant(format!(
                        "point {i}: neighbour {q} does not list it back"
                    )));
                }
            }
            if !p.elements.is_empty() && p.volume() <= 0.0 {
                return Err(MeshError::Invariant(format!("point {i}: non-positive volume")));
            }
        }
        for m in &self.markers {
            for be in &m.elements {
                if let Some(de) = be.domain_element {
                    let nodes = &self.elements[de].nodes;
                    if !be.nodes.iter().all(|n| nodes.contains(n)) {
                        return Err(MeshError::Invariant(format!(
                            "marker `{}`: boundary element outside its domain element",
                            m.tag
                        )));
                    }
                }
            }
            if !m.is_send_receive() {
                let mut seen: Vec<usize> = m.vertices.iter().map(|v| v.point).collect();
                seen.sort_unstable();
                if seen.windows(2).any(|w| w[0] == w[1]) {
                    return Err(MeshError::Invariant(format!(
                        "marker `{}`: point listed twice",
                        m.tag
                    )));
                }
            }
        }
        Ok(())
    }

    /// Description that reproduces this mesh's points, elements, markers
    /// and transforms (used by the writers).
    pub fn to_description(&self) -> MeshDescription {
        MeshDescription {
            dim: self.dim,
            coords: self.points.iter().map(|p| p.coord).collect(),
            global_index: Some(self.points.iter().map(|p| p.global_index).collect()),
            n_point_domain: Some(self.n_point_domain),
            elements: self
                .elements
                .iter()
                .map(|e| ElementDescription {
                    cell_type: e.cell_type,
                    nodes: e.nodes.clone(),
                })
                .collect(),
            markers: self
                .markers
                .iter()
                .map(|m| MarkerDescription {
                    tag: m.tag.clone(),
                    send_recv: m.send_recv,
                    elements: m
                        .elements
                        .iter()
                        .map(|b| BoundaryDescription {
                            cell_type: b.cell_type,
                            nodes: b.nodes.clone(),
                            rotation: b.rotation,
                        })
                        .collect(),
                })
                .collect(),
            periodic: self.periodic.iter().copied().enumerate().collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Unit square split into two quads, one marker per side.
    pub(crate) fn two_quads() -> MeshDescription {
        let line = |a: usize, b: usize| BoundaryDescription {
            cell_type: CellType::Line,
            nodes: vec![a, b],
            rotation: 0,
        };
        let marker = |tag: &str, lines: Vec<BoundaryDescription>| MarkerDescription {
            tag: tag.into(),
            send_recv: None,
            elements: lines,
        };
        MeshDescription {
            dim: 2,
            coords: vec![
                [0.0, 0.0, 0.0],
                [0.5, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.5, 1.0, 0.0],
                [1.0, 1.0, 0.0],
            ],
            elements: vec![
                ElementDescription {
                    cell_type: CellType::Quadrilateral,
                    nodes: vec![0, 1, 4, 3],
                },
                // Clockwise on purpose.
                ElementDescription {
                    cell_type: CellType::Quadrilateral,
                    nodes: vec![1, 4, 5, 2],
                },
            ],
            markers: vec![
                marker("lower", vec![line(0, 1), line(1, 2)]),
                marker("right", vec![line(2, 5)]),
                marker("upper", vec![line(5, 4), line(4, 3)]),
                marker("left", vec![line(3, 0)]),
            ],
            ..Default::default()
        }
    }

    /// `n` x `n` quads on the unit square, markers as in [`two_quads`].
    /// Point `(i, j)` has index `j * (n + 1) + i`.
    pub(crate) fn unit_grid(n: usize) -> MeshDescription {
        let id = |i: usize, j: usize| j * (n + 1) + i;
        let h = 1.0 / n as f64;
        let mut coords = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                coords.push([i as f64 * h, j as f64 * h, 0.0]);
            }
        }
        let mut elements = Vec::new();
        for j in 0..n {
            for i in 0..n {
                elements.push(ElementDescription {
                    cell_type: CellType::Quadrilateral,
                    nodes: vec![id(i, j), id(i + 1, j), id(i + 1, j + 1), id(i, j + 1)],
                });
            }
        }
        let side = |tag: &str, f: &dyn Fn(usize) -> (usize, usize)| MarkerDescription {
            tag: tag.into(),
            send_recv: None,
            elements: (0..n)
                .map(|k| {
                    let (a, b) = f(k);
                    BoundaryDescription {
                        cell_type: CellType::Line,
                        nodes: vec![a, b],
                        rotation: 0,
                    }
                })
                .collect(),
        };
        MeshDescription {
            dim: 2,
            coords,
            elements,
            markers: vec![
                side("lower", &|k| (id(k, 0), id(k + 1, 0))),
                side("right", &|k| (id(n, k), id(n, k + 1))),
                side("upper", &|k| (id(k + 1, n), id(k, n))),
                side("left", &|k| (id(0, k + 1), id(0, k))),
            ],
            ..Default::default()
        }
    }

    /// Unit cube as one hexahedron, all six faces on marker "skin".
    pub(crate) fn unit_cube() -> MeshDescription {
        let coords = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 1.0],
            [0.0, 1.0, 1.0],
        ];
        let faces = CellType::Hexahedron
            .faces()
            .iter()
            .map(|f| BoundaryDescription {
                cell_type: CellType::Quadrilateral,
                nodes: f.to_vec(),
                rotation: 0,
            })
            .collect();
        MeshDescription {
            dim: 3,
            coords,
            elements: vec![ElementDescription {
                cell_type: CellType::Hexahedron,
                nodes: (0..8).collect(),
            }],
            markers: vec![MarkerDescription {
                tag: "skin".into(),
                send_recv: None,
                elements: faces,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn ingestion_rejects_bad_input() {
        let mut d = two_quads();
        d.dim = 4;
        assert!(matches!(
            Mesh::from_description(d, &MeshConfig::default()),
            Err(MeshError::InvalidDimension(4))
        ));
        let mut d = two_quads();
        d.elements[0].nodes[2] = 17;
        assert!(matches!(
            Mesh::from_description(d, &MeshConfig::default()),
            Err(MeshError::NodeOutOfRange { node: 17, n_point: 6 })
        ));
        let mut d = two_quads();
        d.n_point_domain = Some(9);
        assert!(matches!(
            Mesh::from_description(d, &MeshConfig::default()),
            Err(MeshError::CountMismatch { .. })
        ));
    }

    #[test]
    fn missing_transforms_become_identity() {
        let m = Mesh::from_description(two_quads(), &MeshConfig::default()).unwrap();
        assert_eq!(m.periodic, vec![PeriodicTransform::identity()]);
    }

    #[test]
    fn conversion_scales_coordinates() {
        let cfg = MeshConfig {
            conversion: 2.0,
            ..Default::default()
        };
        let m = Mesh::from_description(two_quads(), &cfg).unwrap();
        assert_eq!(m.coord(5), [2.0, 2.0, 0.0]);
    }

    #[test]
    fn orientation_fixes_the_clockwise_quad() {
        let m = Mesh::build(two_quads(), &MeshConfig::default()).unwrap();
        assert_eq!(m.elements[0].nodes, vec![0, 1, 4, 3]);
        assert_eq!(m.elements[1].nodes, vec![1, 2, 5, 4]);
        m.validate_invariants().unwrap();
    }

    #[test]
    fn time_levels_shift() {
        let mut m = Mesh::build(two_quads(), &MeshConfig::default()).unwrap();
        let v0 = m.points[0].volume();
        let n0 = m.edges[0].normal;
        m.shift_time_levels();
        assert_eq!(m.edges[0].normal_history, [n0, [0.0; 3]]);
        m.points[0].volume[0] = 7.0;
        m.edges[0].normal = [1.0, 2.0, 0.0];
        m.shift_time_levels();
        assert_eq!(m.points[0].volume, [7.0, 7.0, v0]);
        assert_eq!(m.edges[0].normal_history, [[1.0, 2.0, 0.0], n0]);
    }

    #[test]
    fn rotating_frame_velocity() {
        let mut m = Mesh::build(two_quads(), &MeshConfig::default()).unwrap();
        m.set_rotational_velocity([0.0, 0.0, 2.0], [0.0, 0.0, 0.0]);
        // Point 2 sits at (1, 0): velocity 2 along +y.
        assert_eq!(m.points[2].rotational_velocity, [0.0, 2.0, 0.0]);
        assert_eq!(m.points[0].rotational_velocity, [0.0; 3]);
    }

    #[test]
    fn quads_divide_into_triangles() {
        let mut d = two_quads();
        d.divide_simplices();
        assert_eq!(d.elements.len(), 4);
        let m = Mesh::build(d, &MeshConfig::default()).unwrap();
        let total: f64 = m.points.iter().map(Point::volume).sum();
        assert!((total - 1.0).abs() < 1e-12);
        assert!(m.points.iter().all(|p| !p.agglomerate_indirect));
    }

    #[test]
    fn cube_divides_into_tetrahedra() {
        let mut d = unit_cube();
        d.divide_simplices();
        assert_eq!(d.elements.len(), 6);
        assert!(d.elements.iter().all(|e| e.cell_type == CellType::Tetrahedron));
        assert_eq!(d.markers[0].elements.len(), 12);
        assert!(d.markers[0].elements.iter().all(|b| b.cell_type == CellType::Triangle));

        let m = Mesh::build(d, &MeshConfig::default()).unwrap();
        let total: f64 = m.points.iter().map(Point::volume).sum();
        assert!((total - 1.0).abs() < 1e-12);
        // Every boundary vertex normal still closes the cube.
        let mut sum = [0.0; 3];
        for v in &m.markers[0].vertices {
            for k in 0..3 {
                sum[k] += v.normal[k];
            }
        }
        assert!(sum.iter().all(|x| x.abs() < 1e-12));
        // The three face diagonals through point 0 and the body diagonal.
        for q in [2, 5, 6, 7] {
            assert!(m.find_edge(0, q).is_ok(), "0-{q}");
        }
    }

    #[test]
    fn snapshot_round_trips_through_serde() {
        let m = Mesh::build(two_quads(), &MeshConfig::default()).unwrap();
        let bytes = bincode::serialize(&m).unwrap();
        let back: Mesh = bincode::deserialize(&bytes).unwrap();
        assert_eq!(back, m);
    }
}

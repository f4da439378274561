//! Coarse-level geometry from a fine level and its agglomeration.

use super::agglomeration::Agglomeration;
use crate::geometry::{add, centroid, scale};
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use crate::topology::{Edge, Marker, Point, Vertex};
use hashbrown::HashMap;
use std::collections::BTreeMap;

/// Build the coarse mesh and record the parents on the fine points.
///
/// - volume: sum of the children's volumes (all three time levels);
/// - coordinates: volume-weighted mean of the children;
/// - edge normals: every fine edge joining two agglomerates adds its normal
///   once, flipped when the lower fine point has the higher parent;
/// - vertex normals: children on the same marker sum into one coarse
///   vertex per `(parent, rotation)`.
pub(crate) fn restrict(fine: &mut Mesh, agg: &Agglomeration) -> Result<Mesh, MeshError> {
    let n_marker = fine.markers.len();
    let parent = |p: usize| {
        agg.parent[p]
            .ok_or_else(|| MeshError::Invariant(format!("fine point {p} has no parent")))
    };

    let mut points = Vec::with_capacity(agg.n_coarse());
    for (c, kids) in agg.children.iter().enumerate() {
        let mut volume = [0.0; 3];
        let mut weighted = [0.0; 3];
        let mut wall = f64::MAX;
        for &f in kids {
            let p = &fine.points[f];
            for (acc, v) in volume.iter_mut().zip(p.volume) {
                *acc += v;
            }
            weighted = add(weighted, scale(p.coord, p.volume()));
            wall = wall.min(p.wall_distance);
        }
        let coord = if volume[0] > 0.0 {
            scale(weighted, 1.0 / volume[0])
        } else {
            centroid(kids.iter().map(|&f| fine.points[f].coord))
        };
        let mut p = Point::new(coord, c);
        p.volume = volume;
        p.domain = c < agg.n_domain;
        p.color = agg.color[c];
        p.children = kids.clone();
        p.agglomerate_indirect = agg.indirect[c];
        p.wall_distance = wall;
        p.vertex = vec![None; n_marker];
        points.push(p);
    }

    let mut faces: BTreeMap<(usize, usize), [f64; 3]> = BTreeMap::new();
    for e in &fine.edges {
        let [a, b] = e.nodes;
        let (ca, cb) = (parent(a)?, parent(b)?);
        if ca == cb {
            continue;
        }
        let n = if ca < cb { e.normal } else { scale(e.normal, -1.0) };
        let acc = faces.entry((ca.min(cb), ca.max(cb))).or_insert([0.0; 3]);
        *acc = add(*acc, n);
    }
    let mut edges = Vec::with_capacity(faces.len());
    for ((a, b), normal) in faces {
        let k = edges.len();
        let mut e = Edge::new(a, b);
        e.normal = normal;
        e.cg = scale(add(points[a].coord, points[b].coord), 0.5);
        edges.push(e);
        // Keys arrive sorted, so both lists stay sorted.
        points[a].points.push(b);
        points[a].edges.push(k);
        points[b].points.push(a);
        points[b].edges.push(k);
    }

    let mut markers = Vec::with_capacity(n_marker);
    for (im, m) in fine.markers.iter().enumerate() {
        let mut cm = Marker::new(m.tag.clone(), m.kind);
        cm.send_recv = m.send_recv;
        let mut slot: HashMap<(usize, usize), usize> = HashMap::new();
        for v in &m.vertices {
            let c = parent(v.point)?;
            let k = *slot.entry((c, v.rotation)).or_insert_with(|| {
                let mut cv = Vertex::new(c);
                cv.rotation = v.rotation;
                cm.vertices.push(cv);
                cm.vertices.len() - 1
            });
            cm.vertices[k].add_normal(v.normal);
            let cp = &mut points[c];
            if cp.vertex[im].is_none() {
                cp.vertex[im] = Some(k);
            }
            cp.boundary = true;
            if !m.is_send_receive() {
                cp.physical_boundary = true;
            }
        }
        markers.push(cm);
    }

    for (f, p) in fine.points.iter_mut().enumerate() {
        p.parent = agg.parent[f];
        p.agglomerated = p.parent.is_some();
    }

    Ok(Mesh {
        dim: fine.dim,
        points,
        n_point_domain: agg.n_domain,
        elements: Vec::new(),
        edges,
        markers,
        periodic: fine.periodic.clone(),
        level: fine.level + 1,
    })
}

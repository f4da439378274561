//! Structural periodic layer.
//!
//! For a pair `(marker, donor, T)` every vertex `p` of `marker` is matched to
//! the donor-marker vertex closest to `T(p)`. The elements touching `marker`
//! are then replicated through `T`: their `marker` nodes land on the matched
//! donors, every other node gets a new image point. The images are appended
//! after all original points and are never owned; a send marker (originals)
//! followed by a receive marker (images) records which original feeds which
//! image and under which transform index.

use crate::config::{MeshConfig, PeriodicPair};
use crate::geometry::distance;
use crate::mesh::{BoundaryDescription, ElementDescription, MarkerDescription, Mesh};
use crate::mesh_error::MeshError;
use crate::topology::marker::SEND_RECEIVE_TAG;
use crate::topology::{CellType, DonorPoint};
use hashbrown::{HashMap, HashSet};

#[derive(Clone, Debug)]
pub struct PeriodicGeometry {
    pub mesh: Mesh,
    /// Image points created by the replication, in creation order.
    pub new_points: Vec<usize>,
    /// Replicated elements.
    pub new_elements: Vec<usize>,
}

/// Matched donors of one pair: `(marker point, donor point)`.
type Matches = Vec<(usize, usize)>;

impl PeriodicGeometry {
    pub fn build(mesh: &Mesh, config: &MeshConfig) -> Result<Self, MeshError> {
        let mut desc = mesh.to_description();
        let first_transform = mesh.periodic.len();

        let periodic_tags: HashSet<&str> = config
            .periodic
            .iter()
            .flat_map(|p| [p.marker.as_str(), p.donor.as_str()])
            .collect();

        let mut all_matches = Vec::with_capacity(config.periodic.len());
        let mut new_points = Vec::new();
        let mut new_elements = Vec::new();

        for (ip, pair) in config.periodic.iter().enumerate() {
            let rotation = first_transform + ip;
            let matches = match_pair(mesh, pair, config.tolerances.periodic)?;
            let to_donor: HashMap<usize, usize> = matches.iter().copied().collect();

            // Image of every node of every element touching the marker.
            let mut image: HashMap<usize, usize> = HashMap::new();
            let mut originals = Vec::new();
            let touching: Vec<usize> = {
                let mut v: Vec<usize> = matches
                    .iter()
                    .flat_map(|&(p, _)| mesh.points[p].elements.iter().copied())
                    .collect();
                v.sort_unstable();
                v.dedup();
                v
            };
            for &ie in &touching {
                let e = &mesh.elements[ie];
                let mut nodes = Vec::with_capacity(e.nodes.len());
                for &n in &e.nodes {
                    let mapped = match to_donor.get(&n) {
                        Some(&d) => d,
                        None => *image.entry(n).or_insert_with(|| {
                            let q = desc.coords.len();
                            desc.coords.push(pair.transform.apply(mesh.coord(n)));
                            if let Some(g) = desc.global_index.as_mut() {
                                g.push(q);
                            }
                            originals.push(n);
                            new_points.push(q);
                            q
                        }),
                    };
                    nodes.push(mapped);
                }
                new_elements.push(desc.elements.len());
                desc.elements.push(ElementDescription {
                    cell_type: e.cell_type,
                    nodes,
                });
            }

            // Physical boundary pieces carried along with the replicated
            // elements.
            let mapped = |n: usize| to_donor.get(&n).or_else(|| image.get(&n)).copied();
            for (m, md) in mesh.markers.iter().zip(desc.markers.iter_mut()) {
                if m.is_send_receive() || periodic_tags.contains(m.tag.as_str()) {
                    continue;
                }
                for be in &m.elements {
                    // Must touch an image, otherwise it is the original face.
                    if !be.nodes.iter().any(|n| image.contains_key(n)) {
                        continue;
                    }
                    if let Some(nodes) = be.nodes.iter().map(|&n| mapped(n)).collect::<Option<Vec<_>>>() {
                        md.elements.push(BoundaryDescription {
                            cell_type: be.cell_type,
                            nodes,
                            rotation: 0,
                        });
                    }
                }
            }

            let halo = |n: usize| BoundaryDescription {
                cell_type: CellType::Vertex,
                nodes: vec![n],
                rotation,
            };
            desc.markers.push(MarkerDescription {
                tag: SEND_RECEIVE_TAG.to_string(),
                send_recv: Some(1),
                elements: originals.iter().map(|&n| halo(n)).collect(),
            });
            desc.markers.push(MarkerDescription {
                tag: SEND_RECEIVE_TAG.to_string(),
                send_recv: Some(-1),
                elements: originals.iter().map(|n| halo(image[n])).collect(),
            });
            desc.periodic.insert(rotation, pair.transform);
            log::info!(
                "periodic pair `{}` -> `{}`: {} matched vertices, {} images, {} elements",
                pair.marker,
                pair.donor,
                matches.len(),
                originals.len(),
                touching.len()
            );
            all_matches.push((rotation, matches));
        }

        desc.n_point_domain = Some(mesh.n_point_domain);
        let local_config = MeshConfig {
            conversion: 1.0,
            ..config.clone()
        };
        let mut out = Mesh::from_description(desc, &local_config)?;
        for (m, old) in out.markers.iter_mut().zip(&mesh.markers) {
            m.kind = old.kind;
        }
        for (p, old) in out.points.iter_mut().zip(&mesh.points) {
            p.color = old.color;
        }
        out.preprocess()?;

        for (pair, (rotation, matches)) in config.periodic.iter().zip(all_matches) {
            let im = out.marker_index(&pair.marker)?;
            for (p, d) in matches {
                if let Some(iv) = out.points[p].vertex_on(im) {
                    let domain = out.points[d].color;
                    let v = &mut out.markers[im].vertices[iv];
                    v.donor = Some(DonorPoint { point: d, domain });
                    v.rotation = rotation;
                }
            }
        }

        Ok(PeriodicGeometry {
            mesh: out,
            new_points,
            new_elements,
        })
    }
}

/// Nearest donor vertex of every `pair.marker` vertex, after mapping the
/// marker vertex through the pair's transform.
fn match_pair(mesh: &Mesh, pair: &PeriodicPair, tol: f64) -> Result<Matches, MeshError> {
    let im = mesh.marker_index(&pair.marker)?;
    let id = mesh.marker_index(&pair.donor)?;
    let donors: Vec<usize> = mesh.markers[id].vertices.iter().map(|v| v.point).collect();
    if donors.is_empty() {
        return Err(MeshError::InvalidConfig(format!(
            "periodic donor marker `{}` has no vertices",
            pair.donor
        )));
    }
    let mut out = Vec::with_capacity(mesh.markers[im].vertices.len());
    let mut worst = 0.0f64;
    for v in &mesh.markers[im].vertices {
        let x = pair.transform.apply(mesh.coord(v.point));
        let (mut best, mut best_d) = (donors[0], f64::MAX);
        for &q in &donors {
            let d = distance(x, mesh.coord(q));
            if d < best_d {
                best = q;
                best_d = d;
            }
        }
        worst = worst.max(best_d);
        out.push((v.point, best));
    }
    if worst > tol {
        log::warn!(
            "periodic pair `{}` -> `{}`: worst match distance {worst:e} exceeds {tol:e}",
            pair.marker,
            pair.donor
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::send_receive::SendReceive;
    use crate::mesh::tests::two_quads;
    use crate::topology::{BoundaryKind, PeriodicTransform};

    fn config() -> MeshConfig {
        let mut c = MeshConfig::default()
            .with_marker("right", BoundaryKind::Periodic)
            .with_marker("left", BoundaryKind::Periodic);
        c.periodic.push(PeriodicPair {
            marker: "right".into(),
            donor: "left".into(),
            transform: PeriodicTransform {
                translation: [-1.0, 0.0, 0.0],
                ..Default::default()
            },
        });
        c
    }

    #[test]
    fn right_column_is_replicated_left_of_the_strip() {
        let cfg = config();
        let global = Mesh::build(two_quads(), &cfg).unwrap();
        let pg = PeriodicGeometry::build(&global, &cfg).unwrap();
        let m = &pg.mesh;

        assert_eq!(pg.new_points, vec![6, 7]);
        assert_eq!(pg.new_elements, vec![2]);
        assert_eq!(m.coord(6), [-0.5, 0.0, 0.0]);
        assert_eq!(m.coord(7), [-0.5, 1.0, 0.0]);
        assert_eq!(m.n_point_domain, 6);
        assert!(!m.points[6].domain);
        assert_eq!(m.periodic.len(), 2);
        m.validate_invariants().unwrap();

        // The donor side now sees a full control volume.
        assert!((m.points[0].volume() - 0.25).abs() < 1e-12);

        let right = m.marker_index("right").unwrap();
        let donors: Vec<(usize, usize, usize)> = m.markers[right]
            .vertices
            .iter()
            .map(|v| (v.point, v.donor.unwrap().point, v.rotation))
            .collect();
        assert_eq!(donors, vec![(2, 0, 1), (5, 3, 1)]);

        // lower gained the image of 1-2, upper the image of 5-4.
        let lower = m.marker_index("lower").unwrap();
        assert_eq!(m.markers[lower].elements.len(), 3);
        let upper = m.marker_index("upper").unwrap();
        assert_eq!(m.markers[upper].elements.len(), 3);

        let sr = SendReceive::build(m, &vec![0; m.n_point()]).unwrap();
        let entries: Vec<(usize, usize, usize)> = sr
            .get(0, 0)
            .iter()
            .map(|e| (e.donor, e.receiver, e.rotation))
            .collect();
        assert_eq!(entries, vec![(1, 6, 1), (4, 7, 1)]);
    }

    #[test]
    fn unknown_marker_is_an_error() {
        let mut cfg = config();
        cfg.periodic[0].donor = "nowhere".into();
        let global = Mesh::build(two_quads(), &cfg).unwrap();
        assert!(matches!(
            PeriodicGeometry::build(&global, &cfg),
            Err(MeshError::UnknownMarker(_))
        ));
    }
}

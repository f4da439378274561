//! Halo exchange lists of a colored global mesh.
//!
//! For every ordered pair of domains `(src, dst)` the list names the points
//! `src` sends to `dst`. A pure halo entry sends point `i` as itself
//! (`donor == receiver`, rotation 0). A periodic entry sends donor `k` to
//! the periodic copy `p'` with the rotation tag of its transform. Lists are
//! sorted and deduplicated, so sender and receiver walk them in the same
//! order.

use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SendEntry {
    /// Global index of the point whose data is sent.
    pub donor: usize,
    /// Global index of the point that receives it.
    pub receiver: usize,
    /// Periodic transform index, 0 for plain halo entries.
    pub rotation: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SendReceive {
    pub lists: BTreeMap<(usize, usize), Vec<SendEntry>>,
}

impl SendReceive {
    /// Lists for every domain pair of `mesh` under `colors`.
    ///
    /// Periodic pairs are read from the send/receive markers a periodic
    /// replication left on the global mesh: the k-th entry of a send marker
    /// pairs with the k-th entry of the receive marker that follows it.
    pub fn build(mesh: &Mesh, colors: &[usize]) -> Result<Self, MeshError> {
        if colors.len() != mesh.n_point() {
            return Err(MeshError::Partition(format!(
                "{} colors for {} points",
                colors.len(),
                mesh.n_point()
            )));
        }
        let mut sets: BTreeMap<(usize, usize), BTreeSet<SendEntry>> = BTreeMap::new();

        for e in &mesh.elements {
            let present: BTreeSet<usize> = e
                .nodes
                .iter()
                .filter(|&&n| mesh.points[n].domain)
                .map(|&n| colors[n])
                .collect();
            if present.len() < 2 {
                continue;
            }
            for &n in &e.nodes {
                if !mesh.points[n].domain {
                    continue;
                }
                for &d in &present {
                    if d != colors[n] {
                        sets.entry((colors[n], d)).or_default().insert(SendEntry {
                            donor: n,
                            receiver: n,
                            rotation: 0,
                        });
                    }
                }
            }
        }

        for (donor, receiver, rotation) in periodic_pairs(mesh)? {
            // Every domain that sees the copy as a ghost needs the donor.
            let mut holders = BTreeSet::new();
            for &ie in &mesh.points[receiver].elements {
                for &n in &mesh.elements[ie].nodes {
                    if mesh.points[n].domain {
                        holders.insert(colors[n]);
                    }
                }
            }
            for d in holders {
                sets.entry((colors[donor], d)).or_default().insert(SendEntry {
                    donor,
                    receiver,
                    rotation,
                });
            }
        }

        let lists: BTreeMap<_, Vec<_>> = sets
            .into_iter()
            .map(|(k, s)| (k, s.into_iter().collect()))
            .collect();
        log::debug!(
            "send/receive: {} domain pairs, {} entries",
            lists.len(),
            lists.values().map(Vec::len).sum::<usize>()
        );
        Ok(SendReceive { lists })
    }

    /// Entries `src` sends to `dst` (empty when they share nothing).
    pub fn get(&self, src: usize, dst: usize) -> &[SendEntry] {
        self.lists
            .get(&(src, dst))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Only the rows sent by `src`.
    pub fn rows_from(&self, src: usize) -> SendReceive {
        SendReceive {
            lists: self
                .lists
                .iter()
                .filter(|((s, _), _)| *s == src)
                .map(|(k, v)| (*k, v.clone()))
                .collect(),
        }
    }
}

/// `(donor, copy, rotation)` triples of the send/receive markers on a
/// serial mesh.
fn periodic_pairs(mesh: &Mesh) -> Result<Vec<(usize, usize, usize)>, MeshError> {
    let mut out = Vec::new();
    let mut pending: Option<usize> = None;
    for (im, m) in mesh.markers.iter().enumerate() {
        if m.send_to().is_some() {
            pending = Some(im);
        } else if m.receive_from().is_some() {
            let Some(is) = pending.take() else {
                return Err(MeshError::Invariant(format!(
                    "receive marker {im} without a preceding send marker"
                )));
            };
            let (send, recv) = (&mesh.markers[is], m);
            if send.elements.len() != recv.elements.len() {
                return Err(MeshError::CountMismatch {
                    section: "SEND_RECEIVE",
                    declared: send.elements.len(),
                    found: recv.elements.len(),
                });
            }
            for (s, r) in send.elements.iter().zip(&recv.elements) {
                out.push((s.nodes[0], r.nodes[0], s.rotation));
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MeshConfig;
    use crate::mesh::tests::two_quads;

    #[test]
    fn shared_column_is_exchanged_both_ways() {
        let m = Mesh::build(two_quads(), &MeshConfig::default()).unwrap();
        // Left column 0, right column 1, middle column with the left.
        let colors = vec![0, 0, 1, 0, 0, 1];
        let sr = SendReceive::build(&m, &colors).unwrap();
        let from0: Vec<usize> = sr.get(0, 1).iter().map(|e| e.donor).collect();
        let from1: Vec<usize> = sr.get(1, 0).iter().map(|e| e.donor).collect();
        assert_eq!(from0, vec![1, 4]);
        assert_eq!(from1, vec![2, 5]);
        assert!(sr.get(0, 0).is_empty());
        assert!(sr.get(0, 1).iter().all(|e| e.rotation == 0 && e.donor == e.receiver));
        assert_eq!(sr.rows_from(1).lists.len(), 1);
    }
}

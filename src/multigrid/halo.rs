//! Halo reconciliation of an agglomeration.
//!
//! Every send marker ships one record per vertex: the fine point, the
//! coarse point that absorbed it, and how many earlier records to the same
//! partner named that fine point (periodic images send a point once per
//! rotation). The receiver walks its receive markers from the same partner
//! in the same order, so the k-th record belongs to its k-th vertex; a
//! repeat count out of step or a repeated point with a different parent
//! means the two sides disagree on the marker layout. Distinct `(partner, parent, rotation)` triples become new
//! coarse points, numbered in sorted order after the owned block; the
//! receiving fine points are moved under them. A ghost agglomerate thus
//! mirrors the donor agglomerate exactly.

use super::agglomeration::Agglomeration;
use crate::algs::collective::{exchange, TAG_MULTIGRID};
use crate::algs::communicator::Communicator;
use crate::algs::wire::{decode, encode, WireAgglomeration};
use crate::mesh::Mesh;
use crate::mesh_error::MeshError;
use hashbrown::{HashMap, HashSet};
use std::collections::{BTreeMap, BTreeSet};

/// Collective.
pub(crate) fn reconcile<C: Communicator + ?Sized>(
    fine: &Mesh,
    agg: &mut Agglomeration,
    comm: &C,
) -> Result<(), MeshError> {
    let mut records: BTreeMap<usize, Vec<WireAgglomeration>> = BTreeMap::new();
    let mut seen: HashMap<(usize, usize), usize> = HashMap::new();
    let mut incoming = BTreeSet::new();
    for m in &fine.markers {
        if let Some(dst) = m.send_to() {
            let out = records.entry(dst).or_default();
            for v in &m.vertices {
                let parent = agg.parent[v.point].ok_or_else(|| {
                    MeshError::Invariant(format!("send point {} was not agglomerated", v.point))
                })?;
                let repeat = seen.entry((dst, v.point)).or_insert(0);
                out.push(WireAgglomeration::new(v.point, parent, *repeat));
                *repeat += 1;
            }
        }
        if let Some(src) = m.receive_from() {
            incoming.insert(src);
        }
    }
    let outgoing: BTreeMap<usize, Vec<u8>> =
        records.iter().map(|(&d, r)| (d, encode(r))).collect();
    let received = exchange(comm, TAG_MULTIGRID, &outgoing, &incoming)?;

    let mut decoded = BTreeMap::new();
    for (src, buf) in received {
        decoded.insert(src, decode::<WireAgglomeration>(&buf)?);
    }

    // (fine receiver, (partner, remote parent, rotation)), first claim wins.
    let mut claims = Vec::new();
    let mut claimed = HashSet::new();
    let mut cursor: BTreeMap<usize, usize> = BTreeMap::new();
    let mut sequence = Sequence::default();
    for m in &fine.markers {
        let Some(src) = m.receive_from() else {
            continue;
        };
        let recs = decoded
            .get(&src)
            .ok_or_else(|| MeshError::Transport(format!("no agglomeration data from {src}")))?;
        let at = cursor.entry(src).or_insert(0);
        for v in &m.vertices {
            let rec = recs.get(*at).ok_or(MeshError::CountMismatch {
                section: "multigrid halo",
                declared: recs.len(),
                found: *at + 1,
            })?;
            *at += 1;
            let parent = sequence.admit(src, rec)?;
            if claimed.insert(v.point) {
                claims.push((v.point, (src, parent, v.rotation)));
            }
        }
    }
    for (src, recs) in &decoded {
        let used = cursor.get(src).copied().unwrap_or(0);
        if used != recs.len() {
            return Err(MeshError::CountMismatch {
                section: "multigrid halo",
                declared: recs.len(),
                found: used,
            });
        }
    }

    let keys: BTreeSet<(usize, usize, usize)> = claims.iter().map(|&(_, k)| k).collect();
    let first = agg.n_coarse();
    let index: HashMap<(usize, usize, usize), usize> =
        keys.iter().enumerate().map(|(i, &k)| (k, first + i)).collect();
    for &(partner, _, _) in &keys {
        agg.children.push(Vec::new());
        agg.indirect.push(false);
        agg.color.push(partner);
    }
    for (f, key) in claims {
        let c = index[&key];
        if let Some(old) = agg.parent[f] {
            agg.children[old].retain(|&x| x != f);
        }
        agg.absorb(c, f);
    }

    // Ghosts nobody sends stay on their own.
    for p in 0..fine.n_point() {
        if agg.parent[p].is_none() {
            agg.create(p, false, fine.points[p].color);
        }
    }
    agg.compact();
    log::debug!(
        "multigrid halo: {} owned + {} mirrored coarse points",
        agg.n_domain,
        agg.n_coarse() - agg.n_domain
    );
    Ok(())
}

/// Per-partner bookkeeping of repeated remote points.
#[derive(Default)]
struct Sequence {
    // (partner, remote point) -> (records so far, parent of the first)
    seen: HashMap<(usize, usize), (usize, usize)>,
}

impl Sequence {
    /// Check `rec` against the earlier records from `src` and return its
    /// remote parent.
    fn admit(&mut self, src: usize, rec: &WireAgglomeration) -> Result<usize, MeshError> {
        let (child, parent, repeat) = rec.decode();
        let (count, first) = self.seen.entry((src, child)).or_insert((0, parent));
        if repeat != *count {
            return Err(MeshError::Invariant(format!(
                "rank {src} sent point {child} as repeat {repeat}, expected {count}"
            )));
        }
        if parent != *first {
            return Err(MeshError::Invariant(format!(
                "rank {src} sent point {child} with parents {first} and {parent}"
            )));
        }
        *count += 1;
        Ok(parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algs::communicator::LocalComm;
    use crate::config::MeshConfig;
    use crate::mesh::tests::two_quads;
    use crate::mesh::{BoundaryDescription, MarkerDescription};
    use crate::topology::CellType;

    fn halo(n: usize, rotation: usize) -> BoundaryDescription {
        BoundaryDescription {
            cell_type: CellType::Vertex,
            nodes: vec![n],
            rotation,
        }
    }

    /// Two quads where the right column mirrors the middle one through a
    /// send/receive pair to self.
    fn mirrored() -> Mesh {
        mirrored_with(Vec::new())
    }

    /// As [`mirrored`], with extra send/receive pairs to self.
    fn mirrored_with(extra: Vec<MarkerDescription>) -> Mesh {
        let mut d = two_quads();
        let halo = |n: usize| halo(n, 1);
        d.markers.push(MarkerDescription {
            tag: "SEND_RECEIVE".into(),
            send_recv: Some(1),
            elements: vec![halo(1), halo(4)],
        });
        d.markers.push(MarkerDescription {
            tag: "SEND_RECEIVE".into(),
            send_recv: Some(-1),
            elements: vec![halo(2), halo(5)],
        });
        d.markers.extend(extra);
        let mut m = Mesh::build(d, &MeshConfig::default()).unwrap();
        for p in [2, 5] {
            m.points[p].domain = false;
        }
        m.n_point_domain = 4;
        m
    }

    // 1 and 4 share a parent, 0 and 3 do not.
    fn owned_groups() -> Agglomeration {
        let mut agg = Agglomeration {
            parent: vec![None; 6],
            ..Default::default()
        };
        let a = agg.create(0, false, 0);
        let b = agg.create(1, false, 0);
        agg.absorb(b, 4);
        let c = agg.create(3, false, 0);
        agg.n_domain = 3;
        assert_eq!((a, b, c), (0, 1, 2));
        agg
    }

    #[test]
    fn receivers_mirror_their_donors() {
        let m = mirrored();
        let mut agg = owned_groups();
        reconcile(&m, &mut agg, &LocalComm::serial()).unwrap();
        assert_eq!(agg.n_coarse(), 4);
        assert_eq!(agg.n_domain, 3);
        // 2 and 5 mirror 1 and 4 into one ghost agglomerate.
        assert_eq!(agg.parent[2], Some(3));
        assert_eq!(agg.parent[5], Some(3));
        assert_eq!(agg.children[3], vec![2, 5]);
    }

    #[test]
    fn repeated_sends_fold_into_one_ghost() {
        // A second image of point 1 under another rotation.
        let m = mirrored_with(vec![
            MarkerDescription {
                tag: "SEND_RECEIVE".into(),
                send_recv: Some(1),
                elements: vec![halo(1, 2)],
            },
            MarkerDescription {
                tag: "SEND_RECEIVE".into(),
                send_recv: Some(-1),
                elements: vec![halo(2, 2)],
            },
        ]);
        let mut agg = owned_groups();
        reconcile(&m, &mut agg, &LocalComm::serial()).unwrap();
        // The first image claims point 2; the repeat adds no ghost.
        assert_eq!(agg.n_coarse(), 4);
        assert_eq!(agg.children[3], vec![2, 5]);
    }

    #[test]
    fn out_of_step_repeats_are_rejected() {
        let mut seq = Sequence::default();
        assert_eq!(seq.admit(0, &WireAgglomeration::new(7, 3, 0)).unwrap(), 3);
        assert_eq!(seq.admit(0, &WireAgglomeration::new(7, 3, 1)).unwrap(), 3);
        // Another partner counts on its own.
        assert_eq!(seq.admit(1, &WireAgglomeration::new(7, 5, 0)).unwrap(), 5);
        assert!(matches!(
            seq.admit(0, &WireAgglomeration::new(7, 3, 3)),
            Err(MeshError::Invariant(_))
        ));
        assert!(matches!(
            seq.admit(0, &WireAgglomeration::new(7, 4, 2)),
            Err(MeshError::Invariant(_))
        ));
    }
}

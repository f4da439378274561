//! Per-domain sub-mesh extraction.
//!
//! Domain `d` keeps every element touching an owned point of color `d`.
//! Owned points come first, then ghosts, each group in ascending global
//! order. Physical markers keep the boundary elements that have an owned
//! node of color `d` and are dropped when nothing is left. Send and receive
//! markers are then appended per partner domain, built from the halo lists,
//! with the periodic rotation tag on every entry.

use super::collective::{exchange, TAG_SEND_LISTS};
use super::communicator::Communicator;
use super::send_receive::{SendEntry, SendReceive};
use super::wire::{decode, encode, WireSendEntry};
use crate::config::MeshConfig;
use crate::mesh::{
    BoundaryDescription, ElementDescription, MarkerDescription, Mesh, MeshDescription,
};
use crate::mesh_error::MeshError;
use crate::topology::CellType;
use hashbrown::HashMap;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug)]
pub struct DomainGeometry {
    pub domain: usize,
    pub mesh: Mesh,
    /// Global index of every local point.
    pub local_to_global: Vec<usize>,
}

impl DomainGeometry {
    /// Single-process extraction: every list is read directly.
    pub fn extract(
        global: &Mesh,
        colors: &[usize],
        lists: &SendReceive,
        domain: usize,
        config: &MeshConfig,
    ) -> Result<Self, MeshError> {
        let sends: BTreeMap<usize, Vec<SendEntry>> = lists
            .lists
            .iter()
            .filter(|((s, _), _)| *s == domain)
            .map(|((_, d), v)| (*d, v.clone()))
            .collect();
        let recvs: BTreeMap<usize, Vec<SendEntry>> = lists
            .lists
            .iter()
            .filter(|((_, d), _)| *d == domain)
            .map(|((s, _), v)| (*s, v.clone()))
            .collect();
        Self::extract_with(global, colors, domain, &sends, &recvs, config)
    }

    /// Distributed extraction on `comm.rank()`: only the rows this rank
    /// sends are trusted locally, the rows it receives come from the peers.
    /// Collective.
    pub fn extract_distributed<C: Communicator + ?Sized>(
        global: &Mesh,
        colors: &[usize],
        lists: &SendReceive,
        config: &MeshConfig,
        comm: &C,
    ) -> Result<Self, MeshError> {
        let me = comm.rank();
        let everyone: BTreeSet<usize> = (0..comm.size()).collect();
        let sends: BTreeMap<usize, Vec<SendEntry>> = everyone
            .iter()
            .map(|&d| (d, lists.get(me, d).to_vec()))
            .collect();
        let outgoing: BTreeMap<usize, Vec<u8>> = sends
            .iter()
            .map(|(&d, v)| {
                let recs: Vec<WireSendEntry> = v
                    .iter()
                    .map(|e| WireSendEntry::new(e.donor, e.receiver, e.rotation))
                    .collect();
                (d, encode(&recs))
            })
            .collect();
        let got = exchange(comm, TAG_SEND_LISTS, &outgoing, &everyone)?;
        let mut recvs = BTreeMap::new();
        for (src, buf) in got {
            let recs: Vec<WireSendEntry> = decode(&buf)?;
            if recs.is_empty() {
                continue;
            }
            let entries = recs
                .iter()
                .map(|r| {
                    let (donor, receiver, rotation) = r.decode();
                    SendEntry {
                        donor,
                        receiver,
                        rotation,
                    }
                })
                .collect();
            recvs.insert(src, entries);
        }
        let sends = sends.into_iter().filter(|(_, v)| !v.is_empty()).collect();
        Self::extract_with(global, colors, me, &sends, &recvs, config)
    }

    fn extract_with(
        global: &Mesh,
        colors: &[usize],
        domain: usize,
        sends: &BTreeMap<usize, Vec<SendEntry>>,
        recvs: &BTreeMap<usize, Vec<SendEntry>>,
        config: &MeshConfig,
    ) -> Result<Self, MeshError> {
        if colors.len() != global.n_point() {
            return Err(MeshError::Partition(format!(
                "{} colors for {} points",
                colors.len(),
                global.n_point()
            )));
        }
        let owned = |p: usize| global.points[p].domain && colors[p] == domain;

        let kept: Vec<usize> = (0..global.elements.len())
            .filter(|&ie| global.elements[ie].nodes.iter().any(|&n| owned(n)))
            .collect();

        let mut present = BTreeSet::new();
        for &ie in &kept {
            present.extend(global.elements[ie].nodes.iter().copied());
        }
        let (own, ghost): (Vec<usize>, Vec<usize>) = present.into_iter().partition(|&p| owned(p));
        let local_to_global: Vec<usize> = own.iter().chain(&ghost).copied().collect();
        let to_local: HashMap<usize, usize> = local_to_global
            .iter()
            .enumerate()
            .map(|(l, &g)| (g, l))
            .collect();
        let local = |g: usize| {
            to_local.get(&g).copied().ok_or_else(|| {
                MeshError::Partition(format!("point {g} is not present on domain {domain}"))
            })
        };

        let elements = kept
            .iter()
            .map(|&ie| {
                let e = &global.elements[ie];
                Ok(ElementDescription {
                    cell_type: e.cell_type,
                    nodes: e.nodes.iter().map(|&n| local(n)).collect::<Result<_, _>>()?,
                })
            })
            .collect::<Result<Vec<_>, MeshError>>()?;

        let mut markers = Vec::new();
        let mut kinds = Vec::new();
        for m in global.markers.iter().filter(|m| !m.is_send_receive()) {
            let mut elems = Vec::new();
            for be in &m.elements {
                if be.nodes.iter().any(|&n| owned(n)) {
                    elems.push(BoundaryDescription {
                        cell_type: be.cell_type,
                        nodes: be.nodes.iter().map(|&n| local(n)).collect::<Result<_, _>>()?,
                        rotation: 0,
                    });
                }
            }
            if !elems.is_empty() {
                markers.push(MarkerDescription {
                    tag: m.tag.clone(),
                    send_recv: None,
                    elements: elems,
                });
                kinds.push(m.kind);
            }
        }

        let partners: BTreeSet<usize> = sends.keys().chain(recvs.keys()).copied().collect();
        for partner in partners {
            let code = partner as i64 + 1;
            if let Some(list) = sends.get(&partner) {
                markers.push(halo_marker(list, code, |e| local(e.donor))?);
                kinds.push(crate::topology::BoundaryKind::SendReceive);
            }
            if let Some(list) = recvs.get(&partner) {
                markers.push(halo_marker(list, -code, |e| local(e.receiver))?);
                kinds.push(crate::topology::BoundaryKind::SendReceive);
            }
        }

        let desc = MeshDescription {
            dim: global.dim,
            coords: local_to_global.iter().map(|&g| global.points[g].coord).collect(),
            global_index: Some(
                local_to_global
                    .iter()
                    .map(|&g| global.points[g].global_index)
                    .collect(),
            ),
            n_point_domain: Some(own.len()),
            elements,
            markers,
            periodic: global.periodic.iter().copied().enumerate().collect(),
        };
        // Coordinates are already converted.
        let local_config = MeshConfig {
            conversion: 1.0,
            ..config.clone()
        };
        let mut mesh = Mesh::from_description(desc, &local_config)?;
        for (m, kind) in mesh.markers.iter_mut().zip(kinds) {
            m.kind = kind;
        }
        for (p, &g) in mesh.points.iter_mut().zip(&local_to_global) {
            p.color = colors[g];
        }
        mesh.preprocess()?;
        log::info!(
            "domain {domain}: {} owned + {} ghost points, {} elements, {} markers",
            own.len(),
            ghost.len(),
            mesh.elements.len(),
            mesh.markers.len()
        );
        Ok(DomainGeometry {
            domain,
            mesh,
            local_to_global,
        })
    }
}

fn halo_marker<F>(list: &[SendEntry], code: i64, node: F) -> Result<MarkerDescription, MeshError>
where
    F: Fn(&SendEntry) -> Result<usize, MeshError>,
{
    let elements = list
        .iter()
        .map(|e| {
            Ok(BoundaryDescription {
                cell_type: CellType::Vertex,
                nodes: vec![node(e)?],
                rotation: e.rotation,
            })
        })
        .collect::<Result<Vec<_>, MeshError>>()?;
    Ok(MarkerDescription {
        tag: crate::topology::marker::SEND_RECEIVE_TAG.to_string(),
        send_recv: Some(code),
        elements,
    })
}

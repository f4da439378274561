//! Collectives written once over [`Communicator`].
//!
//! Every function here must be called by every rank of the group in the
//! same order, including ranks with nothing to contribute. Pairwise traffic
//! is ordered so that blocking transports cannot deadlock: peers are visited
//! in ascending rank order and, within a pair, the lower rank sends first.
//! Messages to self are copied locally.

use super::communicator::Communicator;
use super::wire::{decode, encode, WireF64};
use crate::mesh_error::MeshError;
use std::collections::{BTreeMap, BTreeSet};

pub const TAG_REDUCE: u16 = 0x0100;
pub const TAG_GATHER: u16 = 0x0101;
pub const TAG_SEND_LISTS: u16 = 0x0200;
pub const TAG_MULTIGRID: u16 = 0x0300;

/// Pairwise exchange: send `outgoing[p]` to every listed `p` and receive
/// one buffer from every rank in `incoming`.
///
/// Both sides of every pair must agree: if rank `a` lists `b` in
/// `outgoing`, rank `b` lists `a` in `incoming`.
pub fn exchange<C: Communicator + ?Sized>(
    comm: &C,
    tag: u16,
    outgoing: &BTreeMap<usize, Vec<u8>>,
    incoming: &BTreeSet<usize>,
) -> Result<BTreeMap<usize, Vec<u8>>, MeshError> {
    let me = comm.rank();
    let peers: BTreeSet<usize> = outgoing.keys().chain(incoming.iter()).copied().collect();
    let mut received = BTreeMap::new();
    for peer in peers {
        if peer == me {
            if incoming.contains(&me) {
                let buf = outgoing.get(&me).cloned().unwrap_or_default();
                received.insert(me, buf);
            }
            continue;
        }
        if me < peer {
            if let Some(buf) = outgoing.get(&peer) {
                comm.send(peer, tag, buf)?;
            }
            if incoming.contains(&peer) {
                received.insert(peer, comm.recv(peer, tag)?);
            }
        } else {
            if incoming.contains(&peer) {
                received.insert(peer, comm.recv(peer, tag)?);
            }
            if let Some(buf) = outgoing.get(&peer) {
                comm.send(peer, tag, buf)?;
            }
        }
    }
    Ok(received)
}

/// Every rank's buffer, indexed by rank.
pub fn all_gather<C: Communicator + ?Sized>(comm: &C, buf: &[u8]) -> Result<Vec<Vec<u8>>, MeshError> {
    let everyone: BTreeSet<usize> = (0..comm.size()).collect();
    let outgoing: BTreeMap<usize, Vec<u8>> = everyone.iter().map(|&p| (p, buf.to_vec())).collect();
    let mut got = exchange(comm, TAG_GATHER, &outgoing, &everyone)?;
    (0..comm.size())
        .map(|r| {
            got.remove(&r)
                .ok_or_else(|| MeshError::Transport(format!("no contribution from rank {r}")))
        })
        .collect()
}

fn gather_f64<C: Communicator + ?Sized>(comm: &C, v: f64) -> Result<Vec<f64>, MeshError> {
    let everyone: BTreeSet<usize> = (0..comm.size()).collect();
    let bytes = encode(&[WireF64::new(v)]);
    let outgoing: BTreeMap<usize, Vec<u8>> = everyone.iter().map(|&p| (p, bytes.clone())).collect();
    let got = exchange(comm, TAG_REDUCE, &outgoing, &everyone)?;
    let mut out = Vec::with_capacity(got.len());
    for (_, buf) in got {
        let vals: Vec<WireF64> = decode(&buf)?;
        let first = vals
            .first()
            .ok_or_else(|| MeshError::Transport("empty reduction operand".into()))?;
        out.push(first.get());
    }
    Ok(out)
}

/// Sum over ranks, accumulated in rank order so every rank gets the same bits.
pub fn all_reduce_sum<C: Communicator + ?Sized>(comm: &C, v: f64) -> Result<f64, MeshError> {
    if comm.is_serial() {
        return Ok(v);
    }
    Ok(gather_f64(comm, v)?.into_iter().sum())
}

pub fn all_reduce_max<C: Communicator + ?Sized>(comm: &C, v: f64) -> Result<f64, MeshError> {
    if comm.is_serial() {
        return Ok(v);
    }
    Ok(gather_f64(comm, v)?.into_iter().fold(f64::NEG_INFINITY, f64::max))
}

/// Integer sum; counts stay exact well past any mesh size.
pub fn all_reduce_count<C: Communicator + ?Sized>(comm: &C, n: usize) -> Result<usize, MeshError> {
    Ok(all_reduce_sum(comm, n as f64)?.round() as usize)
}

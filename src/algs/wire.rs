//! Fixed little-endian wire records for collective exchanges.
//!
//! Every record is `repr(C)` + `Pod`, so a `&[T]` is sent as its raw bytes
//! and decoded by copying into a zeroed vector (no alignment assumption on
//! the received buffer). Multi-byte fields are stored pre-LE with
//! `.to_le()` and read back with `from_le`.

use crate::mesh_error::MeshError;
use bytemuck::{Pod, Zeroable};
use static_assertions::assert_eq_size;
use std::mem::size_of;

/// Raw bytes of a record slice.
pub fn encode<T: Pod>(v: &[T]) -> Vec<u8> {
    bytemuck::cast_slice(v).to_vec()
}

/// Copy `bytes` into a vector of records, failing on a ragged buffer.
pub fn decode<T: Pod>(bytes: &[u8]) -> Result<Vec<T>, MeshError> {
    let sz = size_of::<T>();
    if bytes.len() % sz != 0 {
        return Err(MeshError::Transport(format!(
            "buffer of {} bytes is not a multiple of the {sz}-byte record",
            bytes.len()
        )));
    }
    let mut out = vec![T::zeroed(); bytes.len() / sz];
    bytemuck::cast_slice_mut(&mut out).copy_from_slice(bytes);
    Ok(out)
}

/// A single `f64` reduction operand.
#[repr(transparent)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireF64 {
    pub bits_le: u64,
}
impl WireF64 {
    pub fn new(v: f64) -> Self {
        Self {
            bits_le: v.to_bits().to_le(),
        }
    }
    pub fn get(&self) -> f64 {
        f64::from_bits(u64::from_le(self.bits_le))
    }
}

/// A located point: owner-local index plus coordinates. Used by the
/// all-gathers of wall distance and partner matching.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireLocatedPoint {
    pub point_le: u64,
    pub tag_le: u64,
    pub coord_le: [u64; 3],
}
impl WireLocatedPoint {
    pub fn new(point: usize, tag: u64, coord: [f64; 3]) -> Self {
        Self {
            point_le: (point as u64).to_le(),
            tag_le: tag.to_le(),
            coord_le: coord.map(|c| c.to_bits().to_le()),
        }
    }
    pub fn point(&self) -> usize {
        u64::from_le(self.point_le) as usize
    }
    /// Free-form discriminator (marker kind, marker index, ...).
    pub fn tag(&self) -> u64 {
        u64::from_le(self.tag_le)
    }
    pub fn coord(&self) -> [f64; 3] {
        self.coord_le.map(|c| f64::from_bits(u64::from_le(c)))
    }
}

/// One send/receive list entry in global numbering.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireSendEntry {
    pub donor_le: u64,
    pub receiver_le: u64,
    pub rotation_le: u64,
}
impl WireSendEntry {
    pub fn new(donor: usize, receiver: usize, rotation: usize) -> Self {
        Self {
            donor_le: (donor as u64).to_le(),
            receiver_le: (receiver as u64).to_le(),
            rotation_le: (rotation as u64).to_le(),
        }
    }
    pub fn decode(&self) -> (usize, usize, usize) {
        (
            u64::from_le(self.donor_le) as usize,
            u64::from_le(self.receiver_le) as usize,
            u64::from_le(self.rotation_le) as usize,
        )
    }
}

/// Multigrid halo record: a fine point on a send marker, the coarse point
/// that absorbed it, and how many earlier entries of the same marker named
/// the same fine point.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
pub struct WireAgglomeration {
    pub child_le: u64,
    pub parent_le: u64,
    pub repeat_le: u64,
}
impl WireAgglomeration {
    pub fn new(child: usize, parent: usize, repeat: usize) -> Self {
        Self {
            child_le: (child as u64).to_le(),
            parent_le: (parent as u64).to_le(),
            repeat_le: (repeat as u64).to_le(),
        }
    }
    pub fn decode(&self) -> (usize, usize, usize) {
        (
            u64::from_le(self.child_le) as usize,
            u64::from_le(self.parent_le) as usize,
            u64::from_le(self.repeat_le) as usize,
        )
    }
}

assert_eq_size!(WireF64, u64);
assert_eq_size!(WireLocatedPoint, [u64; 5]);
assert_eq_size!(WireSendEntry, [u64; 3]);
assert_eq_size!(WireAgglomeration, [u64; 3]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn located_point_keeps_bits() {
        let v = vec![
            WireLocatedPoint::new(7, 2, [0.1, -2.5, 1e-300]),
            WireLocatedPoint::new(9, 0, [f64::MAX, 0.0, -0.0]),
        ];
        let bytes = encode(&v);
        // Misalign on purpose: decoding must not rely on buffer alignment.
        let mut shifted = vec![0u8];
        shifted.extend_from_slice(&bytes);
        let out: Vec<WireLocatedPoint> = decode(&shifted[1..]).unwrap();
        assert_eq!(out[0].point(), 7);
        assert_eq!(out[0].tag(), 2);
        assert_eq!(out[0].coord(), [0.1, -2.5, 1e-300]);
        assert_eq!(out[1].coord()[0], f64::MAX);
    }

    #[test]
    fn ragged_buffer_is_rejected() {
        let bytes = encode(&[WireAgglomeration::new(1, 2, 0)]);
        assert!(matches!(
            decode::<WireAgglomeration>(&bytes[..10]),
            Err(MeshError::Transport(_))
        ));
        let ok: Vec<WireAgglomeration> = decode(&bytes).unwrap();
        assert_eq!(ok[0].decode(), (1, 2, 0));
    }
}

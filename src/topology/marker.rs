//! Named boundary groups.

use super::element::BoundaryElement;
use super::vertex::Vertex;
use serde::{Deserialize, Serialize};

/// Tag used by the native format for synthetic inter-domain markers.
pub const SEND_RECEIVE_TAG: &str = "SEND_RECEIVE";

/// Boundary-condition kind of a marker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BoundaryKind {
    EulerWall,
    NoSlipWall,
    FarField,
    Symmetry,
    Inlet,
    Outlet,
    Periodic,
    NearField,
    Interface,
    /// Synthetic inter-domain halo marker.
    SendReceive,
    /// Any other physical condition handled by the solver layer.
    #[default]
    Custom,
}

impl BoundaryKind {
    /// Solid walls, the targets of the wall-distance query.
    pub fn is_wall(self) -> bool {
        matches!(self, BoundaryKind::EulerWall | BoundaryKind::NoSlipWall)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub tag: String,
    pub kind: BoundaryKind,
    /// Partner of a send/receive marker: `+(d+1)` sends to domain `d`,
    /// `-(d+1)` receives from domain `d`.
    pub send_recv: Option<i64>,
    pub elements: Vec<BoundaryElement>,
    pub vertices: Vec<Vertex>,
}

impl Marker {
    pub fn new(tag: impl Into<String>, kind: BoundaryKind) -> Self {
        Self {
            tag: tag.into(),
            kind,
            send_recv: None,
            elements: Vec::new(),
            vertices: Vec::new(),
        }
    }

    /// Send/receive marker toward (`send = true`) or from `partner`.
    pub fn send_receive(partner: usize, send: bool) -> Self {
        let code = partner as i64 + 1;
        Self {
            tag: SEND_RECEIVE_TAG.to_string(),
            kind: BoundaryKind::SendReceive,
            send_recv: Some(if send { code } else { -code }),
            elements: Vec::new(),
            vertices: Vec::new(),
        }
    }

    #[inline]
    pub fn is_send_receive(&self) -> bool {
        self.send_recv.is_some()
    }

    /// Domain this marker sends to, if it is a send marker.
    pub fn send_to(&self) -> Option<usize> {
        self.send_recv.filter(|&c| c > 0).map(|c| (c - 1) as usize)
    }

    /// Domain this marker receives from, if it is a receive marker.
    pub fn receive_from(&self) -> Option<usize> {
        self.send_recv.filter(|&c| c < 0).map(|c| (-c - 1) as usize)
    }
}

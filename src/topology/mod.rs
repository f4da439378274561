//! Mesh records and their fixed local topology.
//!
//! The [`crate::mesh::Mesh`] arena owns flat vectors of these records and
//! every cross reference is a plain index into one of them:
//! - [`point::Point`], [`edge::Edge`], [`element::Element`] and
//!   [`element::BoundaryElement`]
//! - [`marker::Marker`] groups boundary elements and their
//!   [`vertex::Vertex`] records
//! - [`cell_type::CellType`] answers every per-shape topology question from
//!   static tables
//! - [`orientation`] fixes node winding, [`periodic`] holds rigid transforms

pub mod cell_type;
pub mod edge;
pub mod element;
pub mod marker;
pub mod orientation;
pub mod periodic;
pub mod point;
pub mod vertex;

pub use cell_type::CellType;
pub use edge::Edge;
pub use element::{BoundaryElement, Element};
pub use marker::{BoundaryKind, Marker};
pub use periodic::PeriodicTransform;
pub use point::Point;
pub use vertex::{DonorPoint, Vertex};

//! Distributed-memory algorithms: transport, coloring, halo lists,
//! sub-mesh extraction and periodic replication.

pub mod collective;
pub mod communicator;
pub mod connectivity;
pub mod domain;
#[cfg(feature = "metis-support")]
pub mod metis_partition;
pub mod partition;
pub mod periodic;
pub mod send_receive;
pub mod wire;

pub use communicator::{Communicator, LocalComm};
pub use domain::DomainGeometry;
pub use partition::{color_points, GreedyPartitioner, Partitioner};
pub use periodic::PeriodicGeometry;
pub use send_receive::{SendEntry, SendReceive};

#[macro_use]
extern crate lazy_static;
extern crate primitives;

pub mod checkpoint;
pub mod fork;
mod consensus;
mod network;

pub use primitives::{hash, compact};

pub use checkpoint::Checkpoint;
pub use consensus::ConsensusParams;
pub use fork::ForkFlags;
pub use network::Network;

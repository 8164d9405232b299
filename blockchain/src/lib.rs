//! Block organization: the orphan block pool, the single-writer organizer
//! driving blocks through check, populate, accept and connect, and the
//! bounded transaction pool kept consistent across reorganizations.

extern crate parking_lot;
extern crate time;
#[macro_use]
extern crate log;

extern crate chain;
extern crate network;
extern crate primitives;
extern crate verification;

#[cfg(test)]
extern crate test_data;

mod block_pool;
mod executor;
mod organizer;
mod transaction_pool;

pub use primitives::hash;

pub use block_pool::BlockPool;
pub use executor::OrderedExecutor;
pub use organizer::{ForkEvent, ForkSubscriptions, OrganizeHandler, Organizer};
pub use transaction_pool::{
	ConfirmHandler, ExistsHandler, FetchHandler, TransactionPool, ValidateHandler,
};

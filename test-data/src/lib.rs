//! Test tooling: block and transaction builders plus an in-memory
//! implementation of the fast chain interfaces.

extern crate parking_lot;
extern crate chain;
extern crate primitives;
extern crate script;
extern crate verification;

mod chain_builder;
mod memory_chain;

pub use chain_builder::{BlockBuilder, TransactionBuilder, block_builder, genesis, next_block};
pub use memory_chain::MemoryFastChain;

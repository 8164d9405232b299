//! Chain state derivation, block population and three-phase block
//! verification: check (context free), accept (contextual) and connect
//! (previous-output dependent).

extern crate rayon;
#[macro_use]
extern crate log;

extern crate chain;
extern crate network;
extern crate primitives;
extern crate script;

mod accept_block;
mod chain_state;
mod connect_block;
mod constants;
mod duplex_store;
mod error;
mod fast_chain;
mod header_branch;
mod populate;
mod script_executor;
mod sigops;
mod verify_block;
mod work;

pub use primitives::{hash, compact, uint};

pub use accept_block::BlockAcceptor;
pub use chain_state::{ChainState, Data, HeightRange, Map, RangeData, get_map, UNREQUESTED};
pub use connect_block::BlockConnector;
pub use constants::*;
pub use duplex_store::{BranchOutputs, DuplexOutputProvider};
pub use error::Error;
pub use fast_chain::{
	block_state, FastChain, FastChainReader, FastChainWriter,
	OutputMeta, TransactionMeta, TransactionState, NO_FORK_HEIGHT,
};
pub use header_branch::{BranchEntry, HeaderBranch};
pub use populate::{BlockMeta, BlockPopulator, ChainStatePopulator};
pub use script_executor::{NoopExecutor, ScriptExecutor};
pub use sigops::{legacy_sigops_count, script_hash_sigops, transaction_sigops};
pub use verify_block::{BlockVerifier, TransactionVerifier};
pub use work::{
	block_reward_satoshi, is_retarget_height, is_valid_proof_of_work,
	is_valid_proof_of_work_hash, retarget_timespan, work_required_retarget,
};

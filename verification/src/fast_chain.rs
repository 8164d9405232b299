//! Interfaces of the chain store this crate is a client of. The store
//! itself lives elsewhere; readers must be safe for concurrent use, while
//! writers assume the organizer's single-writer discipline.

use chain::{IndexedBlock, IndexedTransaction, TransactionOutput, OutPoint};
use primitives::hash::H256;
use primitives::uint::U256;
use network::ForkFlags;
use error::Error;

/// Fork height used when population is not bounded by a branch.
pub const NO_FORK_HEIGHT: u32 = u32::max_value();

/// Block state bitflags.
pub mod block_state {
	pub const STORED: u8 = 1;
	pub const POOLED: u8 = 2;
	pub const INDEXED: u8 = 4;
	pub const VALIDATED: u8 = 8;
	pub const FAILED: u8 = 16;
}

/// State of a transaction id relative to the indexed chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
	Pooled,
	Indexed,
	Confirmed,
	Missing,
	Failed,
}

/// Previous output metadata, written exactly once per input by the
/// populate pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputMeta {
	/// The referenced output, if it exists.
	pub cache: Option<TransactionOutput>,
	/// True if a confirmed input already spends the referenced output.
	pub spent: bool,
	/// True if the referenced output is confirmed at or below the fork height.
	pub confirmed: bool,
	/// Height of the block that produced the output, for coinbase
	/// previous outputs only.
	pub coinbase_height: Option<u32>,
}

impl OutputMeta {
	/// The referenced output is not known to the chain.
	pub fn missing() -> Self {
		OutputMeta {
			cache: None,
			spent: false,
			confirmed: false,
			coinbase_height: None,
		}
	}

	/// A coinbase input originates coin, so it cannot be a double spend,
	/// is confirmed by its own block and references no previous output.
	pub fn coinbase() -> Self {
		OutputMeta {
			cache: Some(TransactionOutput::empty()),
			spent: false,
			confirmed: true,
			coinbase_height: None,
		}
	}
}

/// Transaction metadata attached by the populate pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionMeta {
	/// State of the same transaction id in the indexed chain.
	pub state: TransactionState,
	/// True if a confirmed transaction with the same id exists at or
	/// below the fork height.
	pub duplicate: bool,
}

impl Default for TransactionMeta {
	fn default() -> Self {
		TransactionMeta {
			state: TransactionState::Missing,
			duplicate: false,
		}
	}
}

/// Thread safe read operations over the block and header indexes.
///
/// `block_index` selects the confirmed block index (true) or the header
/// index (false).
pub trait FastChainReader: Send + Sync {
	/// Height of the highest block in the selected index.
	fn top_height(&self, block_index: bool) -> Option<u32>;

	/// Height of the block with the given hash.
	fn block_height(&self, hash: &H256, block_index: bool) -> Option<u32>;

	/// Hash of the block at the given height.
	fn block_hash(&self, height: u32, block_index: bool) -> Option<H256>;

	/// Cached validation failure of a block.
	fn block_error(&self, hash: &H256) -> Option<Error>;

	/// Cached validation failure of a transaction.
	fn transaction_error(&self, hash: &H256) -> Option<Error>;

	/// Bits of the block at the given height.
	fn bits(&self, height: u32, block_index: bool) -> Option<u32>;

	/// Version of the block at the given height.
	fn version(&self, height: u32, block_index: bool) -> Option<u32>;

	/// Timestamp of the block at the given height.
	fn timestamp(&self, height: u32, block_index: bool) -> Option<u32>;

	/// Work of the blocks above the given height. Accumulation may stop
	/// once `maximum` is exceeded.
	fn work(&self, maximum: &U256, above_height: u32, block_index: bool) -> U256;

	/// Block state flags.
	fn block_state(&self, hash: &H256) -> u8;

	/// Transaction state.
	fn transaction_state(&self, hash: &H256) -> TransactionState;

	/// Metadata of the given transaction id relative to the fork height.
	fn populate_transaction(&self, hash: &H256, forks: ForkFlags, fork_height: u32) -> TransactionMeta;

	/// Output and metadata of the output referenced by the outpoint,
	/// relative to the fork height.
	fn populate_output(&self, outpoint: &OutPoint, fork_height: u32) -> OutputMeta;

	/// True if a confirmed transaction spends the output.
	fn is_output_spent(&self, outpoint: &OutPoint) -> bool;

	/// True if the top block age exceeds the configured limit.
	fn is_blocks_stale(&self) -> bool;

	/// True if the top header age exceeds the configured limit.
	fn is_headers_stale(&self) -> bool;
}

/// Write operations. Exclusive access is assumed; only the organizer's
/// ordered path may call these.
pub trait FastChainWriter {
	/// Index a validated transaction.
	fn push_transaction(&self, transaction: IndexedTransaction) -> Result<(), Error>;

	/// Atomically replace the indexed top above the fork point with the
	/// incoming blocks, returning the displaced ones.
	fn reorganize(&self, fork_point: u32, incoming: &[IndexedBlock]) -> Result<Vec<IndexedBlock>, Error>;

	/// Record a block validation failure so the same invalid block is not
	/// re-validated.
	fn cache_block_error(&self, hash: &H256, error: Error);

	/// Record a transaction validation failure.
	fn cache_transaction_error(&self, hash: &H256, error: Error);
}

pub trait FastChain: FastChainReader + FastChainWriter {
	/// The reader half, for components that only consume reads.
	fn as_reader(&self) -> &dyn FastChainReader;
}

impl<T> FastChain for T where T: FastChainReader + FastChainWriter {
	fn as_reader(&self) -> &dyn FastChainReader {
		self
	}
}

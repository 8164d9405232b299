//! Population of chain state and previous-output metadata.
//!
//! Chain state attributes are resolved through the branch first and the
//! indexed chain second. Block population attaches previous-output and
//! confirmation metadata to every non-coinbase input, fanned out over
//! disjoint buckets so each metadata slot is written exactly once.

use std::cmp;
use std::sync::Arc;
use std::time::Instant;
use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use chain::IndexedBlock;
use primitives::hash::H256;
use network::{fork, ConsensusParams};
use chain_state::{self, ChainState, Data, HeightRange, Map, RangeData, UNREQUESTED};
use duplex_store::{BranchOutputs, DuplexOutputProvider};
use fast_chain::{FastChainReader, OutputMeta, TransactionMeta};
use header_branch::HeaderBranch;
use error::Error;

/// Derives chain state for a height from a branch and the indexed tail.
pub struct ChainStatePopulator<'a> {
	chain: &'a dyn FastChainReader,
	consensus: &'a ConsensusParams,
}

impl<'a> ChainStatePopulator<'a> {
	pub fn new(chain: &'a dyn FastChainReader, consensus: &'a ConsensusParams) -> Self {
		ChainStatePopulator {
			chain: chain,
			consensus: consensus,
		}
	}

	/// State for the top of the block|header index. There is no branch in
	/// the startup scenario.
	pub fn populate_top(&self, block_index: bool) -> Option<Arc<ChainState>> {
		let height = self.chain.top_height(block_index)?;
		let hash = self.chain.block_hash(height, block_index)?;
		let branch = HeaderBranch::empty();
		self.populate_at(hash, height, &branch, block_index)
	}

	/// State for the top of the given branch. Promotes from the immediate
	/// parent state when one is attached, which is the common case.
	pub fn populate(&self, branch: &HeaderBranch) -> Option<Arc<ChainState>> {
		let (top_header, parent_state) = {
			let top = match branch.top() {
				Some(top) => top,
				None => return None,
			};

			let parent_state = branch.top_parent().and_then(|parent| parent.state.clone());
			(top.header.clone(), parent_state)
		};

		if let Some(parent_state) = parent_state {
			if let Some(promoted) = ChainState::promote(&parent_state, &top_header) {
				return Some(Arc::new(promoted));
			}
		}

		self.populate_at(top_header.hash.clone(), branch.top_height(), branch, false)
	}

	fn populate_at(&self, hash: H256, height: u32, branch: &HeaderBranch, block_index: bool) -> Option<Arc<ChainState>> {
		let map = chain_state::get_map(height, self.consensus);

		let data = Data {
			hash: hash,
			height: height,
			bits: self.populate_range(&map.bits, map.bits_self, branch, block_index, Attribute::Bits)?,
			version: self.populate_range(&map.version, map.version_self, branch, block_index, Attribute::Version)?,
			timestamp: self.populate_range(&map.timestamp, map.timestamp_self, branch, block_index, Attribute::Timestamp)?,
			timestamp_retarget: self.populate_retarget(&map, branch, block_index)?,
			allow_collisions_hash: self.populate_collision_hash(&map, branch, block_index)?,
		};

		Some(Arc::new(ChainState::new(data, self.consensus)))
	}

	fn populate_range(&self, range: &HeightRange, self_height: u32, branch: &HeaderBranch, block_index: bool, attribute: Attribute) -> Option<RangeData> {
		let mut ordered = Vec::with_capacity(range.count as usize);
		for index in 0..range.count as usize {
			ordered.push(self.get(attribute, range.height_at(index), branch, block_index)?);
		}

		let own = self.get(attribute, self_height, branch, block_index)?;

		Some(RangeData {
			ordered: ordered,
			own: own,
		})
	}

	fn populate_retarget(&self, map: &Map, branch: &HeaderBranch, block_index: bool) -> Option<u32> {
		if map.timestamp_retarget == UNREQUESTED {
			return Some(UNREQUESTED);
		}

		self.get(Attribute::Timestamp, map.timestamp_retarget, branch, block_index)
	}

	fn populate_collision_hash(&self, map: &Map, branch: &HeaderBranch, block_index: bool) -> Option<H256> {
		if map.allow_collisions_height == UNREQUESTED {
			return Some(H256::default());
		}

		branch.get_block_hash(map.allow_collisions_height)
			.or_else(|| self.chain.block_hash(map.allow_collisions_height, block_index))
	}

	fn get(&self, attribute: Attribute, height: u32, branch: &HeaderBranch, block_index: bool) -> Option<u32> {
		match attribute {
			Attribute::Bits => branch.get_bits(height)
				.or_else(|| self.chain.bits(height, block_index)),
			Attribute::Version => branch.get_version(height)
				.or_else(|| self.chain.version(height, block_index)),
			Attribute::Timestamp => branch.get_timestamp(height)
				.or_else(|| self.chain.timestamp(height, block_index)),
		}
	}
}

#[derive(Clone, Copy)]
enum Attribute {
	Bits,
	Version,
	Timestamp,
}

/// Everything population attaches to a block before input connection.
#[derive(Debug)]
pub struct BlockMeta {
	pub state: Arc<ChainState>,
	/// Per-transaction metadata, coinbase at position 0.
	pub transactions: Vec<TransactionMeta>,
	/// The fixed metadata of the coinbase input.
	pub coinbase_input: OutputMeta,
	/// Per-input metadata of the non-coinbase inputs, in block order.
	pub inputs: Vec<OutputMeta>,
	/// False when the block is under a checkpoint and input metadata is
	/// not required.
	pub populated: bool,
	/// When population began, for observability.
	pub started: Instant,
}

impl BlockMeta {
	fn unpopulated(state: Arc<ChainState>, started: Instant) -> Self {
		BlockMeta {
			state: state,
			transactions: Vec::new(),
			coinbase_input: OutputMeta::coinbase(),
			inputs: Vec::new(),
			populated: false,
			started: started,
		}
	}
}

/// Bucketed parallel attachment of previous-output metadata.
pub struct BlockPopulator<'a> {
	chain: &'a dyn FastChainReader,
	consensus: &'a ConsensusParams,
}

impl<'a> BlockPopulator<'a> {
	pub fn new(chain: &'a dyn FastChainReader, consensus: &'a ConsensusParams) -> Self {
		BlockPopulator {
			chain: chain,
			consensus: consensus,
		}
	}

	/// Fork height is the last block of the indexed chain this block's
	/// branch connects to. Confirmed transactions above the fork point are
	/// treated as unconfirmed for validation purposes; outputs they cannot
	/// provide are resolved from the accepted prefix of the branch.
	pub fn populate(&self, block: &IndexedBlock, branch: &HeaderBranch, preceding: &BranchOutputs, fork_height: u32) -> Result<BlockMeta, Error> {
		let started = Instant::now();

		let state = ChainStatePopulator::new(self.chain, self.consensus)
			.populate(branch)
			.ok_or(Error::OperationFailed)?;

		// No block state is required under a checkpoint.
		if state.is_under_checkpoint() {
			return Ok(BlockMeta::unpopulated(state, started));
		}

		let forks = state.enabled_forks();
		let mut transactions = vec![TransactionMeta::default(); block.transactions.len()];

		// The coinbase is a special case tx.
		transactions[0] = self.chain.populate_transaction(&block.transactions[0].hash, forks, fork_height);

		let input_count = block.non_coinbase_inputs();
		if input_count == 0 {
			return Ok(BlockMeta {
				state: state,
				transactions: transactions,
				coinbase_input: OutputMeta::coinbase(),
				inputs: Vec::new(),
				populated: true,
				started: started,
			});
		}

		// If collisions are allowed there is no need to scan for duplicate
		// ids, and a stale chain cannot profit from the pool optimization.
		let scan_duplicates = !self.chain.is_blocks_stale() ||
			!fork::is_enabled(forks, fork::ALLOW_COLLISIONS);

		let outputs = DuplexOutputProvider::new(self.chain, preceding);
		let buckets = cmp::min(rayon::current_num_threads(), input_count);
		let results = (0..buckets).into_par_iter()
			.map(|bucket| self.populate_bucket(block, &outputs, fork_height, bucket, buckets, forks, scan_duplicates))
			.collect::<Vec<_>>();

		// Bucket work is disjoint by construction, so the merge writes
		// every slot exactly once.
		let mut inputs: Vec<Option<OutputMeta>> = vec![None; input_count];
		for (bucket_transactions, bucket_inputs) in results {
			for (position, meta) in bucket_transactions {
				transactions[position] = meta;
			}
			for (position, meta) in bucket_inputs {
				debug_assert!(inputs[position].is_none(), "input populated by two buckets");
				inputs[position] = Some(meta);
			}
		}

		let inputs = inputs.into_iter()
			.map(|meta| meta.expect("bucket striping covers every input position"))
			.collect();

		Ok(BlockMeta {
			state: state,
			transactions: transactions,
			coinbase_input: OutputMeta::coinbase(),
			inputs: inputs,
			populated: true,
			started: started,
		})
	}

	fn populate_bucket(
		&self,
		block: &IndexedBlock,
		outputs: &DuplexOutputProvider,
		fork_height: u32,
		bucket: usize,
		buckets: usize,
		forks: u32,
		scan_duplicates: bool,
	) -> (Vec<(usize, TransactionMeta)>, Vec<(usize, OutputMeta)>) {
		debug_assert!(bucket < buckets);
		let transactions = &block.transactions;
		let mut bucket_transactions = Vec::new();
		let mut bucket_inputs = Vec::new();

		if scan_duplicates {
			// The coinbase is already accounted for, bucket zero starts at
			// the full stride.
			let mut position = if bucket == 0 { buckets } else { bucket };
			while position < transactions.len() {
				let meta = self.chain.populate_transaction(&transactions[position].hash, forks, fork_height);
				bucket_transactions.push((position, meta));
				position += buckets;
			}
		}

		let mut input_position = 0usize;
		for transaction in transactions.iter().skip(1) {
			for input in &transaction.raw.inputs {
				if input_position % buckets == bucket {
					let meta = outputs.populate_output(&input.previous_output, fork_height);
					bucket_inputs.push((input_position, meta));
				}
				input_position += 1;
			}
		}

		(bucket_transactions, bucket_inputs)
	}
}

//! The organizer: a single-writer state machine that accepts candidate
//! blocks, pools them until their branch reaches the indexed chain, and
//! reorganizes when a branch claims more work than the chain above the
//! fork point.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use time;
use chain::IndexedBlock;
use network::ConsensusParams;
use primitives::hash::H256;
use verification::{
	BlockAcceptor, BlockConnector, BlockPopulator, BlockVerifier,
	BranchEntry, BranchOutputs, ChainState, Error, FastChain, HeaderBranch,
	ScriptExecutor,
};
use block_pool::BlockPool;
use executor::OrderedExecutor;

/// Completion handler of a single organize request.
pub type OrganizeHandler = Box<dyn FnOnce(Result<(), Error>) + Send>;

/// A committed reorganization. The branch work strictly exceeds the work
/// of the outgoing blocks, and `incoming[0]` attaches to the fork point.
#[derive(Debug, Clone)]
pub struct ForkEvent {
	pub fork_point: u32,
	pub incoming: Vec<IndexedBlock>,
	pub outgoing: Vec<IndexedBlock>,
}

/// One-shot fork event subscriptions: firing drains the list, interested
/// parties re-subscribe from their handler.
#[derive(Default)]
pub struct ForkSubscriptions {
	subscribers: Mutex<Vec<Box<dyn Fn(&ForkEvent) + Send>>>,
}

impl ForkSubscriptions {
	pub fn subscribe(&self, subscriber: Box<dyn Fn(&ForkEvent) + Send>) {
		self.subscribers.lock().push(subscriber);
	}

	fn fire(&self, event: &ForkEvent) {
		let subscribers = {
			let mut lock = self.subscribers.lock();
			::std::mem::replace(&mut *lock, Vec::new())
		};

		for subscriber in &subscribers {
			subscriber(event);
		}
	}
}

pub struct Organizer {
	context: Arc<OrganizerContext>,
	executor: OrderedExecutor,
}

impl Organizer {
	pub fn new(
		chain: Arc<dyn FastChain + Send + Sync>,
		script_executor: Arc<dyn ScriptExecutor>,
		consensus: ConsensusParams,
	) -> Self {
		Organizer {
			context: Arc::new(OrganizerContext {
				chain: chain,
				script_executor: script_executor,
				consensus: consensus,
				pool: Mutex::new(BlockPool::new()),
				subscriptions: Arc::new(ForkSubscriptions::default()),
				stopped: AtomicBool::new(true),
			}),
			executor: OrderedExecutor::new("organizer"),
		}
	}

	pub fn start(&self) {
		self.context.stopped.store(false, Ordering::SeqCst);
	}

	pub fn stop(&self) {
		self.context.stopped.store(true, Ordering::SeqCst);
	}

	pub fn is_stopped(&self) -> bool {
		self.context.stopped.load(Ordering::SeqCst)
	}

	pub fn subscriptions(&self) -> Arc<ForkSubscriptions> {
		self.context.subscriptions.clone()
	}

	/// Stages the block and fires the handler exactly once with the
	/// outcome. Requests are processed in arrival order.
	pub fn organize(&self, block: IndexedBlock, handler: OrganizeHandler) {
		let context = self.context.clone();
		self.executor.execute(move || {
			let hash = block.header.hash.clone();
			let result = context.organize(block);
			if let Err(ref error) = result {
				if *error != Error::ServiceStopped {
					warn!(target: "blockchain", "Invalid block [{}] {}", hash.to_reversed_str(), error);
				}
			}
			handler(result);
		});
	}

	/// Number of blocks currently pooled.
	pub fn pool_size(&self) -> usize {
		self.context.pool.lock().len()
	}
}

struct OrganizerContext {
	chain: Arc<dyn FastChain + Send + Sync>,
	script_executor: Arc<dyn ScriptExecutor>,
	consensus: ConsensusParams,
	pool: Mutex<BlockPool>,
	subscriptions: Arc<ForkSubscriptions>,
	stopped: AtomicBool,
}

impl OrganizerContext {
	fn is_stopped(&self) -> bool {
		self.stopped.load(Ordering::SeqCst)
	}

	fn organize(&self, block: IndexedBlock) -> Result<(), Error> {
		if self.is_stopped() {
			return Err(Error::ServiceStopped);
		}

		let hash = block.header.hash.clone();

		// Re-announced invalid blocks short-circuit on the error cache.
		if let Some(error) = self.chain.block_error(&hash) {
			return Err(error);
		}

		if self.pool.lock().contains(&hash) || self.chain.block_height(&hash, true).is_some() {
			return Err(Error::Duplicate);
		}

		// Checks that are independent of the chain; failures are cached so
		// the same invalid block is never checked twice.
		let current_time = time::get_time().sec as u32;
		let stopped = || self.is_stopped();
		let check = BlockVerifier::new(&block, &self.consensus, current_time, &stopped).check();
		if let Err(error) = check {
			if error != Error::ServiceStopped {
				self.chain.cache_block_error(&hash, error);
			}
			return Err(error);
		}

		self.pool.lock().insert(block);
		self.try_commit_branch(&hash)
	}

	/// Traces the branch of a pooled block and commits it when it reaches
	/// the indexed chain and outweighs the competing segment.
	fn try_commit_branch(&self, hash: &H256) -> Result<(), Error> {
		// An unreachable fork point means the branch is waiting for more
		// ancestors.
		let (branch, blocks) = {
			let pool = self.pool.lock();
			let trace = pool.trace(hash);
			let root = pool.block(&trace[0]).expect("trace returns pooled hashes");
			let fork_point = match self.chain.block_height(&root.header.raw.previous_header_hash, true) {
				Some(fork_point) => fork_point,
				None => return Ok(()),
			};

			let mut branch = HeaderBranch::new(fork_point);
			let mut blocks = Vec::with_capacity(trace.len());
			for entry_hash in trace.iter().rev() {
				let block = pool.block(entry_hash).expect("trace returns pooled hashes").clone();
				let mut entry = BranchEntry::from(block.header.clone());
				entry.state = pool.state(entry_hash);
				branch.push(entry);
				blocks.push(block);
			}
			blocks.reverse();
			(branch, blocks)
		};

		let fork_point = branch.height();
		for (index, block) in blocks.iter().enumerate() {
			self.pool.lock().set_height(&block.header.hash, fork_point + 1 + index as u32);
		}

		// The branch must claim more work than the competing chain segment
		// before any validation is spent on it.
		let branch_work = branch.work();
		let main_work = self.chain.work(&branch_work, fork_point, true);
		if branch_work <= main_work {
			trace!(target: "blockchain", "Pooled block [{}] branch does not exceed main chain work", hash.to_reversed_str());
			return Ok(());
		}

		self.commit(fork_point, blocks)
	}

	/// Accepts and connects the branch block by block, clipping the
	/// subtree under the first failure, then swaps the chain top.
	fn commit(&self, fork_point: u32, mut blocks: Vec<IndexedBlock>) -> Result<(), Error> {
		let stopped = || self.is_stopped();
		let populator = BlockPopulator::new(self.chain.as_reader(), &self.consensus);
		let mut branch = HeaderBranch::new(fork_point);
		let mut preceding = BranchOutputs::new();
		let mut failure: Option<Error> = None;
		let mut accepted = 0;

		for index in 0..blocks.len() {
			let block = &blocks[index];
			let height = fork_point + 1 + index as u32;

			let mut entry = BranchEntry::from(block.header.clone());
			entry.state = self.pool.lock().state(&block.header.hash);
			branch.push_top(entry);

			let result = self.validate_block(&populator, &branch, &preceding, block, fork_point, height, &stopped);
			let state = match result {
				Ok(state) => state,
				Err(error) => {
					failure = Some(error);
					break;
				},
			};

			if let Some(top) = branch.top_mut() {
				top.state = Some(state.clone());
			}
			self.pool.lock().set_state(&block.header.hash, state);
			preceding.push(height, block);
			accepted += 1;
		}

		if let Some(error) = failure {
			self.clip(&blocks[accepted], error);
			if accepted == 0 {
				return Err(error);
			}
			blocks.truncate(accepted);

			// The surviving prefix competes on its own.
			let prefix_work = blocks.iter()
				.fold(::primitives::uint::U256::zero(), |total, block| total + block.header.raw.proof());
			if prefix_work <= self.chain.work(&prefix_work, fork_point, true) {
				return Err(error);
			}
		}

		// Replace the indexed top. The store returns the displaced blocks.
		let outgoing = self.chain.reorganize(fork_point, &blocks)?;
		if !outgoing.is_empty() {
			warn!(
				target: "blockchain",
				"Reorganizing blockchain [{}, {}]",
				fork_point + 1, outgoing.len()
			);
		}

		{
			let mut pool = self.pool.lock();
			for block in &blocks {
				pool.remove(&block.header.hash);
			}
			// Displaced blocks return to the pool, they may win again.
			for block in &outgoing {
				pool.insert(block.clone());
			}
			if let Some(top) = self.chain.top_height(true) {
				pool.prune(top, self.consensus.reorganization_limit);
			}
		}

		// Exactly one fork event per commit, in commit order.
		let tip = blocks.last().expect("the committed prefix is never empty").header.hash.clone();
		let event = ForkEvent {
			fork_point: fork_point,
			incoming: blocks,
			outgoing: outgoing,
		};
		self.subscriptions.fire(&event);

		// Pooled blocks waiting on the new tip get their turn; their
		// failures are cached and clipped on their own.
		let waiting = self.pool.lock().children(&tip).to_vec();
		for child in waiting {
			let _ = self.try_commit_branch(&child);
		}

		Ok(())
	}

	fn validate_block(
		&self,
		populator: &BlockPopulator,
		branch: &HeaderBranch,
		preceding: &BranchOutputs,
		block: &IndexedBlock,
		fork_point: u32,
		height: u32,
		stopped: &(dyn Fn() -> bool + Sync),
	) -> Result<Arc<ChainState>, Error> {
		let meta = populator.populate(block, branch, preceding, fork_point)?;

		BlockAcceptor::new(block, &meta.state, &self.consensus, height, stopped).check()?;
		BlockConnector::new(block, &meta, self.chain.as_reader(), &*self.script_executor, &self.consensus, height, stopped).check()?;

		let elapsed = meta.started.elapsed();
		trace!(
			target: "blockchain",
			"Block [{}] verified ({}) txs in {}.{:03} secs",
			height, block.transactions.len(), elapsed.as_secs(), elapsed.subsec_millis()
		);

		Ok(meta.state.clone())
	}

	/// Discards the failed block and all of its descendants from the pool
	/// and caches the failure so it is not validated again.
	fn clip(&self, block: &IndexedBlock, error: Error) {
		let hash = &block.header.hash;
		if error != Error::ServiceStopped {
			self.chain.cache_block_error(hash, error);
		}

		let mut pool = self.pool.lock();
		let descendants = pool.descendants(hash);
		pool.remove(hash);
		for descendant in descendants {
			pool.remove(&descendant);
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::mpsc::channel;
	use test_data::{genesis, next_block, MemoryFastChain, TransactionBuilder};
	use chain::IndexedBlock;
	use network::{ConsensusParams, Network};
	use parking_lot::Mutex;
	use verification::{Error, FastChainReader, NoopExecutor};
	use super::Organizer;

	fn organize_sync(organizer: &Organizer, block: IndexedBlock) -> Result<(), Error> {
		let (sender, receiver) = channel();
		organizer.organize(block, Box::new(move |result| {
			sender.send(result).unwrap();
		}));
		receiver.recv().unwrap()
	}

	fn setup(blocks: Vec<IndexedBlock>) -> (Arc<MemoryFastChain>, Organizer) {
		let chain = Arc::new(MemoryFastChain::with_blocks(blocks));
		let organizer = Organizer::new(chain.clone(), Arc::new(NoopExecutor), ConsensusParams::new(Network::Unitest));
		organizer.start();
		(chain, organizer)
	}

	#[test]
	fn test_organize_rejects_while_stopped() {
		let chain = Arc::new(MemoryFastChain::new(genesis()));
		let organizer = Organizer::new(chain, Arc::new(NoopExecutor), ConsensusParams::new(Network::Unitest));
		let block = next_block(&genesis()).build();
		assert_eq!(organize_sync(&organizer, block), Err(Error::ServiceStopped));
	}

	#[test]
	fn test_organize_extends_chain() {
		let (chain, organizer) = setup(vec![genesis()]);
		let block1 = next_block(&genesis()).build();

		assert_eq!(organize_sync(&organizer, block1.clone()), Ok(()));
		assert_eq!(chain.top_height(true), Some(1));
		assert_eq!(chain.block_hash(1, true), Some(block1.header.hash.clone()));
		// committed blocks leave the pool
		assert_eq!(organizer.pool_size(), 0);
	}

	#[test]
	fn test_organize_rejects_duplicate() {
		let (_, organizer) = setup(vec![genesis()]);
		let block1 = next_block(&genesis()).build();

		assert_eq!(organize_sync(&organizer, block1.clone()), Ok(()));
		assert_eq!(organize_sync(&organizer, block1), Err(Error::Duplicate));
	}

	#[test]
	fn test_organize_pools_orphan_until_parent_arrives() {
		let (chain, organizer) = setup(vec![genesis()]);
		let block1 = next_block(&genesis()).build();
		let block2 = next_block(&block1).build();

		// the orphan waits for its parent
		assert_eq!(organize_sync(&organizer, block2.clone()), Ok(()));
		assert_eq!(chain.top_height(true), Some(0));
		assert_eq!(organizer.pool_size(), 1);

		// the parent pulls the whole branch in
		assert_eq!(organize_sync(&organizer, block1.clone()), Ok(()));
		assert_eq!(chain.top_height(true), Some(2));
		assert_eq!(chain.block_hash(2, true), Some(block2.header.hash.clone()));
		assert_eq!(organizer.pool_size(), 0);
	}

	#[test]
	fn test_organize_keeps_lighter_branch_pooled() {
		let (chain, organizer) = setup(vec![genesis()]);
		let block1 = next_block(&genesis()).build();
		assert_eq!(organize_sync(&organizer, block1.clone()), Ok(()));

		// a sibling of the indexed top claims no more work than the chain
		let sibling = ::test_data::block_builder()
			.parent(genesis().header.hash.clone())
			.time(genesis().header.raw.time + 1200)
			.bits(block1.header.raw.bits)
			.coinbase(50 * 100_000_000)
			.build();
		assert_eq!(organize_sync(&organizer, sibling.clone()), Ok(()));
		assert_eq!(chain.top_height(true), Some(1));
		assert_eq!(chain.block_hash(1, true), Some(block1.header.hash.clone()));
		assert_eq!(organizer.pool_size(), 1);
	}

	#[test]
	fn test_organize_reorganizes_to_heavier_branch() {
		let (chain, organizer) = setup(vec![genesis()]);
		let block1 = next_block(&genesis()).build();
		assert_eq!(organize_sync(&organizer, block1.clone()), Ok(()));

		let events = Arc::new(Mutex::new(Vec::new()));
		let observed = events.clone();
		organizer.subscriptions().subscribe(Box::new(move |event| {
			observed.lock().push((event.fork_point, event.incoming.len(), event.outgoing.len()));
		}));

		// a two block branch from the genesis outweighs the single block
		let sibling1 = ::test_data::block_builder()
			.parent(genesis().header.hash.clone())
			.time(genesis().header.raw.time + 1200)
			.bits(block1.header.raw.bits)
			.coinbase(49 * 100_000_000)
			.build();
		let sibling2 = next_block(&sibling1).build();

		assert_eq!(organize_sync(&organizer, sibling1.clone()), Ok(()));
		assert_eq!(chain.top_height(true), Some(1));

		assert_eq!(organize_sync(&organizer, sibling2.clone()), Ok(()));
		assert_eq!(chain.top_height(true), Some(2));
		assert_eq!(chain.block_hash(1, true), Some(sibling1.header.hash.clone()));
		assert_eq!(chain.block_hash(2, true), Some(sibling2.header.hash.clone()));

		// one fork event, carrying the displaced block
		assert_eq!(*events.lock(), vec![(0, 2, 1)]);

		// the displaced block returns to the pool
		assert_eq!(organizer.pool_size(), 1);
	}

	#[test]
	fn test_organize_clips_invalid_branch() {
		let (chain, organizer) = setup(vec![genesis()]);

		// bits differ from the required work, acceptance fails
		let invalid = next_block(&genesis()).bits(0x2100fff0).build();
		let child = next_block(&invalid).build();

		assert_eq!(organize_sync(&organizer, child.clone()), Ok(()));
		assert_eq!(organize_sync(&organizer, invalid.clone()), Err(Error::IncorrectProofOfWork));

		// the failure is cached and the subtree is gone
		assert_eq!(chain.block_error(&invalid.header.hash), Some(Error::IncorrectProofOfWork));
		assert_eq!(organizer.pool_size(), 0);
		assert_eq!(chain.top_height(true), Some(0));

		// re-announcing the invalid block short-circuits
		assert_eq!(organize_sync(&organizer, invalid), Err(Error::IncorrectProofOfWork));
	}

	#[test]
	fn test_organize_caches_context_free_failures() {
		let (chain, organizer) = setup(vec![genesis()]);

		let no_coinbase = ::test_data::block_builder()
			.parent(genesis().header.hash.clone())
			.time(genesis().header.raw.time + 600)
			.transaction(TransactionBuilder::with_input(&genesis().transactions[0].raw, 0).add_output(1).transaction)
			.build();

		assert_eq!(organize_sync(&organizer, no_coinbase.clone()), Err(Error::FirstNotCoinbase));
		assert_eq!(chain.block_error(&no_coinbase.header.hash), Some(Error::FirstNotCoinbase));
	}
}

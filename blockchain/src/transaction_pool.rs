//! Bounded pool of unconfirmed transactions, kept consistent with the
//! organizer through one-shot fork event subscriptions.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use parking_lot::Mutex;
use chain::{BlockHeader, IndexedTransaction, Transaction};
use primitives::hash::H256;
use verification::{
	Error, FastChain, ScriptExecutor, TransactionState, TransactionVerifier,
	COINBASE_MATURITY, MAX_MONEY, NO_FORK_HEIGHT,
};
use executor::OrderedExecutor;
use organizer::{ForkEvent, ForkSubscriptions};

/// Fired exactly once per stored entry: on confirmation, displacement or
/// reorganization.
pub type ConfirmHandler = Box<dyn FnOnce(Result<(), Error>) + Send>;

/// Receives the validation outcome: the indexes of inputs resolved from
/// the pool rather than the chain, or the failure.
pub type ValidateHandler = Box<dyn FnOnce(Result<Vec<usize>, Error>) + Send>;

pub type FetchHandler = Box<dyn FnOnce(Result<Transaction, Error>) + Send>;

pub type ExistsHandler = Box<dyn FnOnce(bool) + Send>;

struct TransactionEntry {
	hash: H256,
	transaction: Transaction,
	on_confirm: ConfirmHandler,
}

struct PoolContext {
	chain: Arc<dyn FastChain + Send + Sync>,
	script_executor: Arc<dyn ScriptExecutor>,
	capacity: usize,
	ring: Mutex<VecDeque<TransactionEntry>>,
	stopped: AtomicBool,
}

/// The pool itself. All operations are serialized through an ordered
/// dispatcher, which is the only mutator of the ring.
pub struct TransactionPool {
	context: Arc<PoolContext>,
	executor: Arc<OrderedExecutor>,
}

impl TransactionPool {
	pub fn new(
		chain: Arc<dyn FastChain + Send + Sync>,
		script_executor: Arc<dyn ScriptExecutor>,
		capacity: usize,
	) -> Self {
		TransactionPool {
			context: Arc::new(PoolContext {
				chain: chain,
				script_executor: script_executor,
				capacity: capacity,
				ring: Mutex::new(VecDeque::with_capacity(capacity)),
				stopped: AtomicBool::new(true),
			}),
			executor: Arc::new(OrderedExecutor::new("transaction pool")),
		}
	}

	/// Starts the pool and subscribes it to reorganization events.
	pub fn start(&self, subscriptions: &Arc<ForkSubscriptions>) {
		self.context.stopped.store(false, Ordering::SeqCst);
		subscribe_reorganize(subscriptions.clone(), self.context.clone(), self.executor.clone());
	}

	pub fn stop(&self) {
		self.context.stopped.store(true, Ordering::SeqCst);
	}

	pub fn size(&self) -> usize {
		self.context.ring.lock().len()
	}

	pub fn capacity(&self) -> usize {
		self.context.capacity
	}

	/// Runs transaction-level validation and reports the unconfirmed-input
	/// index list.
	pub fn validate(&self, transaction: Transaction, handler: ValidateHandler) {
		let context = self.context.clone();
		self.executor.execute(move || {
			let result = context.validate(&transaction.into());
			handler(result);
		});
	}

	/// Validates and stores. At capacity the displaced entry's confirm
	/// handler fires with `PoolFilled`.
	pub fn store(&self, transaction: Transaction, on_confirm: ConfirmHandler, handler: ValidateHandler) {
		let context = self.context.clone();
		self.executor.execute(move || {
			let indexed: IndexedTransaction = transaction.into();
			let result = context.validate(&indexed);
			if result.is_ok() {
				context.store(indexed, on_confirm);
			}
			handler(result);
		});
	}

	pub fn fetch(&self, hash: H256, handler: FetchHandler) {
		let context = self.context.clone();
		self.executor.execute(move || {
			if context.is_stopped() {
				return handler(Err(Error::ServiceStopped));
			}

			let result = context.ring.lock().iter()
				.find(|entry| entry.hash == hash)
				.map(|entry| entry.transaction.clone())
				.ok_or(Error::NotFound);
			handler(result);
		});
	}

	pub fn exists(&self, hash: H256, handler: ExistsHandler) {
		let context = self.context.clone();
		self.executor.execute(move || {
			let exists = context.ring.lock().iter().any(|entry| entry.hash == hash);
			handler(exists);
		});
	}
}

/// One-shot subscription: the handler defers reconciliation to the pool's
/// ordered path and immediately re-subscribes.
fn subscribe_reorganize(subscriptions: Arc<ForkSubscriptions>, context: Arc<PoolContext>, executor: Arc<OrderedExecutor>) {
	let resubscribe = subscriptions.clone();
	subscriptions.subscribe(Box::new(move |event: &ForkEvent| {
		let event = event.clone();
		let context = context.clone();
		let reconcile_context = context.clone();
		executor.execute(move || reconcile_context.reconcile(&event));
		subscribe_reorganize(resubscribe.clone(), context, executor.clone());
	}));
}

impl PoolContext {
	fn is_stopped(&self) -> bool {
		self.stopped.load(Ordering::SeqCst)
	}

	fn validate(&self, transaction: &IndexedTransaction) -> Result<Vec<usize>, Error> {
		if self.is_stopped() {
			return Err(Error::ServiceStopped);
		}

		TransactionVerifier::new(transaction).check()?;

		if transaction.raw.is_coinbase() {
			return Err(Error::CoinbaseTransaction);
		}

		if let Some(error) = self.chain.transaction_error(&transaction.hash) {
			return Err(error);
		}

		{
			let ring = self.ring.lock();
			if ring.iter().any(|entry| entry.hash == transaction.hash) {
				return Err(Error::Duplicate);
			}

			// An output spent by a pooled transaction is gone already.
			let double_spend = transaction.raw.inputs.iter().any(|input| {
				ring.iter().any(|entry| entry.transaction.inputs.iter()
					.any(|spent| spent.previous_output == input.previous_output))
			});
			if double_spend {
				return Err(Error::DoubleSpend);
			}
		}

		match self.chain.transaction_state(&transaction.hash) {
			TransactionState::Confirmed | TransactionState::Indexed => return Err(Error::Duplicate),
			_ => (),
		}

		let top_height = self.chain.top_height(true).ok_or(Error::OperationFailed)?;
		// Scripts execute against the height the transaction would
		// confirm at.
		let next_height = top_height + 1;
		let context_header = BlockHeader {
			version: 0,
			previous_header_hash: H256::default(),
			merkle_root_hash: H256::default(),
			time: 0,
			bits: 0,
			nonce: 0,
		};

		let mut unconfirmed = Vec::new();
		let mut value_in = 0u64;

		for (index, input) in transaction.raw.inputs.iter().enumerate() {
			let meta = self.chain.populate_output(&input.previous_output, NO_FORK_HEIGHT);
			let output = match meta.cache {
				Some(output) => output,
				None => {
					// The parent may itself be waiting in the pool.
					let ring = self.ring.lock();
					let pooled = ring.iter()
						.find(|entry| entry.hash == input.previous_output.hash)
						.and_then(|entry| entry.transaction.outputs.get(input.previous_output.index as usize))
						.cloned();
					match pooled {
						Some(output) => {
							unconfirmed.push(index);
							output
						},
						None => return Err(Error::InputNotFound),
					}
				},
			};

			if meta.spent {
				return Err(Error::DoubleSpend);
			}

			if let Some(coinbase_height) = meta.coinbase_height {
				if next_height.saturating_sub(coinbase_height) < COINBASE_MATURITY {
					return Err(Error::ValidateInputsFailed);
				}
			}

			let valid = self.script_executor.verify_consensus(
				&output.script_pubkey,
				&transaction.raw,
				index,
				&context_header,
				next_height,
			);
			if !valid {
				return Err(Error::ValidateInputsFailed);
			}

			value_in = value_in.checked_add(output.value).ok_or(Error::ValidateInputsFailed)?;
			if value_in > MAX_MONEY {
				return Err(Error::ValidateInputsFailed);
			}
		}

		if value_in < transaction.raw.total_spends() {
			return Err(Error::ValidateInputsFailed);
		}

		Ok(unconfirmed)
	}

	fn store(&self, transaction: IndexedTransaction, on_confirm: ConfirmHandler) {
		let mut ring = self.ring.lock();

		// The oldest entry makes room, its owner learns it was displaced.
		if ring.len() == self.capacity {
			if let Some(displaced) = ring.pop_front() {
				(displaced.on_confirm)(Err(Error::PoolFilled));
			}
		}

		let _ = self.chain.push_transaction(transaction.clone());

		debug!(target: "blockchain", "Transaction saved to mempool ({})", ring.len() + 1);
		ring.push_back(TransactionEntry {
			hash: transaction.hash,
			transaction: transaction.raw,
			on_confirm: on_confirm,
		});
	}

	fn reconcile(&self, event: &ForkEvent) {
		if self.is_stopped() {
			return;
		}

		debug!(
			target: "blockchain",
			"Reorganize: tx pool size ({}) new blocks ({}) replaced blocks ({})",
			self.ring.lock().len(), event.incoming.len(), event.outgoing.len()
		);

		if event.outgoing.is_empty() {
			// A pure extension confirms pooled transactions.
			for block in &event.incoming {
				for transaction in &block.transactions {
					self.try_delete(&transaction.hash);
				}
			}
		} else {
			// A true reorganization invalidates every pooled transaction.
			self.invalidate();
		}
	}

	fn try_delete(&self, hash: &H256) {
		let entry = {
			let mut ring = self.ring.lock();
			match ring.iter().position(|entry| &entry.hash == hash) {
				Some(position) => ring.remove(position),
				None => None,
			}
		};

		if let Some(entry) = entry {
			(entry.on_confirm)(Ok(()));
		}
	}

	fn invalidate(&self) {
		let entries = {
			let mut ring = self.ring.lock();
			::std::mem::replace(&mut *ring, VecDeque::new())
		};

		for entry in entries {
			(entry.on_confirm)(Err(Error::BlockchainReorganized));
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::sync::mpsc::channel;
	use test_data::{genesis, next_block, MemoryFastChain, TransactionBuilder};
	use chain::{IndexedBlock, Transaction};
	use network::{ConsensusParams, Network};
	use parking_lot::Mutex;
	use verification::{Error, FastChainReader, NoopExecutor};
	use organizer::Organizer;
	use super::TransactionPool;

	fn long_chain(length: usize) -> Vec<IndexedBlock> {
		let mut blocks = vec![genesis()];
		while blocks.len() < length {
			blocks.push(next_block(blocks.last().unwrap()).build());
		}
		blocks
	}

	fn setup(blocks: Vec<IndexedBlock>, capacity: usize) -> (Arc<MemoryFastChain>, Organizer, TransactionPool) {
		let chain = Arc::new(MemoryFastChain::with_blocks(blocks));
		let consensus = ConsensusParams::new(Network::Unitest);
		let organizer = Organizer::new(chain.clone(), Arc::new(NoopExecutor), consensus);
		organizer.start();
		let pool = TransactionPool::new(chain.clone(), Arc::new(NoopExecutor), capacity);
		pool.start(&organizer.subscriptions());
		(chain, organizer, pool)
	}

	fn validate_sync(pool: &TransactionPool, transaction: Transaction) -> Result<Vec<usize>, Error> {
		let (sender, receiver) = channel();
		pool.validate(transaction, Box::new(move |result| {
			sender.send(result).unwrap();
		}));
		receiver.recv().unwrap()
	}

	fn store_sync(pool: &TransactionPool, transaction: Transaction, confirmations: Arc<Mutex<Vec<Result<(), Error>>>>) -> Result<Vec<usize>, Error> {
		let (sender, receiver) = channel();
		pool.store(
			transaction,
			Box::new(move |result| {
				confirmations.lock().push(result);
			}),
			Box::new(move |result| {
				sender.send(result).unwrap();
			}),
		);
		receiver.recv().unwrap()
	}

	fn exists_sync(pool: &TransactionPool, hash: ::primitives::hash::H256) -> bool {
		let (sender, receiver) = channel();
		pool.exists(hash, Box::new(move |exists| {
			sender.send(exists).unwrap();
		}));
		receiver.recv().unwrap()
	}

	#[test]
	fn test_pool_store_and_fetch() {
		let blocks = long_chain(102);
		let spend: Transaction = TransactionBuilder::with_input(&blocks[0].transactions[0].raw, 0).add_output(1).into();
		let (_, _organizer, pool) = setup(blocks, 10);

		let confirmations = Arc::new(Mutex::new(Vec::new()));
		assert_eq!(store_sync(&pool, spend.clone(), confirmations.clone()), Ok(vec![]));
		assert_eq!(pool.size(), 1);
		assert!(exists_sync(&pool, spend.hash()));

		let (sender, receiver) = channel();
		pool.fetch(spend.hash(), Box::new(move |result| {
			sender.send(result).unwrap();
		}));
		assert_eq!(receiver.recv().unwrap(), Ok(spend.clone()));

		// nothing confirmed anything yet
		assert!(confirmations.lock().is_empty());

		// storing the same transaction again is a duplicate
		assert_eq!(store_sync(&pool, spend, confirmations), Err(Error::Duplicate));
	}

	#[test]
	fn test_pool_rejects_coinbase() {
		let blocks = long_chain(3);
		let (_, _organizer, pool) = setup(blocks, 10);
		let fresh_coinbase: Transaction = TransactionBuilder::coinbase().add_output(1).into();
		assert_eq!(validate_sync(&pool, fresh_coinbase), Err(Error::CoinbaseTransaction));
	}

	#[test]
	fn test_pool_rejects_unknown_input()  {
		let blocks = long_chain(3);
		let unknown: Transaction = TransactionBuilder::default()
			.add_outpoint(::chain::OutPoint { hash: ::primitives::hash::H256::from(0xaa), index: 0 })
			.add_output(1)
			.into();
		let (_, _organizer, pool) = setup(blocks, 10);
		assert_eq!(validate_sync(&pool, unknown), Err(Error::InputNotFound));
	}

	#[test]
	fn test_pool_rejects_immature_coinbase_spend() {
		let blocks = long_chain(3);
		let spend: Transaction = TransactionBuilder::with_input(&blocks[1].transactions[0].raw, 0).add_output(1).into();
		let (_, _organizer, pool) = setup(blocks, 10);
		assert_eq!(validate_sync(&pool, spend), Err(Error::ValidateInputsFailed));
	}

	#[test]
	fn test_pool_reports_unconfirmed_parents() {
		let blocks = long_chain(102);
		let parent: Transaction = TransactionBuilder::with_input(&blocks[0].transactions[0].raw, 0).add_output(10).into();
		let child: Transaction = TransactionBuilder::with_input(&parent, 0).add_output(5).into();
		let (_, _organizer, pool) = setup(blocks, 10);

		let confirmations = Arc::new(Mutex::new(Vec::new()));
		assert_eq!(store_sync(&pool, parent, confirmations.clone()), Ok(vec![]));
		// the parent is pooled, not confirmed
		assert_eq!(store_sync(&pool, child, confirmations), Ok(vec![0]));
		assert_eq!(pool.size(), 2);
	}

	#[test]
	fn test_pool_rejects_double_spend_in_pool() {
		let blocks = long_chain(102);
		let first: Transaction = TransactionBuilder::with_input(&blocks[0].transactions[0].raw, 0).add_output(1).into();
		let second: Transaction = TransactionBuilder::with_input(&blocks[0].transactions[0].raw, 0).add_output(2).into();
		let (_, _organizer, pool) = setup(blocks, 10);

		let confirmations = Arc::new(Mutex::new(Vec::new()));
		assert_eq!(store_sync(&pool, first, confirmations), Ok(vec![]));
		assert_eq!(validate_sync(&pool, second), Err(Error::DoubleSpend));
	}

	#[test]
	fn test_pool_capacity_displaces_oldest() {
		let blocks = long_chain(103);
		let first: Transaction = TransactionBuilder::with_input(&blocks[0].transactions[0].raw, 0).add_output(1).into();
		let second: Transaction = TransactionBuilder::with_input(&blocks[1].transactions[0].raw, 0).add_output(2).into();
		let third: Transaction = TransactionBuilder::with_input(&blocks[2].transactions[0].raw, 0).add_output(3).into();
		let (_, _organizer, pool) = setup(blocks, 2);

		let confirmations = Arc::new(Mutex::new(Vec::new()));
		assert_eq!(store_sync(&pool, first.clone(), confirmations.clone()), Ok(vec![]));
		assert_eq!(store_sync(&pool, second, confirmations.clone()), Ok(vec![]));
		assert_eq!(store_sync(&pool, third, confirmations.clone()), Ok(vec![]));

		// the pool never exceeds its capacity and the displaced owner heard
		// about it
		assert_eq!(pool.size(), 2);
		assert!(!exists_sync(&pool, first.hash()));
		assert_eq!(*confirmations.lock(), vec![Err(Error::PoolFilled)]);
	}

	#[test]
	fn test_pool_confirms_transactions_mined_into_extension() {
		let blocks = long_chain(102);
		let spend: Transaction = TransactionBuilder::with_input(&blocks[0].transactions[0].raw, 0).add_output(1).into();
		let (_, organizer, pool) = setup(blocks.clone(), 10);

		let confirmed = Arc::new(AtomicUsize::new(0));
		let observed = confirmed.clone();
		let (sender, receiver) = channel();
		pool.store(
			spend.clone(),
			Box::new(move |result| {
				assert_eq!(result, Ok(()));
				observed.fetch_add(1, Ordering::SeqCst);
			}),
			Box::new(move |result| { sender.send(result).unwrap(); }),
		);
		assert_eq!(receiver.recv().unwrap(), Ok(vec![]));

		// a block mining the pooled transaction extends the chain
		let block = next_block(blocks.last().unwrap()).transaction(spend.clone()).build();
		let (sender, receiver) = channel();
		organizer.organize(block, Box::new(move |result| { sender.send(result).unwrap(); }));
		assert_eq!(receiver.recv().unwrap(), Ok(()));

		// the pool drains through its own ordered path
		assert!(!exists_sync(&pool, spend.hash()));
		assert_eq!(pool.size(), 0);
		assert_eq!(confirmed.load(Ordering::SeqCst), 1);
	}

	#[test]
	fn test_pool_invalidated_by_reorganization() {
		let blocks = long_chain(102);
		let spend: Transaction = TransactionBuilder::with_input(&blocks[0].transactions[0].raw, 0).add_output(1).into();
		let (chain, organizer, pool) = setup(blocks.clone(), 10);

		let reorganized = Arc::new(AtomicUsize::new(0));
		let observed = reorganized.clone();
		let (sender, receiver) = channel();
		pool.store(
			spend.clone(),
			Box::new(move |result| {
				assert_eq!(result, Err(Error::BlockchainReorganized));
				observed.fetch_add(1, Ordering::SeqCst);
			}),
			Box::new(move |result| { sender.send(result).unwrap(); }),
		);
		assert_eq!(receiver.recv().unwrap(), Ok(vec![]));

		// extend the chain by one block first
		let extension = next_block(blocks.last().unwrap()).build();
		let (sender, receiver) = channel();
		organizer.organize(extension, Box::new(move |result| { sender.send(result).unwrap(); }));
		assert_eq!(receiver.recv().unwrap(), Ok(()));
		assert!(exists_sync(&pool, spend.hash()));

		// then replace it with a heavier sibling branch
		let parent = blocks.last().unwrap();
		let sibling1 = ::test_data::block_builder()
			.parent(parent.header.hash.clone())
			.time(parent.header.raw.time + 1200)
			.bits(parent.header.raw.bits)
			.transaction(TransactionBuilder::default().add_coinbase_input("04deadbeef".into()).add_output(50 * 100_000_000).transaction)
			.build();
		let sibling2 = next_block(&sibling1).build();

		let (sender, receiver) = channel();
		organizer.organize(sibling1, Box::new(move |result| { sender.send(result).unwrap(); }));
		assert_eq!(receiver.recv().unwrap(), Ok(()));
		let (sender, receiver) = channel();
		organizer.organize(sibling2, Box::new(move |result| { sender.send(result).unwrap(); }));
		assert_eq!(receiver.recv().unwrap(), Ok(()));
		assert_eq!(chain.top_height(true), Some(103));

		// after the fork event the pool is empty and the owner observed the
		// reorganization exactly once
		assert!(!exists_sync(&pool, spend.hash()));
		assert_eq!(pool.size(), 0);
		assert_eq!(reorganized.load(Ordering::SeqCst), 1);
	}
}

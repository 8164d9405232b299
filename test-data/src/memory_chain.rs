//! In-memory fast chain used by tests in place of the storage engine.

use std::collections::HashMap;
use parking_lot::RwLock;
use chain::{IndexedBlock, IndexedTransaction, OutPoint, Transaction};
use primitives::hash::H256;
use primitives::uint::U256;
use verification::{
	block_state, Error, FastChainReader, FastChainWriter,
	OutputMeta, TransactionMeta, TransactionState,
};

#[derive(Default)]
struct Inner {
	blocks: Vec<IndexedBlock>,
	by_hash: HashMap<H256, u32>,
	transactions: HashMap<H256, (u32, Transaction)>,
	pooled: HashMap<H256, Transaction>,
	spends: HashMap<OutPoint, u32>,
	block_errors: HashMap<H256, Error>,
	transaction_errors: HashMap<H256, Error>,
	stale: bool,
}

impl Inner {
	fn index_block(&mut self, block: IndexedBlock) {
		let height = self.blocks.len() as u32;
		self.by_hash.insert(block.header.hash.clone(), height);

		for transaction in &block.transactions {
			self.transactions.insert(transaction.hash.clone(), (height, transaction.raw.clone()));
			self.pooled.remove(&transaction.hash);
		}

		for transaction in block.transactions.iter().skip(1) {
			for input in &transaction.raw.inputs {
				self.spends.insert(input.previous_output.clone(), height);
			}
		}

		self.blocks.push(block);
	}

	fn unindex_top(&mut self) -> Option<IndexedBlock> {
		let block = self.blocks.pop()?;
		let height = self.blocks.len() as u32;
		self.by_hash.remove(&block.header.hash);

		for transaction in &block.transactions {
			if self.transactions.get(&transaction.hash).map(|&(h, _)| h == height).unwrap_or(false) {
				self.transactions.remove(&transaction.hash);
			}
		}

		for transaction in block.transactions.iter().skip(1) {
			for input in &transaction.raw.inputs {
				if self.spends.get(&input.previous_output) == Some(&height) {
					self.spends.remove(&input.previous_output);
				}
			}
		}

		Some(block)
	}
}

/// A whole chain in memory. Header and block indexes coincide.
pub struct MemoryFastChain {
	inner: RwLock<Inner>,
}

impl MemoryFastChain {
	pub fn new(genesis: IndexedBlock) -> Self {
		MemoryFastChain::with_blocks(vec![genesis])
	}

	pub fn with_blocks(blocks: Vec<IndexedBlock>) -> Self {
		let mut inner = Inner::default();
		for block in blocks {
			inner.index_block(block);
		}

		MemoryFastChain {
			inner: RwLock::new(inner),
		}
	}

	pub fn set_stale(&self, stale: bool) {
		self.inner.write().stale = stale;
	}

	pub fn best_block(&self) -> Option<IndexedBlock> {
		self.inner.read().blocks.last().cloned()
	}
}

impl FastChainReader for MemoryFastChain {
	fn top_height(&self, _block_index: bool) -> Option<u32> {
		let inner = self.inner.read();
		match inner.blocks.len() {
			0 => None,
			len => Some(len as u32 - 1),
		}
	}

	fn block_height(&self, hash: &H256, _block_index: bool) -> Option<u32> {
		self.inner.read().by_hash.get(hash).cloned()
	}

	fn block_hash(&self, height: u32, _block_index: bool) -> Option<H256> {
		self.inner.read().blocks.get(height as usize).map(|block| block.header.hash.clone())
	}

	fn block_error(&self, hash: &H256) -> Option<Error> {
		self.inner.read().block_errors.get(hash).cloned()
	}

	fn transaction_error(&self, hash: &H256) -> Option<Error> {
		self.inner.read().transaction_errors.get(hash).cloned()
	}

	fn bits(&self, height: u32, _block_index: bool) -> Option<u32> {
		self.inner.read().blocks.get(height as usize).map(|block| block.header.raw.bits)
	}

	fn version(&self, height: u32, _block_index: bool) -> Option<u32> {
		self.inner.read().blocks.get(height as usize).map(|block| block.header.raw.version)
	}

	fn timestamp(&self, height: u32, _block_index: bool) -> Option<u32> {
		self.inner.read().blocks.get(height as usize).map(|block| block.header.raw.time)
	}

	fn work(&self, maximum: &U256, above_height: u32, _block_index: bool) -> U256 {
		let inner = self.inner.read();
		let mut total = U256::zero();
		for block in inner.blocks.iter().skip(above_height as usize + 1) {
			total = total + block.header.raw.proof();
			if total > *maximum {
				break;
			}
		}
		total
	}

	fn block_state(&self, hash: &H256) -> u8 {
		let inner = self.inner.read();
		let mut state = 0;
		if inner.by_hash.contains_key(hash) {
			state |= block_state::STORED | block_state::INDEXED | block_state::VALIDATED;
		}
		if inner.block_errors.contains_key(hash) {
			state |= block_state::FAILED;
		}
		state
	}

	fn transaction_state(&self, hash: &H256) -> TransactionState {
		let inner = self.inner.read();
		if inner.transactions.contains_key(hash) {
			TransactionState::Confirmed
		} else if inner.pooled.contains_key(hash) {
			TransactionState::Pooled
		} else if inner.transaction_errors.contains_key(hash) {
			TransactionState::Failed
		} else {
			TransactionState::Missing
		}
	}

	fn populate_transaction(&self, hash: &H256, _forks: u32, fork_height: u32) -> TransactionMeta {
		let inner = self.inner.read();
		match inner.transactions.get(hash) {
			Some(&(height, _)) if height <= fork_height => TransactionMeta {
				state: TransactionState::Confirmed,
				duplicate: true,
			},
			_ => TransactionMeta::default(),
		}
	}

	fn populate_output(&self, outpoint: &OutPoint, fork_height: u32) -> OutputMeta {
		let inner = self.inner.read();
		let (height, transaction) = match inner.transactions.get(&outpoint.hash) {
			Some(&(height, ref transaction)) if height <= fork_height => (height, transaction),
			_ => return OutputMeta::missing(),
		};

		let output = match transaction.outputs.get(outpoint.index as usize) {
			Some(output) => output,
			None => return OutputMeta::missing(),
		};

		OutputMeta {
			cache: Some(output.clone()),
			spent: inner.spends.get(outpoint).map(|&spender| spender <= fork_height).unwrap_or(false),
			confirmed: true,
			coinbase_height: if transaction.is_coinbase() { Some(height) } else { None },
		}
	}

	fn is_output_spent(&self, outpoint: &OutPoint) -> bool {
		self.inner.read().spends.contains_key(outpoint)
	}

	fn is_blocks_stale(&self) -> bool {
		self.inner.read().stale
	}

	fn is_headers_stale(&self) -> bool {
		self.inner.read().stale
	}
}

impl FastChainWriter for MemoryFastChain {
	fn push_transaction(&self, transaction: IndexedTransaction) -> Result<(), Error> {
		let mut inner = self.inner.write();
		inner.pooled.insert(transaction.hash, transaction.raw);
		Ok(())
	}

	fn reorganize(&self, fork_point: u32, incoming: &[IndexedBlock]) -> Result<Vec<IndexedBlock>, Error> {
		let mut inner = self.inner.write();
		if fork_point as usize >= inner.blocks.len() {
			return Err(Error::OperationFailed);
		}

		let mut displaced = Vec::new();
		while inner.blocks.len() as u32 > fork_point + 1 {
			displaced.push(inner.unindex_top().expect("length checked above"));
		}
		displaced.reverse();

		for block in incoming {
			inner.index_block(block.clone());
		}

		Ok(displaced)
	}

	fn cache_block_error(&self, hash: &H256, error: Error) {
		self.inner.write().block_errors.insert(hash.clone(), error);
	}

	fn cache_transaction_error(&self, hash: &H256, error: Error) {
		self.inner.write().transaction_errors.insert(hash.clone(), error);
	}
}

#[cfg(test)]
mod tests {
	use chain_builder::{genesis, next_block};
	use verification::FastChainReader;
	use verification::FastChainWriter;
	use super::MemoryFastChain;

	#[test]
	fn test_memory_chain_indexing() {
		let genesis = genesis();
		let block1 = next_block(&genesis).build();
		let chain = MemoryFastChain::with_blocks(vec![genesis.clone(), block1.clone()]);

		assert_eq!(chain.top_height(true), Some(1));
		assert_eq!(chain.block_hash(1, true), Some(block1.header.hash.clone()));
		assert_eq!(chain.block_height(&block1.header.hash, true), Some(1));
		assert_eq!(chain.timestamp(0, true), Some(genesis.header.raw.time));
	}

	#[test]
	fn test_memory_chain_reorganize() {
		let genesis = genesis();
		let block1 = next_block(&genesis).build();
		let chain = MemoryFastChain::with_blocks(vec![genesis.clone(), block1.clone()]);

		let block1b = next_block(&genesis).time(genesis.header.raw.time + 1200).build();
		let block2b = next_block(&block1b).build();

		let displaced = chain.reorganize(0, &[block1b.clone(), block2b.clone()]).unwrap();
		assert_eq!(displaced, vec![block1]);
		assert_eq!(chain.top_height(true), Some(2));
		assert_eq!(chain.block_hash(2, true), Some(block2b.header.hash));
	}
}

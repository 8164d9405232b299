//! Context-free block checks. These depend on nothing but the block
//! itself and can run before the block is pooled.

use std::collections::HashSet;
use chain::{IndexedBlock, IndexedTransaction};
use primitives::compact::Compact;
use network::ConsensusParams;
use sigops::legacy_sigops_count;
use work::is_valid_proof_of_work;
use constants::{MAX_BLOCK_SIZE, MAX_BLOCK_SIGOPS, BLOCK_MAX_FUTURE, MAX_MONEY, MIN_COINBASE_SIZE, MAX_COINBASE_SIZE};
use error::Error;

pub struct BlockVerifier<'a> {
	pub size: BlockSize<'a>,
	pub proof_of_work: BlockProofOfWork<'a>,
	pub timestamp: BlockTimestamp<'a>,
	pub coinbase: BlockCoinbase<'a>,
	pub extra_coinbases: BlockExtraCoinbases<'a>,
	pub transactions: Vec<TransactionVerifier<'a>>,
	pub uniqueness: BlockTransactionsUniqueness<'a>,
	pub sigops: BlockSigops<'a>,
	pub merkle_root: BlockMerkleRoot<'a>,
	stopped: &'a (dyn Fn() -> bool + Sync),
}

impl<'a> BlockVerifier<'a> {
	pub fn new(block: &'a IndexedBlock, consensus: &ConsensusParams, current_time: u32, stopped: &'a (dyn Fn() -> bool + Sync)) -> Self {
		BlockVerifier {
			size: BlockSize::new(block, MAX_BLOCK_SIZE),
			proof_of_work: BlockProofOfWork::new(block, consensus.network.max_work_bits()),
			timestamp: BlockTimestamp::new(block, current_time + BLOCK_MAX_FUTURE),
			coinbase: BlockCoinbase::new(block),
			extra_coinbases: BlockExtraCoinbases::new(block),
			transactions: block.transactions.iter().map(TransactionVerifier::new).collect(),
			uniqueness: BlockTransactionsUniqueness::new(block),
			sigops: BlockSigops::new(block, MAX_BLOCK_SIGOPS),
			merkle_root: BlockMerkleRoot::new(block),
			stopped: stopped,
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		self.size.check()?;
		self.proof_of_work.check()?;
		self.ensure_running()?;
		self.timestamp.check()?;
		self.ensure_running()?;
		self.coinbase.check()?;
		self.extra_coinbases.check()?;
		for transaction in &self.transactions {
			self.ensure_running()?;
			transaction.check()?;
		}
		self.ensure_running()?;
		self.uniqueness.check()?;
		self.ensure_running()?;
		self.sigops.check()?;
		self.ensure_running()?;
		self.merkle_root.check()?;
		Ok(())
	}

	fn ensure_running(&self) -> Result<(), Error> {
		if (self.stopped)() {
			Err(Error::ServiceStopped)
		} else {
			Ok(())
		}
	}
}

trait BlockRule {
	fn check(&self) -> Result<(), Error>;
}

pub struct BlockSize<'a> {
	block: &'a IndexedBlock,
	max_size: usize,
}

impl<'a> BlockSize<'a> {
	fn new(block: &'a IndexedBlock, max_size: usize) -> Self {
		BlockSize {
			block: block,
			max_size: max_size,
		}
	}
}

impl<'a> BlockRule for BlockSize<'a> {
	fn check(&self) -> Result<(), Error> {
		let transactions = self.block.transactions.len();
		if transactions == 0 || transactions > self.max_size || self.block.size() > self.max_size {
			Err(Error::SizeLimits)
		} else {
			Ok(())
		}
	}
}

pub struct BlockProofOfWork<'a> {
	block: &'a IndexedBlock,
	max_work_bits: Compact,
}

impl<'a> BlockProofOfWork<'a> {
	fn new(block: &'a IndexedBlock, max_work_bits: Compact) -> Self {
		BlockProofOfWork {
			block: block,
			max_work_bits: max_work_bits,
		}
	}
}

impl<'a> BlockRule for BlockProofOfWork<'a> {
	fn check(&self) -> Result<(), Error> {
		let header = &self.block.header;
		if is_valid_proof_of_work(self.max_work_bits, Compact::new(header.raw.bits), &header.hash) {
			Ok(())
		} else {
			Err(Error::ProofOfWork)
		}
	}
}

pub struct BlockTimestamp<'a> {
	block: &'a IndexedBlock,
	max_time: u32,
}

impl<'a> BlockTimestamp<'a> {
	fn new(block: &'a IndexedBlock, max_time: u32) -> Self {
		BlockTimestamp {
			block: block,
			max_time: max_time,
		}
	}
}

impl<'a> BlockRule for BlockTimestamp<'a> {
	fn check(&self) -> Result<(), Error> {
		if self.block.header.raw.time <= self.max_time {
			Ok(())
		} else {
			Err(Error::FuturisticTimestamp)
		}
	}
}

pub struct BlockCoinbase<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockCoinbase<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockCoinbase {
			block: block,
		}
	}
}

impl<'a> BlockRule for BlockCoinbase<'a> {
	fn check(&self) -> Result<(), Error> {
		if self.block.transactions.first().map(|tx| tx.raw.is_coinbase()).unwrap_or(false) {
			Ok(())
		} else {
			Err(Error::FirstNotCoinbase)
		}
	}
}

pub struct BlockExtraCoinbases<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockExtraCoinbases<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockExtraCoinbases {
			block: block,
		}
	}
}

impl<'a> BlockRule for BlockExtraCoinbases<'a> {
	fn check(&self) -> Result<(), Error> {
		let misplaced = self.block.transactions.iter()
			.skip(1)
			.any(|tx| tx.raw.is_coinbase());

		if misplaced {
			Err(Error::ExtraCoinbases)
		} else {
			Ok(())
		}
	}
}

/// Context-free checks of a single transaction.
pub struct TransactionVerifier<'a> {
	transaction: &'a IndexedTransaction,
}

impl<'a> TransactionVerifier<'a> {
	pub fn new(transaction: &'a IndexedTransaction) -> Self {
		TransactionVerifier {
			transaction: transaction,
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		let transaction = &self.transaction.raw;
		if transaction.is_empty() {
			return Err(Error::EmptyTransaction);
		}

		let mut total = 0u64;
		for output in &transaction.outputs {
			if output.value > MAX_MONEY {
				return Err(Error::OutputValueOverflow);
			}
			total = total.saturating_add(output.value);
			if total > MAX_MONEY {
				return Err(Error::OutputValueOverflow);
			}
		}

		if transaction.is_coinbase() {
			let script_len = transaction.inputs[0].script_sig.len();
			if script_len < MIN_COINBASE_SIZE || script_len > MAX_COINBASE_SIZE {
				return Err(Error::InvalidCoinbaseScriptSize);
			}
		} else if transaction.is_null() {
			return Err(Error::PreviousOutputNull);
		}

		Ok(())
	}
}

pub struct BlockTransactionsUniqueness<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockTransactionsUniqueness<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockTransactionsUniqueness {
			block: block,
		}
	}
}

impl<'a> BlockRule for BlockTransactionsUniqueness<'a> {
	fn check(&self) -> Result<(), Error> {
		// Distinctness over the full set, not only adjacent duplicates.
		let hashes = self.block.transactions.iter().map(|tx| tx.hash.clone()).collect::<HashSet<_>>();
		if hashes.len() == self.block.transactions.len() {
			Ok(())
		} else {
			Err(Error::Duplicate)
		}
	}
}

pub struct BlockSigops<'a> {
	block: &'a IndexedBlock,
	max_sigops: usize,
}

impl<'a> BlockSigops<'a> {
	fn new(block: &'a IndexedBlock, max_sigops: usize) -> Self {
		BlockSigops {
			block: block,
			max_sigops: max_sigops,
		}
	}
}

impl<'a> BlockRule for BlockSigops<'a> {
	fn check(&self) -> Result<(), Error> {
		let sigops = legacy_sigops_count(self.block.transactions.iter().map(|tx| &tx.raw));
		if sigops > self.max_sigops {
			Err(Error::TooManySigs)
		} else {
			Ok(())
		}
	}
}

pub struct BlockMerkleRoot<'a> {
	block: &'a IndexedBlock,
}

impl<'a> BlockMerkleRoot<'a> {
	fn new(block: &'a IndexedBlock) -> Self {
		BlockMerkleRoot {
			block: block,
		}
	}
}

impl<'a> BlockRule for BlockMerkleRoot<'a> {
	fn check(&self) -> Result<(), Error> {
		if self.block.merkle_root() == self.block.header.raw.merkle_root_hash {
			Ok(())
		} else {
			Err(Error::MerkleMismatch)
		}
	}
}

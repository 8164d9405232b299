//! Contextual block checks, requiring the chain state at the block's
//! height.

use chain::IndexedBlock;
use primitives::compact::Compact;
use network::{checkpoint, ConsensusParams};
use script::{Builder, Num};
use chain_state::ChainState;
use error::Error;

pub struct BlockAcceptor<'a> {
	pub work: BlockWork<'a>,
	pub median_timestamp: BlockMedianTimestamp<'a>,
	pub finality: BlockFinality<'a>,
	pub checkpoint: BlockCheckpoint<'a>,
	pub version: BlockVersion<'a>,
	pub coinbase_height: BlockCoinbaseHeight<'a>,
	stopped: &'a (dyn Fn() -> bool + Sync),
}

impl<'a> BlockAcceptor<'a> {
	pub fn new(
		block: &'a IndexedBlock,
		state: &'a ChainState,
		consensus: &'a ConsensusParams,
		height: u32,
		stopped: &'a (dyn Fn() -> bool + Sync),
	) -> Self {
		BlockAcceptor {
			work: BlockWork::new(block, state),
			median_timestamp: BlockMedianTimestamp::new(block, state),
			finality: BlockFinality::new(block, height),
			checkpoint: BlockCheckpoint::new(block, consensus, height),
			version: BlockVersion::new(block, consensus, height),
			coinbase_height: BlockCoinbaseHeight::new(block, consensus, height),
			stopped: stopped,
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		self.work.check()?;
		self.ensure_running()?;
		self.median_timestamp.check()?;
		self.ensure_running()?;
		self.finality.check()?;
		self.ensure_running()?;
		self.checkpoint.check()?;
		self.ensure_running()?;
		self.version.check()?;
		self.ensure_running()?;
		self.coinbase_height.check()?;
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

pub struct BlockWork<'a> {
	block: &'a IndexedBlock,
	state: &'a ChainState,
}

impl<'a> BlockWork<'a> {
	fn new(block: &'a IndexedBlock, state: &'a ChainState) -> Self {
		BlockWork {
			block: block,
			state: state,
		}
	}
}

impl<'a> BlockRule for BlockWork<'a> {
	fn check(&self) -> Result<(), Error> {
		if Compact::new(self.block.header.raw.bits) == self.state.work_required() {
			Ok(())
		} else {
			Err(Error::IncorrectProofOfWork)
		}
	}
}

pub struct BlockMedianTimestamp<'a> {
	block: &'a IndexedBlock,
	state: &'a ChainState,
}

impl<'a> BlockMedianTimestamp<'a> {
	fn new(block: &'a IndexedBlock, state: &'a ChainState) -> Self {
		BlockMedianTimestamp {
			block: block,
			state: state,
		}
	}
}

impl<'a> BlockRule for BlockMedianTimestamp<'a> {
	fn check(&self) -> Result<(), Error> {
		if self.block.header.raw.time > self.state.median_time_past() {
			Ok(())
		} else {
			Err(Error::TimestampTooEarly)
		}
	}
}

pub struct BlockFinality<'a> {
	block: &'a IndexedBlock,
	height: u32,
}

impl<'a> BlockFinality<'a> {
	fn new(block: &'a IndexedBlock, height: u32) -> Self {
		BlockFinality {
			block: block,
			height: height,
		}
	}
}

impl<'a> BlockRule for BlockFinality<'a> {
	fn check(&self) -> Result<(), Error> {
		if self.block.is_final(self.height) {
			Ok(())
		} else {
			Err(Error::NonFinalTransaction)
		}
	}
}

pub struct BlockCheckpoint<'a> {
	block: &'a IndexedBlock,
	consensus: &'a ConsensusParams,
	height: u32,
}

impl<'a> BlockCheckpoint<'a> {
	fn new(block: &'a IndexedBlock, consensus: &'a ConsensusParams, height: u32) -> Self {
		BlockCheckpoint {
			block: block,
			consensus: consensus,
			height: height,
		}
	}
}

impl<'a> BlockRule for BlockCheckpoint<'a> {
	fn check(&self) -> Result<(), Error> {
		if checkpoint::validate(&self.block.header.hash, self.height, &self.consensus.checkpoints) {
			Ok(())
		} else {
			Err(Error::CheckpointsFailed)
		}
	}
}

pub struct BlockVersion<'a> {
	block: &'a IndexedBlock,
	consensus: &'a ConsensusParams,
	height: u32,
}

impl<'a> BlockVersion<'a> {
	fn new(block: &'a IndexedBlock, consensus: &'a ConsensusParams, height: u32) -> Self {
		BlockVersion {
			block: block,
			consensus: consensus,
			height: height,
		}
	}
}

impl<'a> BlockRule for BlockVersion<'a> {
	fn check(&self) -> Result<(), Error> {
		// Reject version 1 blocks after the switchover point.
		if self.block.header.raw.version < 2 && self.height > self.consensus.max_version1_height {
			Err(Error::OldVersionBlock)
		} else {
			Ok(())
		}
	}
}

pub struct BlockCoinbaseHeight<'a> {
	block: &'a IndexedBlock,
	consensus: &'a ConsensusParams,
	height: u32,
}

impl<'a> BlockCoinbaseHeight<'a> {
	fn new(block: &'a IndexedBlock, consensus: &'a ConsensusParams, height: u32) -> Self {
		BlockCoinbaseHeight {
			block: block,
			consensus: consensus,
			height: height,
		}
	}
}

impl<'a> BlockRule for BlockCoinbaseHeight<'a> {
	fn check(&self) -> Result<(), Error> {
		// There are old blocks with version incorrectly set to 2, below the
		// switchover point they are ignored.
		if self.block.header.raw.version < 2 || self.height <= self.consensus.max_version1_height {
			return Ok(());
		}

		let coinbase = match self.block.transactions.first() {
			Some(coinbase) => coinbase,
			None => return Err(Error::CoinbaseHeightMismatch),
		};

		let script_sig = match coinbase.raw.inputs.first() {
			Some(input) => &input.script_sig,
			None => return Err(Error::CoinbaseHeightMismatch),
		};

		// The coinbase script must begin with the serialized block height.
		let expected = Builder::default()
			.push_num(Num::from(self.height))
			.into_bytes();

		if script_sig.len() >= expected.len() && script_sig[..expected.len()] == expected[..] {
			Ok(())
		} else {
			Err(Error::CoinbaseHeightMismatch)
		}
	}
}

//! Input-connection checks. Preconditions: the populate pipeline has
//! attached previous-output metadata to every non-coinbase input, and the
//! populate to connect ordering is established by the caller.

use std::collections::HashSet;
use rayon::prelude::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use chain::{IndexedBlock, OutPoint};
use primitives::bytes::Bytes;
use network::{fork, ConsensusParams};
use script::Script;
use populate::BlockMeta;
use fast_chain::FastChainReader;
use script_executor::ScriptExecutor;
use sigops::{transaction_sigops, script_hash_sigops};
use work::block_reward_satoshi;
use constants::{MAX_BLOCK_SIGOPS, MAX_MONEY, COINBASE_MATURITY};
use error::Error;

pub struct BlockConnector<'a> {
	block: &'a IndexedBlock,
	meta: &'a BlockMeta,
	chain: &'a dyn FastChainReader,
	executor: &'a dyn ScriptExecutor,
	consensus: &'a ConsensusParams,
	height: u32,
	stopped: &'a (dyn Fn() -> bool + Sync),
}

impl<'a> BlockConnector<'a> {
	pub fn new(
		block: &'a IndexedBlock,
		meta: &'a BlockMeta,
		chain: &'a dyn FastChainReader,
		executor: &'a dyn ScriptExecutor,
		consensus: &'a ConsensusParams,
		height: u32,
		stopped: &'a (dyn Fn() -> bool + Sync),
	) -> Self {
		BlockConnector {
			block: block,
			meta: meta,
			chain: chain,
			executor: executor,
			consensus: consensus,
			height: height,
			stopped: stopped,
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		// Blocks under a checkpoint carry no input metadata and connect
		// trivially.
		if !self.meta.populated {
			return Ok(());
		}

		self.ensure_running()?;
		self.check_spent_duplicates()?;
		self.ensure_running()?;
		self.connect_inputs()
	}

	/// BIP30: a transaction whose id matches an earlier chain transaction
	/// is only allowed once every output of the earlier one is spent.
	fn check_spent_duplicates(&self) -> Result<(), Error> {
		if self.consensus.is_bip30_exception(self.height) {
			return Ok(());
		}

		let state = &self.meta.state;
		if !state.is_enabled(fork::BIP30) || state.is_enabled(fork::ALLOW_COLLISIONS) {
			return Ok(());
		}

		self.block.transactions.par_iter()
			.enumerate()
			.map(|(index, transaction)| {
				if !self.meta.transactions[index].duplicate {
					return Ok(());
				}

				let all_spent = (0..transaction.raw.outputs.len()).all(|output_index| {
					let outpoint = OutPoint {
						hash: transaction.hash.clone(),
						index: output_index as u32,
					};
					self.chain.is_output_spent(&outpoint)
				});

				if all_spent {
					Ok(())
				} else {
					Err(Error::DuplicateOrSpent)
				}
			})
			.reduce(|| Ok(()), |acc, check| acc.and(check))
	}

	fn connect_inputs(&self) -> Result<(), Error> {
		let mut total_sigops = 0usize;
		let mut fees = 0u64;
		let mut input_position = 0usize;
		let mut spent_in_block: HashSet<&OutPoint> = HashSet::new();
		let mut script_spends = Vec::new();

		for (tx_index, transaction) in self.block.transactions.iter().enumerate() {
			self.ensure_running()?;

			total_sigops += transaction_sigops(&transaction.raw, false);
			if total_sigops > MAX_BLOCK_SIGOPS {
				return Err(Error::TooManySigs);
			}

			// The coinbase originates coin and connects to nothing.
			if tx_index == 0 {
				continue;
			}

			let mut value_in = 0u64;
			for (input_index, input) in transaction.raw.inputs.iter().enumerate() {
				let meta = &self.meta.inputs[input_position];
				input_position += 1;

				let output = match meta.cache {
					Some(ref output) => output,
					None => {
						warn!(target: "verification", "Input not found [{}:{}]", transaction.hash.to_reversed_str(), input_index);
						return Err(Error::InputNotFound);
					},
				};

				let prev_out_script = Script::new(output.script_pubkey.clone());
				let input_script = Script::new(input.script_sig.clone());
				total_sigops += script_hash_sigops(&prev_out_script, &input_script)?;
				if total_sigops > MAX_BLOCK_SIGOPS {
					return Err(Error::TooManySigs);
				}

				if output.value > MAX_MONEY {
					return Err(Error::ValidateInputsFailed);
				}

				// Coinbase maturity.
				if let Some(coinbase_height) = meta.coinbase_height {
					if self.height.saturating_sub(coinbase_height) < COINBASE_MATURITY {
						warn!(target: "verification", "Immature coinbase spend attempt [{}:{}]", transaction.hash.to_reversed_str(), input_index);
						return Err(Error::ValidateInputsFailed);
					}
				}

				// A spend recorded in the chain, or a second spend within
				// this block, is a double spend.
				if meta.spent || !spent_in_block.insert(&input.previous_output) {
					warn!(target: "verification", "Double spend attempt [{}:{}]", transaction.hash.to_reversed_str(), input_index);
					return Err(Error::ValidateInputsFailed);
				}

				script_spends.push(ScriptSpend {
					tx_index: tx_index,
					input_index: input_index,
					prev_out_script: output.script_pubkey.clone(),
				});

				value_in = value_in.checked_add(output.value).ok_or(Error::ValidateInputsFailed)?;
				if value_in > MAX_MONEY {
					return Err(Error::ValidateInputsFailed);
				}
			}

			// A transaction may not spend more than it claims.
			let value_out = transaction.raw.total_spends();
			if value_in < value_out {
				return Err(Error::ValidateInputsFailed);
			}

			fees = fees.checked_add(value_in - value_out).ok_or(Error::ValidateInputsFailed)?;
		}

		// The coinbase claims at most the subsidy plus all fees.
		let claim = self.block.transactions[0].raw.total_spends();
		let reward = fees.checked_add(block_reward_satoshi(self.height)).ok_or(Error::ValidateInputsFailed)?;
		if claim > reward {
			return Err(Error::ValidateInputsFailed);
		}

		self.ensure_running()?;

		// Script execution is the expensive part, fanned out per input.
		let valid = script_spends.par_iter().all(|spend| {
			self.executor.verify_consensus(
				&spend.prev_out_script,
				&self.block.transactions[spend.tx_index].raw,
				spend.input_index,
				&self.block.header.raw,
				self.height,
			)
		});

		if valid {
			Ok(())
		} else {
			Err(Error::ValidateInputsFailed)
		}
	}

	fn ensure_running(&self) -> Result<(), Error> {
		if (self.stopped)() {
			Err(Error::ServiceStopped)
		} else {
			Ok(())
		}
	}
}

struct ScriptSpend {
	tx_index: usize,
	input_index: usize,
	prev_out_script: Bytes,
}

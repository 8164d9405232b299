//! Previous-output resolution that must consult more than one source:
//! the indexed chain bounded by the fork height, and the already-accepted
//! prefix of the branch being connected.

use std::collections::{HashMap, HashSet};
use chain::{IndexedBlock, OutPoint};
use primitives::hash::H256;
use fast_chain::{FastChainReader, OutputMeta};

/// Outputs produced and spent by the blocks of a branch prefix.
#[derive(Default)]
pub struct BranchOutputs<'a> {
	transactions: HashMap<&'a H256, (u32, usize, &'a IndexedBlock)>,
	spends: HashSet<&'a OutPoint>,
}

impl<'a> BranchOutputs<'a> {
	pub fn new() -> Self {
		BranchOutputs::default()
	}

	/// Appends a block accepted at the given height.
	pub fn push(&mut self, height: u32, block: &'a IndexedBlock) {
		for (index, transaction) in block.transactions.iter().enumerate() {
			self.transactions.insert(&transaction.hash, (height, index, block));
		}

		for transaction in block.transactions.iter().skip(1) {
			for input in &transaction.raw.inputs {
				self.spends.insert(&input.previous_output);
			}
		}
	}

	pub fn is_spent(&self, outpoint: &OutPoint) -> bool {
		self.spends.contains(outpoint)
	}

	pub fn output(&self, outpoint: &OutPoint) -> Option<OutputMeta> {
		let &(height, index, block) = self.transactions.get(&outpoint.hash)?;
		let transaction = &block.transactions[index];
		let output = transaction.raw.outputs.get(outpoint.index as usize)?;

		Some(OutputMeta {
			cache: Some(output.clone()),
			spent: false,
			// Branch outputs are not confirmed until reorganization.
			confirmed: false,
			coinbase_height: if transaction.raw.is_coinbase() { Some(height) } else { None },
		})
	}
}

/// Resolves an outpoint through the chain first, bounded by the fork
/// height, and through the branch prefix second.
pub struct DuplexOutputProvider<'a> {
	chain: &'a dyn FastChainReader,
	branch: &'a BranchOutputs<'a>,
}

impl<'a> DuplexOutputProvider<'a> {
	pub fn new(chain: &'a dyn FastChainReader, branch: &'a BranchOutputs<'a>) -> Self {
		DuplexOutputProvider {
			chain: chain,
			branch: branch,
		}
	}

	pub fn populate_output(&self, outpoint: &OutPoint, fork_height: u32) -> OutputMeta {
		let mut meta = self.chain.populate_output(outpoint, fork_height);
		if meta.cache.is_none() {
			if let Some(branch_meta) = self.branch.output(outpoint) {
				meta = branch_meta;
			}
		}

		// A spend anywhere in the accepted prefix is already a double spend.
		if self.branch.is_spent(outpoint) {
			meta.spent = true;
		}

		meta
	}
}

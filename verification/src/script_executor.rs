//! The script interpreter consumed by input connection. Execution is a
//! pure function of the spend, injected by the caller so deployments and
//! tests choose their own engine.

use chain::{BlockHeader, Transaction};
use primitives::bytes::Bytes;

pub trait ScriptExecutor: Send + Sync {
	/// Executes the previous output script against the spending input
	/// under the consensus rules. No I/O, no state.
	fn verify_consensus(
		&self,
		prev_out_script: &Bytes,
		transaction: &Transaction,
		input_index: usize,
		header: &BlockHeader,
		height: u32,
	) -> bool;
}

/// Executor accepting every spend, for contexts where script execution is
/// not exercised.
pub struct NoopExecutor;

impl ScriptExecutor for NoopExecutor {
	fn verify_consensus(&self, _prev_out_script: &Bytes, _transaction: &Transaction, _input_index: usize, _header: &BlockHeader, _height: u32) -> bool {
		true
	}
}

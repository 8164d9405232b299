//! Signature operation tallies.

use chain::Transaction;
use script::Script;
use error::Error;

/// Counts signature operations of all input and output scripts of the
/// transaction. Pessimistic unless `accurate`, counting every multisig as
/// twenty keys.
pub fn transaction_sigops(transaction: &Transaction, accurate: bool) -> usize {
	let input_sigops: usize = transaction.inputs.iter()
		.map(|input| Script::new(input.script_sig.clone()).sigops_count(accurate))
		.sum();

	let output_sigops: usize = transaction.outputs.iter()
		.map(|output| Script::new(output.script_pubkey.clone()).sigops_count(accurate))
		.sum();

	input_sigops + output_sigops
}

/// Legacy block tally: every transaction, pessimistic multisig counting.
pub fn legacy_sigops_count<'a, I>(transactions: I) -> usize where I: IntoIterator<Item = &'a Transaction> {
	transactions.into_iter()
		.map(|transaction| transaction_sigops(transaction, false))
		.sum()
}

/// Operations of the redeem script carried by the input of a
/// pay-to-script-hash spend, counted accurately. A malformed redeem
/// script fails the spend.
pub fn script_hash_sigops(prev_out_script: &Script, input_script: &Script) -> Result<usize, Error> {
	if !prev_out_script.is_pay_to_script_hash() {
		return Ok(0);
	}

	let redeem = match input_script.last_push() {
		Some(redeem) => Script::new(redeem.into()),
		None => return Err(Error::ValidateInputsFailed),
	};

	redeem.sigops_count_strict(true)
		.map_err(|_| Error::ValidateInputsFailed)
}

use std::fmt;

/// All possible validation failures. Every validator path completes with
/// exactly one of these, and names are part of the external vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
	// service
	/// The stop predicate fired while work was in flight.
	ServiceStopped,
	/// Required chain context could not be assembled.
	OperationFailed,
	/// Requested item is not known.
	NotFound,

	// structural
	/// Transaction count or serialized size out of bounds.
	SizeLimits,
	/// First transaction is not a coinbase transaction.
	FirstNotCoinbase,
	/// A transaction other than the first is a coinbase.
	ExtraCoinbases,
	/// An equal item already exists, or transaction ids repeat in a block.
	Duplicate,
	/// Header merkle root does not commit to the transactions.
	MerkleMismatch,
	/// Too many signature operations.
	TooManySigs,

	// header consensus
	/// Block hash does not satisfy its own bits.
	ProofOfWork,
	/// Bits do not match the difficulty rules.
	IncorrectProofOfWork,
	/// Timestamp too far in the future.
	FuturisticTimestamp,
	/// Timestamp not above the median time past.
	TimestampTooEarly,
	/// Hash does not match a configured checkpoint.
	CheckpointsFailed,
	/// Version 1 block above the version switchover height.
	OldVersionBlock,
	/// Coinbase script does not start with the serialized height.
	CoinbaseHeightMismatch,

	// transaction consensus
	/// A transaction is not final at the block height and time.
	NonFinalTransaction,
	/// Referenced previous output does not exist.
	InputNotFound,
	/// Unspent transaction with the same id already exists.
	DuplicateOrSpent,
	/// Input connection checks failed.
	ValidateInputsFailed,
	/// Transaction has no inputs or no outputs.
	EmptyTransaction,
	/// Sum of output values is out of range.
	OutputValueOverflow,
	/// Coinbase signature script size is out of range.
	InvalidCoinbaseScriptSize,
	/// Non-coinbase transaction references a null previous output.
	PreviousOutputNull,

	// pool
	/// Coinbase transactions are not accepted into the pool.
	CoinbaseTransaction,
	/// An output is already spent by a pooled transaction.
	DoubleSpend,
	/// Entry displaced by a newer one at pool capacity.
	PoolFilled,
	/// Entry invalidated by a chain reorganization.
	BlockchainReorganized,
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let message = match *self {
			Error::ServiceStopped => "service stopped",
			Error::OperationFailed => "operation failed",
			Error::NotFound => "not found",
			Error::SizeLimits => "size limits failed",
			Error::FirstNotCoinbase => "first transaction is not coinbase",
			Error::ExtraCoinbases => "more than one coinbase",
			Error::Duplicate => "duplicate",
			Error::MerkleMismatch => "merkle root mismatch",
			Error::TooManySigs => "too many signature operations",
			Error::ProofOfWork => "proof of work failed",
			Error::IncorrectProofOfWork => "incorrect proof of work",
			Error::FuturisticTimestamp => "timestamp too far in the future",
			Error::TimestampTooEarly => "timestamp too early",
			Error::CheckpointsFailed => "checkpoint mismatch",
			Error::OldVersionBlock => "old version block",
			Error::CoinbaseHeightMismatch => "coinbase height mismatch",
			Error::NonFinalTransaction => "transaction is not final",
			Error::InputNotFound => "input not found",
			Error::DuplicateOrSpent => "duplicate or spent",
			Error::ValidateInputsFailed => "validate inputs failed",
			Error::EmptyTransaction => "empty transaction",
			Error::OutputValueOverflow => "output value overflow",
			Error::InvalidCoinbaseScriptSize => "invalid coinbase script size",
			Error::PreviousOutputNull => "previous output is null",
			Error::CoinbaseTransaction => "coinbase transaction",
			Error::DoubleSpend => "double spend",
			Error::PoolFilled => "pool filled",
			Error::BlockchainReorganized => "blockchain reorganized",
		};
		message.fmt(f)
	}
}

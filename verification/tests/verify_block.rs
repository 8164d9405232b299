extern crate chain;
extern crate network;
extern crate primitives;
extern crate test_data;
extern crate verification;

use test_data::{block_builder, genesis, next_block, TransactionBuilder};
use network::{ConsensusParams, Network};
use primitives::bytes::Bytes;
use verification::{BlockVerifier, Error};

fn never_stopped() -> bool {
	false
}

#[test]
fn test_verify_block_smoky() {
	let consensus = ConsensusParams::new(Network::Unitest);
	let block = next_block(&genesis()).build();
	let verifier = BlockVerifier::new(&block, &consensus, block.header.raw.time, &never_stopped);
	assert_eq!(verifier.check(), Ok(()));
}

#[test]
fn test_verify_block_rejects_oversized() {
	let consensus = ConsensusParams::new(Network::Unitest);
	let bloat = TransactionBuilder::with_input(&genesis().transactions[0].raw, 0)
		.add_output_with_script(1, Bytes::new_with_len(1_000_001));
	let block = next_block(&genesis()).transaction(bloat.transaction).build();
	let verifier = BlockVerifier::new(&block, &consensus, block.header.raw.time, &never_stopped);
	assert_eq!(verifier.check(), Err(Error::SizeLimits));
}

#[test]
fn test_verify_block_rejects_empty() {
	let consensus = ConsensusParams::new(Network::Unitest);
	let block = block_builder().time(1000).build();
	let verifier = BlockVerifier::new(&block, &consensus, 1000, &never_stopped);
	assert_eq!(verifier.check(), Err(Error::SizeLimits));
}

#[test]
fn test_verify_block_rejects_weak_proof_of_work() {
	// the real network maximum is far below what a random hash reaches
	let consensus = ConsensusParams::new(Network::Mainnet);
	let block = next_block(&genesis()).bits(0x1d00ffff).build();
	let verifier = BlockVerifier::new(&block, &consensus, block.header.raw.time, &never_stopped);
	assert_eq!(verifier.check(), Err(Error::ProofOfWork));
}

#[test]
fn test_verify_block_rejects_futuristic_timestamp() {
	let consensus = ConsensusParams::new(Network::Unitest);
	let block = next_block(&genesis()).time(100_000).build();
	// two hours behind the block timestamp, minus one second
	let verifier = BlockVerifier::new(&block, &consensus, 100_000 - 2 * 60 * 60 - 1, &never_stopped);
	assert_eq!(verifier.check(), Err(Error::FuturisticTimestamp));
}

#[test]
fn test_verify_block_rejects_missing_coinbase() {
	let consensus = ConsensusParams::new(Network::Unitest);
	let spend = TransactionBuilder::with_input(&genesis().transactions[0].raw, 0).add_output(1);
	let block = block_builder()
		.parent(genesis().header.hash.clone())
		.time(1600)
		.transaction(spend.transaction)
		.build();
	let verifier = BlockVerifier::new(&block, &consensus, 1600, &never_stopped);
	assert_eq!(verifier.check(), Err(Error::FirstNotCoinbase));
}

#[test]
fn test_verify_block_rejects_extra_coinbases() {
	let consensus = ConsensusParams::new(Network::Unitest);
	let extra = TransactionBuilder::default()
		.add_coinbase_input("04ffff001d0105".into())
		.add_output(1);
	let block = next_block(&genesis()).transaction(extra.transaction).build();
	let verifier = BlockVerifier::new(&block, &consensus, block.header.raw.time, &never_stopped);
	assert_eq!(verifier.check(), Err(Error::ExtraCoinbases));
}

#[test]
fn test_verify_block_rejects_duplicated_transactions() {
	let consensus = ConsensusParams::new(Network::Unitest);
	let spend = TransactionBuilder::with_input(&genesis().transactions[0].raw, 0).add_output(1);
	let block = next_block(&genesis())
		.transaction(spend.transaction.clone())
		.transaction(spend.transaction)
		.build();
	let verifier = BlockVerifier::new(&block, &consensus, block.header.raw.time, &never_stopped);
	assert_eq!(verifier.check(), Err(Error::Duplicate));
}

#[test]
fn test_verify_block_rejects_merkle_mismatch() {
	let consensus = ConsensusParams::new(Network::Unitest);
	let mut block = next_block(&genesis()).build();
	// flip a single bit of the committed root
	block.header.raw.merkle_root_hash[0] ^= 1;
	let block = chain::IndexedBlock::new(block.header.raw.clone().into(), block.transactions);
	let verifier = BlockVerifier::new(&block, &consensus, block.header.raw.time, &never_stopped);
	assert_eq!(verifier.check(), Err(Error::MerkleMismatch));
}

#[test]
fn test_verify_block_rejects_empty_transaction() {
	let consensus = ConsensusParams::new(Network::Unitest);
	let empty = TransactionBuilder::default();
	let block = next_block(&genesis()).transaction(empty.transaction).build();
	let verifier = BlockVerifier::new(&block, &consensus, block.header.raw.time, &never_stopped);
	assert_eq!(verifier.check(), Err(Error::EmptyTransaction));
}

#[test]
fn test_verify_block_rejects_null_previous_output() {
	let consensus = ConsensusParams::new(Network::Unitest);
	let null_input = TransactionBuilder::default()
		.add_outpoint(chain::OutPoint::null())
		.add_coinbase_input("0402".into())
		.add_output(1);
	let block = next_block(&genesis()).transaction(null_input.transaction).build();
	let verifier = BlockVerifier::new(&block, &consensus, block.header.raw.time, &never_stopped);
	assert_eq!(verifier.check(), Err(Error::PreviousOutputNull));
}

#[test]
fn test_verify_block_reports_stop() {
	let consensus = ConsensusParams::new(Network::Unitest);
	let block = next_block(&genesis()).build();
	let stopped = || true;
	let verifier = BlockVerifier::new(&block, &consensus, block.header.raw.time, &stopped);
	assert_eq!(verifier.check(), Err(Error::ServiceStopped));
}

use chain::{
	Block, BlockHeader, IndexedBlock, OutPoint, Transaction,
	TransactionInput, TransactionOutput, merkle_root,
};
use primitives::bytes::Bytes;
use primitives::hash::H256;
use script::{Builder as ScriptBuilder, Num};

/// Bits matching the unit test network maximum, any hash qualifies.
pub const EASY_BITS: u32 = 0x2100ffff;

#[derive(Debug, Default, Clone)]
pub struct TransactionBuilder {
	pub transaction: Transaction,
}

impl From<TransactionBuilder> for Transaction {
	fn from(builder: TransactionBuilder) -> Self {
		builder.transaction
	}
}

impl TransactionBuilder {
	pub fn coinbase() -> TransactionBuilder {
		TransactionBuilder::default()
			.add_coinbase_input("04ffff001d0104".into())
	}

	pub fn with_output(value: u64) -> TransactionBuilder {
		TransactionBuilder::default().add_output(value)
	}

	pub fn with_input(transaction: &Transaction, output_index: u32) -> TransactionBuilder {
		TransactionBuilder::default().add_input(transaction, output_index)
	}

	pub fn set_version(mut self, version: i32) -> TransactionBuilder {
		self.transaction.version = version;
		self
	}

	pub fn lock(mut self, lock_time: u32) -> TransactionBuilder {
		self.transaction.lock_time = lock_time;
		self
	}

	pub fn add_coinbase_input(mut self, script_sig: Bytes) -> TransactionBuilder {
		self.transaction.inputs.push(TransactionInput::coinbase(script_sig));
		self
	}

	pub fn add_input(mut self, transaction: &Transaction, output_index: u32) -> TransactionBuilder {
		self.transaction.inputs.push(TransactionInput {
			previous_output: OutPoint {
				hash: transaction.hash(),
				index: output_index,
			},
			script_sig: Bytes::new_with_len(2),
			sequence: 0xffffffff,
		});
		self
	}

	pub fn add_outpoint(mut self, outpoint: OutPoint) -> TransactionBuilder {
		self.transaction.inputs.push(TransactionInput {
			previous_output: outpoint,
			script_sig: Bytes::new_with_len(2),
			sequence: 0xffffffff,
		});
		self
	}

	pub fn set_sequence(mut self, sequence: u32) -> TransactionBuilder {
		if let Some(input) = self.transaction.inputs.last_mut() {
			input.sequence = sequence;
		}
		self
	}

	pub fn add_output(mut self, value: u64) -> TransactionBuilder {
		self.transaction.outputs.push(TransactionOutput {
			value: value,
			script_pubkey: Bytes::new(),
		});
		self
	}

	pub fn add_output_with_script(mut self, value: u64, script_pubkey: Bytes) -> TransactionBuilder {
		self.transaction.outputs.push(TransactionOutput {
			value: value,
			script_pubkey: script_pubkey,
		});
		self
	}

	pub fn hash(&self) -> H256 {
		self.transaction.hash()
	}
}

#[derive(Debug, Clone)]
pub struct BlockBuilder {
	version: u32,
	parent: H256,
	time: u32,
	bits: u32,
	nonce: u32,
	transactions: Vec<Transaction>,
}

impl Default for BlockBuilder {
	fn default() -> Self {
		BlockBuilder {
			version: 1,
			parent: H256::default(),
			time: 0,
			bits: EASY_BITS,
			nonce: 0,
			transactions: Vec::new(),
		}
	}
}

impl BlockBuilder {
	pub fn version(mut self, version: u32) -> BlockBuilder {
		self.version = version;
		self
	}

	pub fn parent(mut self, parent: H256) -> BlockBuilder {
		self.parent = parent;
		self
	}

	pub fn time(mut self, time: u32) -> BlockBuilder {
		self.time = time;
		self
	}

	pub fn bits(mut self, bits: u32) -> BlockBuilder {
		self.bits = bits;
		self
	}

	pub fn nonce(mut self, nonce: u32) -> BlockBuilder {
		self.nonce = nonce;
		self
	}

	/// Appends a default coinbase claiming the given value.
	pub fn coinbase(self, value: u64) -> BlockBuilder {
		let coinbase = TransactionBuilder::coinbase().add_output(value);
		self.transaction(coinbase.transaction)
	}

	/// Appends a coinbase starting with the serialized height, as version 2
	/// blocks require.
	pub fn coinbase_with_height(self, height: u32, value: u64) -> BlockBuilder {
		let script_sig = ScriptBuilder::default()
			.push_num(Num::from(height))
			.into_bytes();
		let coinbase = TransactionBuilder::default()
			.add_coinbase_input(script_sig)
			.add_output(value);
		self.transaction(coinbase.transaction)
	}

	pub fn transaction(mut self, transaction: Transaction) -> BlockBuilder {
		self.transactions.push(transaction);
		self
	}

	pub fn transactions<I>(mut self, transactions: I) -> BlockBuilder where I: IntoIterator<Item = Transaction> {
		self.transactions.extend(transactions);
		self
	}

	pub fn build(self) -> IndexedBlock {
		let hashes = self.transactions.iter().map(Transaction::hash).collect::<Vec<_>>();
		let merkle_root_hash = if hashes.is_empty() {
			H256::default()
		} else {
			merkle_root(&hashes)
		};

		let header = BlockHeader {
			version: self.version,
			previous_header_hash: self.parent,
			merkle_root_hash: merkle_root_hash,
			time: self.time,
			bits: self.bits,
			nonce: self.nonce,
		};

		IndexedBlock::from(Block::new(header, self.transactions))
	}
}

pub fn block_builder() -> BlockBuilder {
	BlockBuilder::default()
}

/// A minimal valid genesis block for the unit test network.
pub fn genesis() -> IndexedBlock {
	block_builder()
		.time(1000)
		.coinbase(50 * 100_000_000)
		.build()
}

/// A builder pre-wired to extend the given block one spacing later. The
/// coinbase carries the new timestamp as extranonce, so sequentially built
/// blocks never repeat a transaction id.
pub fn next_block(parent: &IndexedBlock) -> BlockBuilder {
	let time = parent.header.raw.time + 600;
	let script_sig = ScriptBuilder::default()
		.push_num(Num::from(time))
		.into_bytes();
	let coinbase = TransactionBuilder::default()
		.add_coinbase_input(script_sig)
		.add_output(50 * 100_000_000);

	block_builder()
		.parent(parent.header.hash.clone())
		.time(time)
		.bits(parent.header.raw.bits)
		.transaction(coinbase.transaction)
}

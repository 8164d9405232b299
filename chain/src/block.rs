use rustc_hex::FromHex;
use hash::H256;
use ser::{
	Deserializable, Reader, Error as ReaderError,
	Serializable, Stream, deserialize
};
use merkle_root::merkle_root;
use block_header::BlockHeader;
use transaction::Transaction;

#[derive(Debug, PartialEq, Clone)]
pub struct Block {
	pub block_header: BlockHeader,
	pub transactions: Vec<Transaction>,
}

impl From<&'static str> for Block {
	fn from(s: &'static str) -> Self {
		let bytes: Vec<u8> = s.from_hex().unwrap();
		deserialize(&bytes as &[u8]).unwrap()
	}
}

impl Block {
	pub fn new(header: BlockHeader, transactions: Vec<Transaction>) -> Self {
		Block {
			block_header: header,
			transactions: transactions,
		}
	}

	/// Returns block's merkle root.
	pub fn merkle_root(&self) -> H256 {
		let hashes = self.transactions.iter().map(Transaction::hash).collect::<Vec<H256>>();
		merkle_root(&hashes)
	}

	pub fn transactions(&self) -> &[Transaction] {
		&self.transactions
	}

	pub fn header(&self) -> &BlockHeader {
		&self.block_header
	}

	pub fn hash(&self) -> H256 {
		self.block_header.hash()
	}
}

impl Serializable for Block {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.block_header)
			.append_list(&self.transactions);
	}
}

impl Deserializable for Block {
	fn deserialize(reader: &mut Reader) -> Result<Self, ReaderError> {
		let result = Block {
			block_header: reader.read()?,
			transactions: reader.read_list()?,
		};

		Ok(result)
	}
}

use std::fmt;
use ser::{
	Deserializable, Reader, Error as ReaderError,
	Serializable, Stream, serialize
};
use crypto::dhash256;
use compact::Compact;
use uint::U256;
use hash::H256;

#[derive(PartialEq, Clone)]
pub struct BlockHeader {
	pub version: u32,
	pub previous_header_hash: H256,
	pub merkle_root_hash: H256,
	pub time: u32,
	pub bits: u32,
	pub nonce: u32,
}

impl BlockHeader {
	pub fn hash(&self) -> H256 {
		dhash256(&serialize(self))
	}

	/// Expected number of hashes needed to mine a header with these bits.
	pub fn proof(&self) -> U256 {
		let target = match Compact::new(self.bits).to_u256() {
			Ok(target) => target,
			Err(_) => return U256::zero(),
		};

		// We need to compute 2**256 / (target + 1), but we can't represent 2**256
		// as it is too large for U256. However as 2**256 is at least as large as
		// target + 1, it is equal to ((2**256 - target - 1) / (target + 1)) + 1, or
		// ~target / (target + 1) + 1.
		(!target / (target + U256::one())) + U256::one()
	}
}

impl fmt::Debug for BlockHeader {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("BlockHeader")
			.field("version", &self.version)
			.field("previous_header_hash", &self.previous_header_hash.reversed())
			.field("merkle_root_hash", &self.merkle_root_hash.reversed())
			.field("time", &self.time)
			.field("bits", &self.bits)
			.field("nonce", &self.nonce)
			.finish()
	}
}

impl Serializable for BlockHeader {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.version)
			.append(&self.previous_header_hash)
			.append(&self.merkle_root_hash)
			.append(&self.time)
			.append(&self.bits)
			.append(&self.nonce);
	}

	fn serialized_size(&self) -> usize {
		80
	}
}

impl Deserializable for BlockHeader {
	fn deserialize(reader: &mut Reader) -> Result<Self, ReaderError> {
		let block_header = BlockHeader {
			version: reader.read()?,
			previous_header_hash: reader.read()?,
			merkle_root_hash: reader.read()?,
			time: reader.read()?,
			bits: reader.read()?,
			nonce: reader.read()?,
		};

		Ok(block_header)
	}
}

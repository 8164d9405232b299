//! An ordered sequence of candidate headers layered above a fork point,
//! queried as if it was already indexed.

use std::sync::Arc;
use chain::IndexedBlockHeader;
use primitives::hash::H256;
use primitives::uint::U256;
use chain_state::ChainState;

/// A header in the branch, with the chain state attached once the header
/// has been accepted.
#[derive(Debug, Clone)]
pub struct BranchEntry {
	pub header: IndexedBlockHeader,
	pub state: Option<Arc<ChainState>>,
}

impl From<IndexedBlockHeader> for BranchEntry {
	fn from(header: IndexedBlockHeader) -> Self {
		BranchEntry {
			header: header,
			state: None,
		}
	}
}

/// Entries are ordered root first; the parent of the first entry is the
/// fork point, a height already present in the indexed chain.
#[derive(Debug, Clone, Default)]
pub struct HeaderBranch {
	height: u32,
	entries: Vec<BranchEntry>,
}

impl HeaderBranch {
	/// An empty branch rooted at the given fork height.
	pub fn new(height: u32) -> Self {
		HeaderBranch {
			height: height,
			entries: Vec::new(),
		}
	}

	/// An empty branch for startup queries; every get falls through to
	/// the indexed chain.
	pub fn empty() -> Self {
		HeaderBranch::default()
	}

	pub fn set_height(&mut self, height: u32) {
		self.height = height;
	}

	/// Prepends the header if it is the parent of the current root, or the
	/// branch is empty. Front is the fork point side, back is the top.
	pub fn push(&mut self, entry: BranchEntry) -> bool {
		let linked = match self.entries.first() {
			None => true,
			Some(root) => root.header.raw.previous_header_hash == entry.header.hash,
		};

		if linked {
			self.entries.insert(0, entry);
		}

		linked
	}

	/// Appends the header if it links to the current top, or the branch
	/// is empty.
	pub fn push_top(&mut self, entry: BranchEntry) -> bool {
		let linked = match self.entries.last() {
			None => true,
			Some(top) => entry.header.raw.previous_header_hash == top.header.hash,
		};

		if linked {
			self.entries.push(entry);
		}

		linked
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Fork point height.
	pub fn height(&self) -> u32 {
		self.height
	}

	/// Height of the top of the branch.
	pub fn top_height(&self) -> u32 {
		self.height + self.entries.len() as u32
	}

	/// Fork point hash: the parent of the root entry.
	pub fn hash(&self) -> H256 {
		self.entries.first()
			.map(|entry| entry.header.raw.previous_header_hash.clone())
			.unwrap_or_default()
	}

	pub fn top(&self) -> Option<&BranchEntry> {
		self.entries.last()
	}

	pub fn top_mut(&mut self) -> Option<&mut BranchEntry> {
		self.entries.last_mut()
	}

	pub fn top_parent(&self) -> Option<&BranchEntry> {
		match self.entries.len() {
			0 | 1 => None,
			count => self.entries.get(count - 2),
		}
	}

	pub fn entries(&self) -> &[BranchEntry] {
		&self.entries
	}

	/// Claimed work of the whole branch.
	pub fn work(&self) -> U256 {
		self.entries.iter()
			.fold(U256::zero(), |total, entry| total + entry.header.raw.proof())
	}

	fn index_of(&self, height: u32) -> Option<usize> {
		if height <= self.height || height > self.top_height() {
			return None;
		}

		Some((height - self.height - 1) as usize)
	}

	pub fn get_bits(&self, height: u32) -> Option<u32> {
		self.index_of(height).map(|index| self.entries[index].header.raw.bits)
	}

	pub fn get_version(&self, height: u32) -> Option<u32> {
		self.index_of(height).map(|index| self.entries[index].header.raw.version)
	}

	pub fn get_timestamp(&self, height: u32) -> Option<u32> {
		self.index_of(height).map(|index| self.entries[index].header.raw.time)
	}

	pub fn get_block_hash(&self, height: u32) -> Option<H256> {
		self.index_of(height).map(|index| self.entries[index].header.hash.clone())
	}
}

#[cfg(test)]
mod tests {
	use chain::{BlockHeader, IndexedBlockHeader};
	use primitives::hash::H256;
	use super::HeaderBranch;

	fn header(previous: H256, time: u32) -> IndexedBlockHeader {
		BlockHeader {
			version: 1,
			previous_header_hash: previous,
			merkle_root_hash: H256::default(),
			time: time,
			bits: 0x2100ffff,
			nonce: 0,
		}.into()
	}

	#[test]
	fn test_branch_empty() {
		let branch = HeaderBranch::new(10);
		assert!(branch.is_empty());
		assert!(branch.top().is_none());
		assert!(branch.top_parent().is_none());
		assert_eq!(branch.top_height(), 10);
		assert_eq!(branch.get_bits(11), None);
	}

	#[test]
	fn test_branch_ordering_and_queries() {
		let h11 = header(H256::from(1), 100);
		let h12 = header(h11.hash.clone(), 200);
		let h13 = header(h12.hash.clone(), 300);

		let mut branch = HeaderBranch::new(10);
		// pushed from the top down, as the pool walks parent links
		assert!(branch.push(h13.clone().into()));
		assert!(branch.push(h12.clone().into()));
		assert!(branch.push(h11.clone().into()));
		// an unlinked header is rejected
		assert!(!branch.push(header(H256::from(9), 0).into()));

		assert_eq!(branch.len(), 3);
		assert_eq!(branch.top_height(), 13);
		assert_eq!(branch.top().unwrap().header.hash, h13.hash);
		assert_eq!(branch.top_parent().unwrap().header.hash, h12.hash);
		assert_eq!(branch.hash(), H256::from(1));

		// covered heights resolve, everything else falls through
		assert_eq!(branch.get_timestamp(11), Some(100));
		assert_eq!(branch.get_timestamp(13), Some(300));
		assert_eq!(branch.get_timestamp(10), None);
		assert_eq!(branch.get_timestamp(14), None);
		assert_eq!(branch.get_block_hash(12), Some(h12.hash));
	}
}

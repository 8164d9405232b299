//! Pool of known but not yet indexed blocks. Entries form a forest keyed
//! by hash: the parent is a hash field, children are hash lookups, so no
//! entry owns another.
//!
//! Not thread safe, protected by the organizer's single-writer discipline.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use chain::IndexedBlock;
use primitives::hash::H256;
use verification::ChainState;

struct PoolEntry {
	block: IndexedBlock,
	/// Claimed height, known once the entry's branch has reached the
	/// indexed chain.
	height: Option<u32>,
	state: Option<Arc<ChainState>>,
}

#[derive(Default)]
pub struct BlockPool {
	entries: HashMap<H256, PoolEntry>,
	/// Parent hash to children hashes. Back references are lookups.
	by_parent: HashMap<H256, Vec<H256>>,
}

impl BlockPool {
	pub fn new() -> Self {
		BlockPool::default()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn contains(&self, hash: &H256) -> bool {
		self.entries.contains_key(hash)
	}

	pub fn block(&self, hash: &H256) -> Option<&IndexedBlock> {
		self.entries.get(hash).map(|entry| &entry.block)
	}

	pub fn state(&self, hash: &H256) -> Option<Arc<ChainState>> {
		self.entries.get(hash).and_then(|entry| entry.state.clone())
	}

	pub fn set_state(&mut self, hash: &H256, state: Arc<ChainState>) {
		if let Some(entry) = self.entries.get_mut(hash) {
			entry.state = Some(state);
		}
	}

	pub fn set_height(&mut self, hash: &H256, height: u32) {
		if let Some(entry) = self.entries.get_mut(hash) {
			entry.height = Some(height);
		}
	}

	/// O(1); parent and child links are established through the hash
	/// indexes regardless of arrival order.
	pub fn insert(&mut self, block: IndexedBlock) {
		let hash = block.header.hash.clone();
		let parent = block.header.raw.previous_header_hash.clone();

		self.entries.insert(hash.clone(), PoolEntry {
			block: block,
			height: None,
			state: None,
		});

		let children = self.by_parent.entry(parent).or_insert_with(Vec::new);
		if !children.contains(&hash) {
			children.push(hash);
		}
	}

	/// Detaches the entry from its parent's child set. Children stay in
	/// the pool, orphaned until their turn comes.
	pub fn remove(&mut self, hash: &H256) -> Option<IndexedBlock> {
		let entry = self.entries.remove(hash)?;
		let parent = entry.block.header.raw.previous_header_hash.clone();

		if let Some(children) = self.by_parent.get_mut(&parent) {
			children.retain(|child| child != hash);
			if children.is_empty() {
				self.by_parent.remove(&parent);
			}
		}

		Some(entry.block)
	}

	pub fn children(&self, hash: &H256) -> &[H256] {
		self.by_parent.get(hash).map(|children| &children[..]).unwrap_or(&[])
	}

	/// Walks parent pointers from the given entry until a block outside
	/// the pool is referenced. Returns pool hashes ordered root first.
	pub fn trace(&self, hash: &H256) -> Vec<H256> {
		let mut path = VecDeque::new();
		let mut current = hash.clone();

		while let Some(entry) = self.entries.get(&current) {
			path.push_front(current.clone());
			current = entry.block.header.raw.previous_header_hash.clone();
		}

		path.into_iter().collect()
	}

	/// Breadth-first walk over child links, the given entry excluded.
	pub fn descendants(&self, hash: &H256) -> Vec<H256> {
		let mut queue: VecDeque<H256> = VecDeque::new();
		let mut found = Vec::new();
		queue.push_back(hash.clone());

		while let Some(parent) = queue.pop_front() {
			for child in self.children(&parent).to_vec() {
				queue.push_back(child.clone());
				found.push(child);
			}
		}

		found
	}

	/// Removes entries that fell too far below the indexed top, with all
	/// of their descendants.
	pub fn prune(&mut self, top_height: u32, depth: u32) {
		let minimum = top_height.saturating_sub(depth);
		let expired: Vec<H256> = self.entries.iter()
			.filter(|&(_, entry)| entry.height.map(|height| height < minimum).unwrap_or(false))
			.map(|(hash, _)| hash.clone())
			.collect();

		for hash in expired {
			for descendant in self.descendants(&hash) {
				self.remove(&descendant);
			}
			self.remove(&hash);
		}
	}
}

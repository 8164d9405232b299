//! Merkle tree of transaction ids.
//! https://en.bitcoin.it/wiki/Protocol_documentation#Merkle_Trees
//!
//! Each level pairs adjacent hashes, an odd hash at the end paired with
//! itself, until a single root remains.

use rayon::prelude::{IntoParallelIterator, ParallelIterator};
use crypto::dhash256;
use hash::{H256, H512};

// Levels narrower than this hash faster serially than scheduled on the
// worker pool; one double-SHA256 per pair is cheap.
const PARALLEL_LEVEL_MIN: usize = 512;

/// Calculates the root of the merkle tree.
pub fn merkle_root<T>(hashes: &[T]) -> H256 where T: AsRef<H256> + Sync {
	if hashes.len() == 1 {
		return *hashes[0].as_ref();
	}

	if hashes.is_empty() {
		return H256::default();
	}

	let mut level = reduce(hashes);
	while level.len() > 1 {
		level = reduce(&level);
	}

	level.remove(0)
}

/// Calculate merkle tree node hash.
pub fn merkle_node_hash<T>(left: T, right: T) -> H256 where T: AsRef<H256> {
	let mut preimage = H512::default();
	preimage[0..32].copy_from_slice(&**left.as_ref());
	preimage[32..64].copy_from_slice(&**right.as_ref());
	dhash256(&*preimage)
}

/// Hashes one level of the tree into the next.
fn reduce<T>(hashes: &[T]) -> Vec<H256> where T: AsRef<H256> + Sync {
	let parents = (hashes.len() + 1) / 2;
	let parent = |index: usize| {
		let left = hashes[2 * index].as_ref();
		// the last node of an odd level pairs with itself
		let right = hashes.get(2 * index + 1).map(AsRef::as_ref).unwrap_or(left);
		merkle_node_hash(left, right)
	};

	if hashes.len() < PARALLEL_LEVEL_MIN {
		(0..parents).map(parent).collect()
	} else {
		(0..parents).into_par_iter().map(parent).collect()
	}
}

#[cfg(test)]
mod tests {
	use crypto::dhash256;
	use hash::H256;
	use super::{merkle_root, merkle_node_hash};

	fn leaves(count: u8) -> Vec<H256> {
		(0..count).map(|byte| dhash256(&[byte])).collect()
	}

	#[test]
	fn test_merkle_root_of_one_is_the_leaf() {
		let leaves = leaves(1);
		assert_eq!(merkle_root(&leaves), leaves[0]);
	}

	#[test]
	fn test_merkle_root_of_two() {
		let leaves = leaves(2);
		assert_eq!(merkle_root(&leaves), merkle_node_hash(&leaves[0], &leaves[1]));
	}

	#[test]
	fn test_merkle_root_duplicates_odd_tail() {
		let leaves = leaves(3);
		let expected = merkle_node_hash(
			&merkle_node_hash(&leaves[0], &leaves[1]),
			&merkle_node_hash(&leaves[2], &leaves[2]),
		);
		assert_eq!(merkle_root(&leaves), expected);
	}

	#[test]
	fn test_merkle_root_of_six() {
		let leaves = leaves(6);
		let row = vec![
			merkle_node_hash(&leaves[0], &leaves[1]),
			merkle_node_hash(&leaves[2], &leaves[3]),
			merkle_node_hash(&leaves[4], &leaves[5]),
		];
		let expected = merkle_node_hash(
			&merkle_node_hash(&row[0], &row[1]),
			&merkle_node_hash(&row[2], &row[2]),
		);
		assert_eq!(merkle_root(&leaves), expected);
	}

	#[test]
	fn test_merkle_root_of_references_and_values_agree() {
		let leaves = leaves(5);
		let references: Vec<&H256> = leaves.iter().collect();
		assert_eq!(merkle_root(&leaves), merkle_root(&references));
	}

	#[test]
	fn test_merkle_root_parallel_level_agrees_with_serial() {
		// wide enough to cross the parallel cutoff
		let leaves: Vec<H256> = (0..600u32)
			.map(|index| dhash256(&[index as u8, (index >> 8) as u8]))
			.collect();

		let serial = leaves.chunks(2)
			.map(|pair| merkle_node_hash(&pair[0], pair.get(1).unwrap_or(&pair[0])))
			.collect::<Vec<_>>();

		assert_eq!(merkle_root(&leaves), merkle_root(&serial));
	}
}

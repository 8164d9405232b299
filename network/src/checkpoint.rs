use hash::H256;

/// A block hash pinned to a height.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
	pub height: u32,
	pub hash: H256,
}

impl Checkpoint {
	pub fn new(height: u32, hash: H256) -> Self {
		Checkpoint {
			height: height,
			hash: hash,
		}
	}
}

/// Sorts checkpoints by height, so the topmost is always the last.
pub fn sort(mut checkpoints: Vec<Checkpoint>) -> Vec<Checkpoint> {
	checkpoints.sort_by_key(|checkpoint| checkpoint.height);
	checkpoints
}

/// At a checkpointed height the hash must match exactly. All other
/// heights pass.
pub fn validate(hash: &H256, height: u32, checkpoints: &[Checkpoint]) -> bool {
	checkpoints.iter()
		.find(|checkpoint| checkpoint.height == height)
		.map(|checkpoint| &checkpoint.hash == hash)
		.unwrap_or(true)
}

/// The topmost checkpointed height, if any checkpoints are configured.
pub fn top_height(checkpoints: &[Checkpoint]) -> Option<u32> {
	checkpoints.last().map(|checkpoint| checkpoint.height)
}

/// True if blocks at the given height are covered by a later checkpoint.
pub fn covered(height: u32, checkpoints: &[Checkpoint]) -> bool {
	top_height(checkpoints).map(|top| height <= top).unwrap_or(false)
}

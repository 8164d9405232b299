//! Per-height consensus context: rolling windows over bits, version and
//! timestamp, active rule forks, checkpoint coverage and staleness.
//!
//! A `Map` names exactly which historical heights are required to derive
//! the state at a height. Population fills a `Data` from a header branch
//! with fallback to the indexed chain, and a `ChainState` closes over the
//! populated data together with the consensus configuration.

use std::cmp;
use chain::IndexedBlockHeader;
use primitives::compact::Compact;
use primitives::hash::H256;
use network::{checkpoint, fork, ConsensusParams, ForkFlags};
use constants::{
	RETARGETING_INTERVAL, MEDIAN_TIME_PAST_INTERVAL, DOUBLE_SPACING_SECONDS,
	ACTIVATION_SAMPLE, ACTIVATION_THRESHOLD,
};
use work::{is_retarget_height, work_required_retarget};

/// Sentinel height for attributes a map does not request.
pub const UNREQUESTED: u32 = u32::max_value();

/// A range of `count` heights ending at `high`, highest last.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct HeightRange {
	pub high: u32,
	pub count: u32,
}

impl HeightRange {
	/// Height covered by the i-th position of the populated vector.
	pub fn height_at(&self, index: usize) -> u32 {
		self.high - self.count + 1 + index as u32
	}
}

/// The set of historical heights required to derive state at a height.
#[derive(Debug, Clone, PartialEq)]
pub struct Map {
	pub bits: HeightRange,
	pub bits_self: u32,
	pub version: HeightRange,
	pub version_self: u32,
	pub timestamp: HeightRange,
	pub timestamp_self: u32,
	/// Single timestamp used for retarget arithmetic, or `UNREQUESTED`.
	pub timestamp_retarget: u32,
	/// Height of the duplicate-txid activation block, or `UNREQUESTED`.
	pub allow_collisions_height: u32,
}

/// Enumerates the heights needed to derive state at `height`.
pub fn get_map(height: u32, consensus: &ConsensusParams) -> Map {
	let forks = consensus.enabled_forks;
	let high = height.saturating_sub(1);

	// Retargeting scans a single previous block, unless difficulty is not
	// maintained between readjustments and the scan must find the last
	// non-minimal bits.
	let bits_count = if fork::is_enabled(forks, fork::RETARGET) && !fork::is_enabled(forks, fork::DIFFICULT) {
		cmp::min(height, RETARGETING_INTERVAL)
	} else {
		cmp::min(height, 1)
	};

	// Version voting is pointless under a checkpoint.
	let activating = fork::BIP34 | fork::BIP65 | fork::BIP66;
	let version_count = if forks & activating != 0 && !checkpoint::covered(height, &consensus.checkpoints) {
		cmp::min(height, ACTIVATION_SAMPLE)
	} else {
		0
	};

	let timestamp_retarget = if fork::is_enabled(forks, fork::RETARGET) &&
		is_retarget_height(height) && height >= RETARGETING_INTERVAL {
		height - RETARGETING_INTERVAL
	} else {
		UNREQUESTED
	};

	let allow_collisions_height = match consensus.bip34_checkpoint {
		Some(ref activation) if fork::is_enabled(forks, fork::ALLOW_COLLISIONS) &&
			height > activation.height => activation.height,
		_ => UNREQUESTED,
	};

	Map {
		bits: HeightRange { high: high, count: bits_count },
		bits_self: height,
		version: HeightRange { high: high, count: version_count },
		version_self: height,
		timestamp: HeightRange { high: high, count: cmp::min(height, MEDIAN_TIME_PAST_INTERVAL) },
		timestamp_self: height,
		timestamp_retarget: timestamp_retarget,
		allow_collisions_height: allow_collisions_height,
	}
}

/// A populated window: values for the map range, highest last, plus the
/// value at the height itself.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RangeData {
	pub ordered: Vec<u32>,
	pub own: u32,
}

/// The populated map.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Data {
	pub hash: H256,
	pub height: u32,
	pub bits: RangeData,
	pub version: RangeData,
	pub timestamp: RangeData,
	/// Timestamp of the retarget reference block, or `UNREQUESTED`.
	pub timestamp_retarget: u32,
	/// Hash of the duplicate-txid activation block, zero when unrequested.
	pub allow_collisions_hash: H256,
}

/// Consensus context at a single height.
#[derive(Debug, Clone)]
pub struct ChainState {
	data: Data,
	consensus: ConsensusParams,
	active_forks: ForkFlags,
}

impl ChainState {
	pub fn new(data: Data, consensus: &ConsensusParams) -> Self {
		let active_forks = ChainState::activations(&data, consensus);
		ChainState {
			data: data,
			consensus: consensus.clone(),
			active_forks: active_forks,
		}
	}

	/// Derives the state of the immediate child by a single-step update,
	/// appending the new header's attributes and shifting windows by one.
	/// Returns `None` when the child needs context the parent does not
	/// carry; the caller then falls back to the full derivation, and both
	/// paths produce identical data.
	pub fn promote(parent: &ChainState, header: &IndexedBlockHeader) -> Option<ChainState> {
		let height = parent.data.height + 1;
		let consensus = &parent.consensus;
		let map = get_map(height, consensus);

		// The retarget reference is outside every window the parent holds.
		if map.timestamp_retarget != UNREQUESTED {
			return None;
		}

		// The activation hash is fetched at most once; promotion cannot
		// cross the boundary where it first becomes requested.
		let allow_collisions_hash = if map.allow_collisions_height != UNREQUESTED {
			if parent.data.allow_collisions_hash.is_zero() {
				return None;
			}
			parent.data.allow_collisions_hash.clone()
		} else {
			H256::default()
		};

		let data = Data {
			hash: header.hash.clone(),
			height: height,
			bits: promote_range(&parent.data.bits, map.bits.count, header.raw.bits)?,
			version: promote_range(&parent.data.version, map.version.count, header.raw.version)?,
			timestamp: promote_range(&parent.data.timestamp, map.timestamp.count, header.raw.time)?,
			timestamp_retarget: UNREQUESTED,
			allow_collisions_hash: allow_collisions_hash,
		};

		Some(ChainState::new(data, consensus))
	}

	fn activations(data: &Data, consensus: &ConsensusParams) -> ForkFlags {
		let configured = consensus.enabled_forks;
		let mut active = configured & (fork::BIP16 | fork::BIP30 | fork::RETARGET | fork::DIFFICULT);

		// Rolling-window version voting for the signaling forks.
		let votes = |minimum: u32| data.version.ordered.iter().filter(|&&version| version >= minimum).count();
		if fork::is_enabled(configured, fork::BIP34) && votes(2) >= ACTIVATION_THRESHOLD {
			active |= fork::BIP34;
		}
		if fork::is_enabled(configured, fork::BIP66) && votes(3) >= ACTIVATION_THRESHOLD {
			active |= fork::BIP66;
		}
		if fork::is_enabled(configured, fork::BIP65) && votes(4) >= ACTIVATION_THRESHOLD {
			active |= fork::BIP65;
		}

		// Collisions are allowed only above the recognized activation block.
		if fork::is_enabled(configured, fork::ALLOW_COLLISIONS) {
			let recognized = match consensus.bip34_checkpoint {
				Some(ref activation) => data.allow_collisions_hash == activation.hash,
				None => false,
			};
			if recognized {
				active |= fork::ALLOW_COLLISIONS;
			}
		}

		active
	}

	pub fn height(&self) -> u32 {
		self.data.height
	}

	pub fn hash(&self) -> &H256 {
		&self.data.hash
	}

	pub fn data(&self) -> &Data {
		&self.data
	}

	pub fn enabled_forks(&self) -> ForkFlags {
		self.active_forks
	}

	pub fn is_enabled(&self, fork: ForkFlags) -> bool {
		fork::is_enabled(self.active_forks, fork)
	}

	pub fn is_under_checkpoint(&self) -> bool {
		checkpoint::covered(self.data.height, &self.consensus.checkpoints)
	}

	/// Median of the timestamp window. The window holds up to 11 entries
	/// once the chain is past that height, fewer before.
	pub fn median_time_past(&self) -> u32 {
		let mut timestamps = self.data.timestamp.ordered.clone();
		if timestamps.is_empty() {
			return 0;
		}

		timestamps.sort_unstable();
		timestamps[timestamps.len() / 2]
	}

	/// Bits required of the block at this height.
	pub fn work_required(&self) -> Compact {
		let max_work_bits = self.consensus.network.max_work_bits();
		if self.data.height == 0 {
			return max_work_bits;
		}

		if !self.is_enabled(fork::RETARGET) {
			return self.bits_high();
		}

		if is_retarget_height(self.data.height) {
			return work_required_retarget(
				max_work_bits,
				self.data.timestamp_retarget,
				self.timestamp_high(),
				self.bits_high(),
			);
		}

		if !self.is_enabled(fork::DIFFICULT) {
			return self.easy_work_required(max_work_bits);
		}

		self.bits_high()
	}

	/// True if the chain tip behind this state is older than the
	/// configured staleness threshold.
	pub fn is_stale(&self, now: u32) -> bool {
		let stale_seconds = self.consensus.stale_seconds();
		stale_seconds != 0 && now.saturating_sub(self.data.timestamp.own) > stale_seconds
	}

	fn bits_high(&self) -> Compact {
		let bits = *self.data.bits.ordered.last()
			.expect("height != 0, so the map requests at least one bits entry");
		Compact::new(bits)
	}

	fn timestamp_high(&self) -> u32 {
		*self.data.timestamp.ordered.last()
			.expect("height != 0, so the map requests at least one timestamp entry")
	}

	/// The 20-minute rule: a block arriving two spacings late may use the
	/// minimum difficulty, otherwise the last non-minimal bits apply.
	fn easy_work_required(&self, max_work_bits: Compact) -> Compact {
		if self.data.timestamp.own > self.timestamp_high() + DOUBLE_SPACING_SECONDS {
			return max_work_bits;
		}

		let max_bits: u32 = max_work_bits.into();
		let range = HeightRange { high: self.data.height - 1, count: self.data.bits.ordered.len() as u32 };
		for (index, &bits) in self.data.bits.ordered.iter().enumerate().rev() {
			if bits != max_bits || is_retarget_height(range.height_at(index)) {
				return Compact::new(bits);
			}
		}

		max_work_bits
	}
}

fn promote_range(parent: &RangeData, count: u32, own: u32) -> Option<RangeData> {
	// The parent's window plus its own value must cover the child window.
	if parent.ordered.len() + 1 < count as usize {
		return None;
	}

	let mut ordered = parent.ordered.clone();
	ordered.push(parent.own);
	let excess = ordered.len() - count as usize;
	ordered.drain(..excess);

	Some(RangeData {
		ordered: ordered,
		own: own,
	})
}

use std::cmp;
use primitives::compact::Compact;
use primitives::hash::H256;
use primitives::uint::U256;

use constants::{
	TARGET_TIMESPAN_SECONDS, MIN_TIMESPAN, MAX_TIMESPAN, RETARGETING_INTERVAL,
	SUBSIDY_HALVING_INTERVAL, INITIAL_BLOCK_REWARD,
};

pub fn is_retarget_height(height: u32) -> bool {
	height % RETARGETING_INTERVAL == 0
}

fn range_constrain(value: i64, min: i64, max: i64) -> i64 {
	cmp::min(cmp::max(value, min), max)
}

/// Returns true if hash is lower or equal than target represented by compact bits
pub fn is_valid_proof_of_work_hash(bits: Compact, hash: &H256) -> bool {
	let target = match bits.to_u256() {
		Ok(target) => target,
		_err => return false,
	};

	let value = U256::from(&*hash.reversed() as &[u8]);
	value <= target
}

/// Returns true if the target decodes, is above zero, is lower or equal
/// than the network maximum, and the hash is lower or equal than the target
pub fn is_valid_proof_of_work(max_work_bits: Compact, bits: Compact, hash: &H256) -> bool {
	let maximum = match max_work_bits.to_u256() {
		Ok(max) => max,
		_err => return false,
	};

	let target = match bits.to_u256() {
		Ok(target) => target,
		_err => return false,
	};

	if target.is_zero() || target > maximum {
		return false;
	}

	let value = U256::from(&*hash.reversed() as &[u8]);
	value <= target
}

/// Returns constrained number of seconds since last retarget
pub fn retarget_timespan(retarget_timestamp: u32, last_timestamp: u32) -> u32 {
	// subtract unsigned 32 bit numbers in signed 64 bit space in
	// order to prevent underflow before applying the range constraint.
	let timespan = last_timestamp as i64 - retarget_timestamp as i64;
	range_constrain(timespan, MIN_TIMESPAN as i64, MAX_TIMESPAN as i64) as u32
}

/// Algorithm used for retargeting work every 2 weeks
pub fn work_required_retarget(max_work_bits: Compact, retarget_timestamp: u32, last_timestamp: u32, last_bits: Compact) -> Compact {
	let maximum: U256 = max_work_bits.into();

	let mut retarget: U256 = last_bits.into();
	retarget = retarget.saturating_mul_u64(retarget_timespan(retarget_timestamp, last_timestamp) as u64);
	retarget = retarget / (TARGET_TIMESPAN_SECONDS as u64);

	if retarget > maximum {
		max_work_bits
	} else {
		retarget.into()
	}
}

/// Miner reward at the given height, in base units.
pub fn block_reward_satoshi(block_height: u32) -> u64 {
	let mut reward = INITIAL_BLOCK_REWARD;
	reward >>= block_height / SUBSIDY_HALVING_INTERVAL;
	reward
}

#[cfg(test)]
mod tests {
	use primitives::compact::Compact;
	use primitives::hash::H256;
	use primitives::uint::U256;
	use super::{
		is_retarget_height, is_valid_proof_of_work, is_valid_proof_of_work_hash,
		retarget_timespan, work_required_retarget, block_reward_satoshi,
	};

	fn max_work_bits() -> Compact {
		Compact::new(0x1d00ffff)
	}

	#[test]
	fn test_is_retarget_height() {
		assert!(is_retarget_height(0));
		assert!(is_retarget_height(2016));
		assert!(is_retarget_height(4032));
		assert!(!is_retarget_height(1));
		assert!(!is_retarget_height(2015));
	}

	#[test]
	fn test_is_valid_proof_of_work_hash() {
		// genesis block hash satisfies the maximum target
		let hash = H256::from_reversed_str("000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f");
		assert!(is_valid_proof_of_work_hash(max_work_bits(), &hash));

		// an all-ones hash does not
		let hash = H256::from([0xff; 32]);
		assert!(!is_valid_proof_of_work_hash(max_work_bits(), &hash));
	}

	#[test]
	fn test_is_valid_proof_of_work_rejects_above_maximum_target() {
		let hash = H256::from_reversed_str("000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f");
		// target is easier than the network maximum
		assert!(!is_valid_proof_of_work(max_work_bits(), Compact::new(0x1e00ffff), &hash));
		// zero target never validates
		assert!(!is_valid_proof_of_work(max_work_bits(), Compact::new(0x01000000), &hash));
		assert!(is_valid_proof_of_work(max_work_bits(), max_work_bits(), &hash));
	}

	#[test]
	fn test_retarget_timespan_constrained() {
		// two weeks on the mark
		assert_eq!(retarget_timespan(1000, 1000 + 14 * 24 * 60 * 60), 14 * 24 * 60 * 60);
		// faster than the lower bound
		assert_eq!(retarget_timespan(1000, 1000), 14 * 24 * 60 * 60 / 4);
		// slower than the upper bound
		assert_eq!(retarget_timespan(1000, 1000 + 15_000_000), 14 * 24 * 60 * 60 * 4);
		// timestamps out of order are treated as minimal timespan
		assert_eq!(retarget_timespan(2000, 1000), 14 * 24 * 60 * 60 / 4);
	}

	#[test]
	fn test_work_required_retarget_unchanged_on_target_timespan() {
		let last_bits = Compact::new(0x1d00ffff);
		let retargeted = work_required_retarget(max_work_bits(), 1000, 1000 + 14 * 24 * 60 * 60, last_bits);
		// scaling by exactly the target timespan is an identity, modulo
		// compact precision
		let expected: U256 = last_bits.into();
		let actual: U256 = retargeted.into();
		assert!(actual <= expected);
		assert!(actual >= expected >> 1);
	}

	#[test]
	fn test_work_required_retarget_capped() {
		let retargeted = work_required_retarget(max_work_bits(), 1000, 1000 + 15_000_000, max_work_bits());
		assert_eq!(retargeted, max_work_bits());
	}

	#[test]
	fn test_block_reward_satoshi() {
		assert_eq!(block_reward_satoshi(0), 50 * 100_000_000);
		assert_eq!(block_reward_satoshi(209_999), 50 * 100_000_000);
		assert_eq!(block_reward_satoshi(210_000), 25 * 100_000_000);
		assert_eq!(block_reward_satoshi(420_000), 1_250_000_000);
	}
}

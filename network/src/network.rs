//! Recognized networks and their proof-of-work bounds.

use compact::Compact;
use primitives::uint::U256;
use fork::{self, ForkFlags};

lazy_static! {
	static ref MAX_BITS_MAINNET: U256 = "00000000ffff0000000000000000000000000000000000000000000000000000".parse()
		.expect("hardcoded value should parse without errors");
	static ref MAX_BITS_TESTNET: U256 = "00000000ffff0000000000000000000000000000000000000000000000000000".parse()
		.expect("hardcoded value should parse without errors");
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Network {
	/// The original and main network, where coins have real economic value.
	Mainnet,
	/// The public test network.
	Testnet,
	/// Network for unit tests, proof of work difficulty is almost 0.
	Unitest,
}

impl Network {
	pub fn max_bits(&self) -> U256 {
		match *self {
			Network::Mainnet => MAX_BITS_MAINNET.clone(),
			Network::Testnet => MAX_BITS_TESTNET.clone(),
			Network::Unitest => Compact::max_value().into(),
		}
	}

	pub fn max_work_bits(&self) -> Compact {
		self.max_bits().into()
	}

	/// Forks enabled by default on this network.
	pub fn enabled_forks(&self) -> ForkFlags {
		match *self {
			Network::Mainnet => fork::ALL,
			// The 20-minute rule: testnet difficulty is not maintained
			// between readjustments.
			Network::Testnet => fork::ALL & !fork::DIFFICULT,
			// Unit test chains neither retarget nor carry activation rules.
			Network::Unitest => fork::BIP30,
		}
	}
}

#[cfg(test)]
mod tests {
	use compact::Compact;
	use fork;
	use super::Network;

	#[test]
	fn test_network_max_bits() {
		assert_eq!(Network::Mainnet.max_work_bits(), Compact::new(0x1d00ffff));
		assert_eq!(Network::Testnet.max_work_bits(), Compact::new(0x1d00ffff));
		assert_eq!(Network::Unitest.max_bits(), Compact::max_value().into());
	}

	#[test]
	fn test_network_enabled_forks() {
		assert!(fork::is_enabled(Network::Mainnet.enabled_forks(), fork::DIFFICULT));
		assert!(!fork::is_enabled(Network::Testnet.enabled_forks(), fork::DIFFICULT));
		assert!(!fork::is_enabled(Network::Unitest.enabled_forks(), fork::RETARGET));
	}
}

use hash::H256;
use checkpoint::{self, Checkpoint};
use fork::ForkFlags;
use network::Network;

/// Parameters that influence chain consensus.
#[derive(Debug, Clone)]
pub struct ConsensusParams {
	/// Network.
	pub network: Network,
	/// Enabled rule forks.
	pub enabled_forks: ForkFlags,
	/// Checkpointed block hashes, sorted by height.
	pub checkpoints: Vec<Checkpoint>,
	/// Block at which BIP34 activated. Above it transaction id collisions
	/// are allowed, as BIP34 makes them computationally implausible.
	pub bip34_checkpoint: Option<Checkpoint>,
	/// The maximum height of version 1 blocks.
	pub max_version1_height: u32,
	/// Heights excluded from the BIP30 duplicate check.
	/// See https://github.com/bitcoin/bips/blob/master/bip-0030.mediawiki#specification
	pub bip30_exceptions: Vec<u32>,
	/// The chain is considered stale when the top block is older than this
	/// many hours.
	pub notify_limit_hours: u32,
	/// Pool entries this far below the indexed top are pruned.
	pub reorganization_limit: u32,
}

impl ConsensusParams {
	pub fn new(network: Network) -> Self {
		match network {
			Network::Mainnet => ConsensusParams {
				network: network,
				enabled_forks: network.enabled_forks(),
				checkpoints: checkpoint::sort(vec![
					Checkpoint::new(227931, H256::from_reversed_str("000000000000024b89b42a942fe0d9fea3bb44ab7bd1b19115dd6a759c0808b8")),
					Checkpoint::new(363725, H256::from_reversed_str("00000000000000000379eaa19dce8c9b722d46ae6a57c2f1a988119488b50931")),
					Checkpoint::new(388381, H256::from_reversed_str("000000000000000004c2b624ed5d7756c508d90fd0da2c7c679febfa6c4735f0")),
				]),
				bip34_checkpoint: Some(Checkpoint::new(227931, H256::from_reversed_str("000000000000024b89b42a942fe0d9fea3bb44ab7bd1b19115dd6a759c0808b8"))),
				max_version1_height: 237370,
				bip30_exceptions: vec![91842, 91880],
				notify_limit_hours: 24,
				reorganization_limit: 256,
			},
			Network::Testnet => ConsensusParams {
				network: network,
				enabled_forks: network.enabled_forks(),
				checkpoints: checkpoint::sort(vec![
					Checkpoint::new(21111, H256::from_reversed_str("0000000023b3a96d3484e5abb3755c413e7d41500f8e2a5c3f0dd01299cd8ef8")),
					Checkpoint::new(330776, H256::from_reversed_str("000000002104c8c45e99a8853285a3b592602a3ccde2b832481da85e9e4ba182")),
				]),
				bip34_checkpoint: Some(Checkpoint::new(21111, H256::from_reversed_str("0000000023b3a96d3484e5abb3755c413e7d41500f8e2a5c3f0dd01299cd8ef8"))),
				max_version1_height: 237370,
				bip30_exceptions: vec![],
				notify_limit_hours: 24,
				reorganization_limit: 256,
			},
			Network::Unitest => ConsensusParams {
				network: network,
				enabled_forks: network.enabled_forks(),
				checkpoints: vec![],
				bip34_checkpoint: None,
				max_version1_height: 237370,
				bip30_exceptions: vec![],
				notify_limit_hours: 24,
				reorganization_limit: 256,
			},
		}
	}

	pub fn stale_seconds(&self) -> u32 {
		self.notify_limit_hours * 3600
	}

	pub fn is_bip30_exception(&self, height: u32) -> bool {
		self.bip30_exceptions.contains(&height)
	}
}

#[cfg(test)]
mod tests {
	use network::Network;
	use super::ConsensusParams;

	#[test]
	fn test_consensus_params_bip30_exceptions() {
		let params = ConsensusParams::new(Network::Mainnet);
		assert!(params.is_bip30_exception(91842));
		assert!(params.is_bip30_exception(91880));
		assert!(!params.is_bip30_exception(91881));
		assert!(!ConsensusParams::new(Network::Testnet).is_bip30_exception(91842));
	}

	#[test]
	fn test_consensus_params_checkpoints_sorted() {
		let params = ConsensusParams::new(Network::Mainnet);
		let mut sorted = params.checkpoints.clone();
		sorted.sort_by_key(|checkpoint| checkpoint.height);
		assert_eq!(params.checkpoints, sorted);
	}

	#[test]
	fn test_consensus_params_stale_seconds() {
		let params = ConsensusParams::new(Network::Mainnet);
		assert_eq!(params.stale_seconds(), 24 * 3600);
	}
}

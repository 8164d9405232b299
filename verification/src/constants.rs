//! Consensus constants

pub const MAX_BLOCK_SIZE: usize = 1_000_000;
pub const MAX_BLOCK_SIGOPS: usize = MAX_BLOCK_SIZE / 50;

pub const BLOCK_MAX_FUTURE: u32 = 2 * 60 * 60; // 2 hours
pub const COINBASE_MATURITY: u32 = 100;
pub const MIN_COINBASE_SIZE: usize = 2;
pub const MAX_COINBASE_SIZE: usize = 100;

pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

pub const RETARGETING_FACTOR: u32 = 4;
pub const TARGET_SPACING_SECONDS: u32 = 10 * 60;
pub const DOUBLE_SPACING_SECONDS: u32 = 2 * TARGET_SPACING_SECONDS;
pub const TARGET_TIMESPAN_SECONDS: u32 = 2 * 7 * 24 * 60 * 60;

// The upper and lower bounds for retargeting timespan
pub const MIN_TIMESPAN: u32 = TARGET_TIMESPAN_SECONDS / RETARGETING_FACTOR;
pub const MAX_TIMESPAN: u32 = TARGET_TIMESPAN_SECONDS * RETARGETING_FACTOR;

// Target number of blocks between readjustments, 2 weeks worth
pub const RETARGETING_INTERVAL: u32 = TARGET_TIMESPAN_SECONDS / TARGET_SPACING_SECONDS;

// Timestamps of this many preceding blocks vote on the effective "time"
pub const MEDIAN_TIME_PAST_INTERVAL: u32 = 11;

// Version sample used for fork signaling
pub const ACTIVATION_SAMPLE: u32 = 1000;
pub const ACTIVATION_THRESHOLD: usize = 750;

// Block subsidy halves every such number of blocks
pub const SUBSIDY_HALVING_INTERVAL: u32 = 210_000;
pub const INITIAL_BLOCK_REWARD: u64 = 50 * 100_000_000;

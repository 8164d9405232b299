// Below this number lock_time is interpreted as a block number,
// otherwise as a unix timestamp.
pub const LOCKTIME_THRESHOLD: u32 = 500000000; // Tue Nov  5 00:53:20 1985 UTC

// Setting the sequence to this value for every input in a transaction
// disables the lock_time feature.
pub const SEQUENCE_FINAL: u32 = 0xffffffff;

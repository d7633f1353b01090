pub mod block;
pub mod model;
pub mod pow;

pub use block::Block;
pub use model::Ledger;

/// Default Proof-of-Work difficulty (number of leading zeros).
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// Reward paid to the miner of each block.
pub const DEFAULT_MINING_REWARD: u64 = 100;

/// A SHA-256 hex digest has 64 characters; no higher target can be met.
pub const DIFF_MAX: u32 = 64;

/// Genesis timestamp: 2017-01-01T00:00:00Z in Unix milliseconds.
pub const GENESIS_TIMESTAMP: i64 = 1_483_228_800_000;

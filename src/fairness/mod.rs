pub mod chain;
pub mod crash;
pub mod verify;

pub use chain::{ChainError, HashChain};
pub use crash::{crash_point, multiplier_at, winnings};
pub use verify::{commitment, is_well_formed, verify_link, verify_reveal};

/// Public salt mixed into every crash derivation.
pub const SALT: &str = "sky-crash-provably-fair-v1";

/// Number of hashes precomputed per chain.
pub const DEFAULT_CHAIN_LENGTH: usize = 10_000;

/// Multiplicative edge kept by the house (payout factor).
pub const HOUSE_EDGE_FACTOR: f64 = 0.97;

/// Exponential growth rate of the in-flight multiplier, per second.
pub const GROWTH_RATE: f64 = 0.07;

/// Floor of every crash point.
pub const MIN_CRASH_POINT: f64 = 1.00;

/// Published alongside the chain head so anyone can audit a round.
pub const VERIFICATION_FORMULA: &str = "Each round hash is the next in a SHA-256 chain. \
Verify: SHA256(round_hash) === previous_round_hash. \
Crash = HMAC-SHA256(round_hash, salt), first 8 hex chars to int, \
crashPoint = max(1.00, (2^32 / (int+1)) * 0.97), truncated to 2 decimals";

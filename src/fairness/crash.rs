use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::{GROWTH_RATE, HOUSE_EDGE_FACTOR, MIN_CRASH_POINT, SALT};

type HmacSha256 = Hmac<Sha256>;

/// Truncate (never round) to two decimal places.
fn truncate_cents(value: f64) -> f64 {
    (value * 100.0).floor() / 100.0
}

/// Derive the crash multiplier committed to by a chain hash.
///
/// HMAC-SHA256 keyed by the hash over the public salt; the first 32 bits of
/// the digest pick a point on a Pareto-like curve scaled by the house edge.
/// Pure: the same hash always gives the same multiplier.
pub fn crash_point(hash: &str) -> f64 {
    let mut mac =
        HmacSha256::new_from_slice(hash.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(SALT.as_bytes());
    let digest = mac.finalize().into_bytes();

    // First 8 hex characters of the digest.
    let d = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    let raw = (2f64.powi(32) / (f64::from(d) + 1.0)) * HOUSE_EDGE_FACTOR;
    truncate_cents(raw.max(MIN_CRASH_POINT))
}

/// In-flight multiplier after `elapsed_ms` of flight.
///
/// Both the crash check and cash-out go through this one function so they
/// can never disagree about where the curve is.
pub fn multiplier_at(elapsed_ms: i64) -> f64 {
    let elapsed_secs = elapsed_ms.max(0) as f64 / 1000.0;
    truncate_cents((GROWTH_RATE * elapsed_secs).exp())
}

/// Payout for a cash-out, truncated to cents.
pub fn winnings(bet_amount: f64, multiplier: f64) -> f64 {
    truncate_cents(bet_amount * multiplier)
}

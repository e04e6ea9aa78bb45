use serde::Serialize;

use super::chain::sha256_hex;
use super::crash::crash_point;

/// Commitment published for a round before its hash is revealed.
pub fn commitment(hash: &str) -> String {
    sha256_hex(hash)
}

/// Everything a player can recompute from a revealed hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reveal {
    pub hash: String,
    pub crash_point: f64,
    pub commitment: String,
}

/// Recompute the crash point and commitment of a revealed hash.
pub fn verify_reveal(hash: &str) -> Reveal {
    Reveal {
        hash: hash.to_string(),
        crash_point: crash_point(hash),
        commitment: commitment(hash),
    }
}

/// True when `hash` is the chain successor of `previous`.
pub fn verify_link(hash: &str, previous: &str) -> bool {
    sha256_hex(hash) == previous
}

/// Round hashes are 32-byte SHA-256 digests in lowercase hex.
pub fn is_well_formed(hash: &str) -> bool {
    hash.len() == 64
        && hash
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

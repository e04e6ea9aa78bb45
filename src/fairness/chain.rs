use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};

/// Bytes of OS randomness behind every chain seed.
const SEED_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainError {
    /// Every hash of the chain has been handed out.
    #[error("hash chain exhausted")]
    Exhausted,

    #[error("hash chain length must be at least 1")]
    Empty,
}

/// SHA-256 of the ASCII text of `input`, hex encoded.
///
/// Chain elements are hashed as their hex text so anyone can replay the
/// chain with a stock `sha256` tool.
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}

/// Precomputed SHA-256 chain where `chain[i] == SHA256(chain[i + 1])`.
///
/// `chain[0]` is the head and is published before any of its rounds are
/// played. Hashes are issued from the head onward, so every revealed hash
/// hashes to the one revealed before it.
#[derive(Debug)]
pub struct HashChain {
    chain: Vec<String>,
    cursor: usize,
    generation: u64,
}

impl HashChain {
    /// Build a chain of `length` hashes from a fresh random seed.
    pub fn generate(length: usize, generation: u64) -> Result<Self, ChainError> {
        let mut seed = [0u8; SEED_BYTES];
        OsRng.fill_bytes(&mut seed);
        Self::from_seed(&hex::encode(seed), length, generation)
    }

    /// Build a chain from a known seed. The seed never leaves this call.
    pub fn from_seed(seed: &str, length: usize, generation: u64) -> Result<Self, ChainError> {
        if length == 0 {
            return Err(ChainError::Empty);
        }

        let mut chain = Vec::with_capacity(length);
        let mut current = sha256_hex(seed);
        chain.push(current.clone());
        for _ in 1..length {
            current = sha256_hex(&current);
            chain.push(current.clone());
        }
        // Most-iterated hash first.
        chain.reverse();

        Ok(Self {
            chain,
            cursor: 0,
            generation,
        })
    }

    /// Hand out the next unrevealed hash.
    pub fn next(&mut self) -> Result<String, ChainError> {
        let hash = self.chain.get(self.cursor).ok_or(ChainError::Exhausted)?;
        self.cursor += 1;
        Ok(hash.clone())
    }

    pub fn head(&self) -> &str {
        &self.chain[0]
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// How many hashes have been issued so far.
    pub fn index(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.chain.len() - self.cursor
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Re-check every link of the chain.
    pub fn is_valid(&self) -> bool {
        self.chain
            .windows(2)
            .all(|pair| sha256_hex(&pair[1]) == pair[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_link_hashes_to_its_predecessor() {
        let chain = HashChain::generate(crate::fairness::DEFAULT_CHAIN_LENGTH, 1).unwrap();
        assert_eq!(chain.len(), crate::fairness::DEFAULT_CHAIN_LENGTH);
        for i in 1..chain.len() {
            assert_eq!(sha256_hex(&chain.chain[i]), chain.chain[i - 1]);
        }
        assert!(chain.is_valid());
    }

    #[test]
    fn known_seed_builds_reverse_iterated_chain() {
        let seed = "deadbeef";
        let h2 = sha256_hex(seed);
        let h1 = sha256_hex(&h2);
        let h0 = sha256_hex(&h1);

        let mut chain = HashChain::from_seed(seed, 3, 1).unwrap();
        assert_eq!(chain.head(), h0);
        assert_eq!(chain.next().unwrap(), h0);
        assert_eq!(chain.next().unwrap(), h1);
        assert_eq!(chain.next().unwrap(), h2);
        assert_eq!(chain.next(), Err(ChainError::Exhausted));
        // Stays exhausted; nothing is issued twice.
        assert_eq!(chain.next(), Err(ChainError::Exhausted));
    }

    #[test]
    fn cursor_counters_track_issued_hashes() {
        let mut chain = HashChain::from_seed("seed", 4, 7).unwrap();
        assert_eq!((chain.index(), chain.remaining()), (0, 4));
        chain.next().unwrap();
        chain.next().unwrap();
        assert_eq!((chain.index(), chain.remaining()), (2, 2));
        assert_eq!(chain.generation(), 7);
    }

    #[test]
    fn zero_length_is_rejected() {
        assert_eq!(HashChain::generate(0, 1).unwrap_err(), ChainError::Empty);
    }

    #[test]
    fn fresh_seeds_give_distinct_heads() {
        let a = HashChain::generate(8, 1).unwrap();
        let b = HashChain::generate(8, 2).unwrap();
        assert_ne!(a.head(), b.head());
    }

    #[test]
    fn tampered_chain_is_invalid() {
        let mut chain = HashChain::from_seed("seed", 5, 1).unwrap();
        chain.chain[2] = sha256_hex("forged");
        assert!(!chain.is_valid());
    }
}

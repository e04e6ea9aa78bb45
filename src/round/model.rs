use serde::Serialize;

use crate::fairness::{commitment, crash_point};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStatus {
    Betting,
    Flying,
    Crashed,
}

/// The single live round every client races against.
#[derive(Debug, Clone)]
pub struct Round {
    pub id: String,
    /// Chain element owned by this round; secret until the crash.
    pub hash: String,
    pub commitment: String,
    /// Fixed at creation from `hash`.
    pub crash_point: f64,
    /// Unix millis, set on `start`.
    pub start_time: Option<i64>,
    pub status: RoundStatus,
    pub cashed_out: bool,
    pub cashout_multiplier: Option<f64>,
}

impl Round {
    /// Open a betting round bound to `hash`.
    pub fn new(id: String, hash: String) -> Self {
        Self {
            id,
            commitment: commitment(&hash),
            crash_point: crash_point(&hash),
            hash,
            start_time: None,
            status: RoundStatus::Betting,
            cashed_out: false,
            cashout_multiplier: None,
        }
    }

    /// Milliseconds in flight at `now_ms` (zero before start).
    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        self.start_time.map_or(0, |start| now_ms - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_round_commits_to_its_hash() {
        let hash = "c9ab32efb0f8ae6ecc20b6a4ffdb1273058dc222071d6814ee724e6b1e3fb7b4";
        let round = Round::new("r1".into(), hash.into());
        assert_eq!(round.status, RoundStatus::Betting);
        assert_eq!(round.crash_point, 2.53);
        assert_eq!(
            round.commitment,
            "bf99f8f15fe708ef208d0f00ad96f75c54d8f6c614e0bd7f7e6efb16e7dff00d"
        );
        assert!(round.start_time.is_none());
        assert_eq!(round.elapsed_ms(1_000), 0);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RoundStatus::Flying).unwrap(),
            "\"flying\""
        );
    }
}

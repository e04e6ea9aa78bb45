use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

use super::error::RoundError;
use super::model::{Round, RoundStatus};
use crate::fairness::{ChainError, HashChain, multiplier_at, winnings};
use crate::history::{History, HistoryEntry};

/// Public half of a freshly opened round. Never carries the hash.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRound {
    pub round_id: String,
    pub commitment: String,
}

/// Result of one crash check.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// Nothing is flying.
    Idle,
    Flying { multiplier: f64 },
    /// The round just crashed; `entry` is the full reveal.
    Crashed { entry: HistoryEntry, multiplier: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Started {
    pub round_id: String,
    /// Unix millis; the authority for every multiplier of the round.
    pub start_time: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CashOut {
    pub multiplier: f64,
    pub winnings: f64,
}

/// Read-only view of the live round, without its secret.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveRound {
    pub round_id: String,
    pub status: RoundStatus,
    pub commitment: String,
    pub start_time: Option<i64>,
    pub cashed_out: bool,
    pub cashout_multiplier: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub chain_head: String,
    pub chain_generation: u64,
    pub chain_length: usize,
    pub chain_index: usize,
    pub rounds_remaining: usize,
    pub history_size: usize,
    pub live_round: Option<LiveRound>,
}

/// Owner of the hash chain, the single live round and the history ring.
///
/// Every mutation goes through `&mut self`; callers share the engine
/// behind one lock so a tick and a cash-out are totally ordered.
#[derive(Debug)]
pub struct RoundEngine {
    chain: HashChain,
    chain_length: usize,
    current: Option<Round>,
    /// Id of the round whose crash cleared `current`, until the next round opens.
    last_crashed: Option<String>,
    history: History,
}

impl RoundEngine {
    /// Start with a freshly generated chain of `chain_length` hashes.
    pub fn new(chain_length: usize) -> Result<Self, ChainError> {
        let chain = HashChain::generate(chain_length, 1)?;
        debug_assert!(chain.is_valid());
        info!(
            "CHAIN - generation 1 ready ({} hashes), head={}",
            chain.len(),
            chain.head()
        );
        Ok(Self::with_chain(chain))
    }

    pub fn with_chain(chain: HashChain) -> Self {
        Self {
            chain_length: chain.len(),
            chain,
            current: None,
            last_crashed: None,
            history: History::default(),
        }
    }

    /// Seed the in-memory history from entries listed newest first.
    pub fn restore_history(&mut self, newest_first: Vec<HistoryEntry>) {
        for entry in newest_first.into_iter().rev() {
            self.history.record(entry);
        }
    }

    pub fn chain_head(&self) -> &str {
        self.chain.head()
    }

    pub fn chain_generation(&self) -> u64 {
        self.chain.generation()
    }

    pub fn chain_len(&self) -> usize {
        self.chain.len()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Open a betting round on the next chain hash.
    ///
    /// Precondition: no round is live. A live round is abandoned, not
    /// settled. Issuing the last hash of a chain rotates to a fresh chain
    /// at once, so its head is public before any round uses it.
    pub fn new_round(&mut self) -> Result<NewRound, RoundError> {
        let hash = self.next_hash()?;
        let issued_index = self.chain.index() - 1;
        if self.chain.remaining() == 0 && self.regenerate_chain().is_err() {
            warn!("CHAIN - rotation deferred to the next round");
        }

        if let Some(old) = self.current.take() {
            warn!(
                "ROUND - {} abandoned while {:?}; new round requested",
                old.id, old.status
            );
        }
        self.last_crashed = None;

        let round = Round::new(Uuid::new_v4().to_string(), hash);
        debug!(
            "ROUND - {} opened (chain index {}), commitment={}",
            round.id, issued_index, round.commitment
        );
        let opened = NewRound {
            round_id: round.id.clone(),
            commitment: round.commitment.clone(),
        };
        self.current = Some(round);
        Ok(opened)
    }

    /// A chain left exhausted by a failed rotation is rebuilt here.
    fn next_hash(&mut self) -> Result<String, RoundError> {
        match self.chain.next() {
            Ok(hash) => Ok(hash),
            Err(ChainError::Exhausted) => {
                self.regenerate_chain()?;
                self.chain.next().map_err(|_| RoundError::NoChainAvailable)
            }
            Err(ChainError::Empty) => Err(RoundError::NoChainAvailable),
        }
    }

    fn regenerate_chain(&mut self) -> Result<(), RoundError> {
        let generation = self.chain.generation() + 1;
        let chain = HashChain::generate(self.chain_length, generation).map_err(|e| {
            warn!("CHAIN - regeneration failed: {e}");
            RoundError::NoChainAvailable
        })?;
        debug_assert!(chain.is_valid());
        info!(
            "CHAIN - generation {} exhausted, generation {} head={}",
            self.chain.generation(),
            generation,
            chain.head()
        );
        self.chain = chain;
        Ok(())
    }

    pub fn start(&mut self, round_id: Option<&str>) -> Result<Started, RoundError> {
        self.start_at(round_id, Utc::now().timestamp_millis())
    }

    /// Move the pending round into flight.
    pub fn start_at(
        &mut self,
        round_id: Option<&str>,
        now_ms: i64,
    ) -> Result<Started, RoundError> {
        let round = self
            .current
            .as_mut()
            .filter(|r| r.status == RoundStatus::Betting)
            .filter(|r| round_id.is_none_or(|id| id == r.id))
            .ok_or(RoundError::NoActiveRound)?;

        round.status = RoundStatus::Flying;
        round.start_time = Some(now_ms);
        info!("ROUND - {} flying at {}", round.id, now_ms);
        Ok(Started {
            round_id: round.id.clone(),
            start_time: now_ms,
        })
    }

    pub fn tick(&mut self) -> Tick {
        self.tick_at(Utc::now().timestamp_millis())
    }

    /// Crash check. Idempotent while flying; the first call at or past the
    /// crash point ends the round and reveals it.
    pub fn tick_at(&mut self, now_ms: i64) -> Tick {
        let Some(round) = self
            .current
            .as_mut()
            .filter(|r| r.status == RoundStatus::Flying)
        else {
            return Tick::Idle;
        };

        let multiplier = multiplier_at(round.elapsed_ms(now_ms));
        if multiplier < round.crash_point {
            return Tick::Flying { multiplier };
        }

        round.status = RoundStatus::Crashed;
        let entry = HistoryEntry {
            id: round.id.clone(),
            crash_point: round.crash_point,
            hash: round.hash.clone(),
            commitment: round.commitment.clone(),
            crashed_at: now_ms,
        };
        info!(
            "ROUND - {} crashed at {:.2}x (cashed_out={})",
            entry.id, entry.crash_point, round.cashed_out
        );

        self.history.record(entry.clone());
        self.last_crashed = Some(entry.id.clone());
        self.current = None;
        Tick::Crashed { entry, multiplier }
    }

    pub fn cash_out(&mut self, bet_amount: f64) -> Result<CashOut, RoundError> {
        self.cash_out_at(bet_amount, Utc::now().timestamp_millis())
    }

    /// Lock in the current multiplier for the live round.
    ///
    /// Uses the same curve as [`tick_at`](Self::tick_at), so a cash-out at
    /// or past the crash point is too late even if no tick has seen it yet.
    /// The round keeps flying afterwards.
    pub fn cash_out_at(&mut self, bet_amount: f64, now_ms: i64) -> Result<CashOut, RoundError> {
        let Some(round) = self.current.as_mut() else {
            return Err(if self.last_crashed.is_some() {
                RoundError::TooLate
            } else {
                RoundError::NotFlying
            });
        };
        if round.cashed_out {
            return Err(RoundError::AlreadyCashedOut);
        }
        if round.status != RoundStatus::Flying {
            return Err(RoundError::NotFlying);
        }

        let multiplier = multiplier_at(round.elapsed_ms(now_ms));
        if multiplier >= round.crash_point {
            debug!("ROUND - {} cash-out too late at {:.2}x", round.id, multiplier);
            return Err(RoundError::TooLate);
        }

        round.cashed_out = true;
        round.cashout_multiplier = Some(multiplier);
        let payout = winnings(bet_amount, multiplier);
        info!(
            "ROUND - {} cashed out at {:.2}x (bet={}, winnings={})",
            round.id, multiplier, bet_amount, payout
        );
        Ok(CashOut {
            multiplier,
            winnings: payout,
        })
    }

    pub fn status(&self) -> EngineStatus {
        EngineStatus {
            chain_head: self.chain.head().to_string(),
            chain_generation: self.chain.generation(),
            chain_length: self.chain.len(),
            chain_index: self.chain.index(),
            rounds_remaining: self.chain.remaining(),
            history_size: self.history.len(),
            live_round: self.current.as_ref().map(|r| LiveRound {
                round_id: r.id.clone(),
                status: r.status,
                commitment: r.commitment.clone(),
                start_time: r.start_time,
                cashed_out: r.cashed_out,
                cashout_multiplier: r.cashout_multiplier,
            }),
        }
    }
}

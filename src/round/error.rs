/// Protocol failures of the round state machine.
///
/// None of these are fatal: the engine stays ready for the next round.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    #[error("No active round")]
    NoActiveRound,

    #[error("Round is not flying")]
    NotFlying,

    #[error("Already cashed out this round")]
    AlreadyCashedOut,

    #[error("Too late! Plane crashed.")]
    TooLate,

    /// Chain regeneration produced nothing to issue.
    #[error("No hash chain available")]
    NoChainAvailable,
}

//! Boundary to the record store that persists the tournament-winner flag.

use crate::models::PlayerId;
use async_trait::async_trait;

/// Failure talking to the record store. The bracket itself stays valid;
/// callers decide whether to retry or notify.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReportError(pub String);

impl ReportError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

impl std::fmt::Display for ReportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ReportError {}

/// Persists the tournament-winner flag for a champion. Implemented by the
/// server over its shared state; tests supply counting or failing mocks.
#[async_trait]
pub trait WinnerReporter: Send + Sync {
    /// Whether the player is already flagged as a tournament winner.
    async fn is_tournament_winner(&self, player: PlayerId) -> Result<bool, ReportError>;

    /// Set or clear the player's tournament-winner flag.
    async fn mark_tournament_winner(&self, player: PlayerId, winner: bool)
        -> Result<(), ReportError>;
}

//! Single-elimination bracket: participants, matches, rounds, and the
//! tournament aggregate.

use crate::models::player::{Player, PlayerId, Tier};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors that can occur during bracket operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BracketError {
    /// Fewer than 2 entrants at generation time.
    InsufficientParticipants { count: usize },
    /// No tournament is currently active.
    NoActiveTournament,
    /// No match at the given round/index.
    MatchNotFound { round: usize, match_index: usize },
    /// The match already has a winner.
    MatchAlreadyCompleted,
    /// Round 1 slot missing a player, or a feeder match is not completed yet.
    MatchNotReady,
    /// A non-bye match needs an explicit winner choice.
    MissingWinnerChoice,
    /// The chosen winner is not one of the match's two players.
    InvalidWinner,
    /// The champion was decided but reporting it to the record store failed.
    /// Bracket state is already applied and remains authoritative.
    WinnerReportFailed(String),
}

impl std::fmt::Display for BracketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BracketError::InsufficientParticipants { count } => {
                write!(f, "Need at least 2 players to generate a tournament (have {})", count)
            }
            BracketError::NoActiveTournament => write!(f, "No active tournament"),
            BracketError::MatchNotFound { round, match_index } => {
                write!(f, "No match at round {} index {}", round, match_index)
            }
            BracketError::MatchAlreadyCompleted => write!(f, "Match already has a winner"),
            BracketError::MatchNotReady => write!(f, "Match is not ready to be decided"),
            BracketError::MissingWinnerChoice => write!(f, "A winner must be chosen for this match"),
            BracketError::InvalidWinner => write!(f, "Chosen winner is not in this match"),
            BracketError::WinnerReportFailed(msg) => {
                write!(f, "Champion decided but could not be recorded: {}", msg)
            }
        }
    }
}

impl std::error::Error for BracketError {}

/// Tier filter a bracket was generated from: everyone, or a single tier.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierFilter {
    #[default]
    All,
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl TierFilter {
    /// Whether a player of the given tier enters a bracket under this filter.
    pub fn admits(self, tier: Tier) -> bool {
        match self {
            TierFilter::All => true,
            TierFilter::Bronze => tier == Tier::Bronze,
            TierFilter::Silver => tier == Tier::Silver,
            TierFilter::Gold => tier == Tier::Gold,
            TierFilter::Platinum => tier == Tier::Platinum,
            TierFilter::Diamond => tier == Tier::Diamond,
        }
    }
}

/// A bracket entrant: a snapshot of a player at generation time, or a bye.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    /// Player id for real entrants; a freshly generated sentinel id for byes,
    /// so identity comparisons are always by id.
    pub id: PlayerId,
    pub name: String,
    pub points: u32,
    /// None for byes.
    pub tier: Option<Tier>,
    /// 1-based display rank, fixed from post-shuffle position.
    pub seed: u32,
    pub is_bye: bool,
}

impl Participant {
    /// Snapshot a roster player as a bracket entrant (seed assigned later).
    pub fn from_player(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            points: p.points,
            tier: Some(p.tier()),
            seed: 0,
            is_bye: false,
        }
    }

    /// A bye placeholder padding the field to a power of two.
    pub fn bye() -> Self {
        Self {
            id: Uuid::new_v4(),
            name: "BYE".to_string(),
            points: 0,
            tier: None,
            seed: 0,
            is_bye: true,
        }
    }
}

/// One match in the bracket. Slots are None until filled by generation
/// (round 1) or winner propagation (later rounds).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    pub player1: Option<Participant>,
    pub player2: Option<Participant>,
    /// Set exactly when `completed` is set, to one of the two slots.
    pub winner: Option<Participant>,
    pub completed: bool,
    /// Index of this match within its round.
    pub match_id: usize,
}

impl BracketMatch {
    /// A round-1 match between two seeded entrants.
    pub fn paired(match_id: usize, player1: Participant, player2: Participant) -> Self {
        Self {
            player1: Some(player1),
            player2: Some(player2),
            winner: None,
            completed: false,
            match_id,
        }
    }

    /// A later-round match awaiting winners from its feeder matches.
    pub fn pending(match_id: usize) -> Self {
        Self {
            player1: None,
            player2: None,
            winner: None,
            completed: false,
            match_id,
        }
    }

    /// Whether either filled slot is a bye.
    pub fn has_bye(&self) -> bool {
        self.player1.as_ref().is_some_and(|p| p.is_bye)
            || self.player2.as_ref().is_some_and(|p| p.is_bye)
    }
}

/// A single-elimination tournament: seeded participants plus the full
/// round structure. Owned by the club aggregate; replaced wholesale on
/// generate and reset.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BracketTournament {
    pub active: bool,
    /// Seed order, byes included at the tail.
    pub participants: Vec<Participant>,
    /// `rounds[0]` is round 1; each round has half the previous round's matches.
    pub rounds: Vec<Vec<BracketMatch>>,
    /// Set only when the final round's single match completes.
    pub winner: Option<Participant>,
    pub tier_filter: TierFilter,
}

impl BracketTournament {
    /// The inactive sentinel: what `reset` installs and what the club starts with.
    pub fn inactive() -> Self {
        Self {
            active: false,
            participants: Vec::new(),
            rounds: Vec::new(),
            winner: None,
            tier_filter: TierFilter::All,
        }
    }

    pub fn total_rounds(&self) -> usize {
        self.rounds.len()
    }

    /// Matches of a 1-based round number.
    pub fn round(&self, round: usize) -> Option<&[BracketMatch]> {
        if round == 0 {
            return None;
        }
        self.rounds.get(round - 1).map(|r| r.as_slice())
    }

    /// A single match by 1-based round and 0-based index within the round.
    pub fn match_at(&self, round: usize, match_index: usize) -> Option<&BracketMatch> {
        self.round(round).and_then(|r| r.get(match_index))
    }

    pub fn is_complete(&self) -> bool {
        self.winner.is_some()
    }
}

impl Default for BracketTournament {
    fn default() -> Self {
        Self::inactive()
    }
}

//! Chess club ranking web app: library with models and business logic.

pub mod logic;
pub mod models;

pub use logic::{
    can_resolve, generate_bracket, generate_bracket_with_rng, points_exchanged, record_casual_match,
    report_champion, resolve_and_report, resolve_match, round_name, round_names, MatchOutcome,
    MatchRecord, ReportError, WinnerReporter,
};
pub use models::{
    ArchiveEntry, ArchiveId, BracketError, BracketMatch, BracketTournament, Club, ClubError,
    LeaderboardRow, Participant, Placement, Player, PlayerId, PlayerStats, Tier, TierFilter,
};

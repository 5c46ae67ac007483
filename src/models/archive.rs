//! Monthly archive records: top-3 placements frozen at month end.

use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an archive entry.
pub type ArchiveId = Uuid;

/// A podium placement snapshot. Name and points are copied at archive time
/// so the record survives the player leaving the club.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub player_id: PlayerId,
    pub name: String,
    pub points: u32,
}

/// One archived month: podium plus headline counts.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    pub id: ArchiveId,
    /// Display label, e.g. "December 2024".
    pub month: String,
    pub first: Placement,
    pub second: Placement,
    pub third: Placement,
    pub total_players: usize,
    pub total_matches: usize,
    pub archived_at: DateTime<Utc>,
}

impl ArchiveEntry {
    pub fn new(
        month: impl Into<String>,
        first: Placement,
        second: Placement,
        third: Placement,
        total_players: usize,
        total_matches: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            month: month.into(),
            first,
            second,
            third,
            total_players,
            total_matches,
            archived_at: Utc::now(),
        }
    }

    /// Whether the given player holds any of the three placements.
    pub fn placed(&self, player_id: PlayerId) -> bool {
        self.first.player_id == player_id
            || self.second.player_id == player_id
            || self.third.player_id == player_id
    }
}

//! Club aggregate: roster, monthly archives, and the current bracket.

use crate::models::archive::{ArchiveEntry, ArchiveId, Placement};
use crate::models::bracket::{BracketTournament, Participant, TierFilter};
use crate::models::player::{LeaderboardRow, Player, PlayerId, Tier};
use serde::{Deserialize, Serialize};

/// Errors from roster and archive operations.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ClubError {
    /// Player name is empty after trimming.
    InvalidName,
    /// A player with this name already exists (names are unique, case-insensitive).
    DuplicatePlayerName,
    /// Player not found in the roster.
    PlayerNotFound(PlayerId),
    /// Archive entry not found.
    ArchiveNotFound(ArchiveId),
    /// A match needs two distinct players.
    SamePlayer,
    /// The same player was selected for more than one podium place.
    DuplicatePlacement,
}

impl std::fmt::Display for ClubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClubError::InvalidName => write!(f, "Player name must not be empty"),
            ClubError::DuplicatePlayerName => write!(f, "A player with this name already exists"),
            ClubError::PlayerNotFound(_) => write!(f, "Player not found"),
            ClubError::ArchiveNotFound(_) => write!(f, "Archive entry not found"),
            ClubError::SamePlayer => write!(f, "Winner and loser must be different players"),
            ClubError::DuplicatePlacement => write!(f, "Podium places must go to different players"),
        }
    }
}

impl std::error::Error for ClubError {}

/// Full club state: players, archives, the running match counter, and the
/// current tournament bracket. One instance per process, owned by the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Club {
    pub players: Vec<Player>,
    /// Newest first.
    pub archives: Vec<ArchiveEntry>,
    /// Casual matches recorded since the last archive cut.
    pub matches_recorded: usize,
    pub tournament: BracketTournament,
}

impl Club {
    /// An empty club with no active tournament.
    pub fn new() -> Self {
        Self {
            players: Vec::new(),
            archives: Vec::new(),
            matches_recorded: 0,
            tournament: BracketTournament::inactive(),
        }
    }

    /// Look up a player by id.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Mutable lookup by id.
    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// Add a player. Names must be non-empty and unique (case-insensitive).
    /// Returns the new player's id.
    pub fn add_player(
        &mut self,
        name: impl Into<String>,
        email: Option<String>,
        points: u32,
    ) -> Result<PlayerId, ClubError> {
        let name = name.into();
        let name_trimmed = name.trim();
        if name_trimmed.is_empty() {
            return Err(ClubError::InvalidName);
        }
        let is_duplicate = self
            .players
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(name_trimmed));
        if is_duplicate {
            return Err(ClubError::DuplicatePlayerName);
        }
        let player = Player::new(name_trimmed, email, points);
        let id = player.id;
        self.players.push(player);
        Ok(id)
    }

    /// Remove a player by id. Archive placements keep their snapshots.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<Player, ClubError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or(ClubError::PlayerNotFound(id))?;
        Ok(self.players.remove(idx))
    }

    /// Set or clear a player's tournament-winner flag.
    pub fn set_tournament_winner(&mut self, id: PlayerId, flag: bool) -> Result<(), ClubError> {
        let p = self.player_mut(id).ok_or(ClubError::PlayerNotFound(id))?;
        p.is_tournament_winner = flag;
        Ok(())
    }

    /// Whether the player holds any podium place in any archived month.
    pub fn is_champion(&self, id: PlayerId) -> bool {
        self.archives.iter().any(|a| a.placed(id))
    }

    /// Leaderboard rows sorted by points, then wins, then win percentage,
    /// all descending.
    pub fn leaderboard(&self) -> Vec<LeaderboardRow> {
        let mut rows: Vec<LeaderboardRow> = self
            .players
            .iter()
            .map(|p| LeaderboardRow {
                id: p.id,
                name: p.name.clone(),
                points: p.points,
                tier: p.tier(),
                wins: p.wins,
                losses: p.losses,
                win_percentage: p.win_percentage(),
                is_champion: self.is_champion(p.id),
                is_tournament_winner: p.is_tournament_winner,
            })
            .collect();
        rows.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then(b.wins.cmp(&a.wins))
                .then(
                    b.win_percentage
                        .partial_cmp(&a.win_percentage)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });
        rows
    }

    /// Top of the leaderboard for the podium display.
    pub fn top3(&self) -> Vec<LeaderboardRow> {
        let mut rows = self.leaderboard();
        rows.truncate(3);
        rows
    }

    /// Bracket entrants under a tier filter. For `All`, players are listed
    /// tier by tier, bronze through diamond, before the engine shuffles them.
    pub fn participants_for(&self, filter: TierFilter) -> Vec<Participant> {
        let mut entrants = Vec::new();
        for tier in Tier::ALL {
            if !filter.admits(tier) {
                continue;
            }
            entrants.extend(
                self.players
                    .iter()
                    .filter(|p| p.tier() == tier)
                    .map(Participant::from_player),
            );
        }
        entrants
    }

    /// Record a month's podium. Placers must exist and be distinct; their
    /// name and points are snapshotted. Resets the running match counter.
    pub fn add_archive(
        &mut self,
        month: impl Into<String>,
        first_id: PlayerId,
        second_id: PlayerId,
        third_id: PlayerId,
    ) -> Result<&ArchiveEntry, ClubError> {
        if first_id == second_id || first_id == third_id || second_id == third_id {
            return Err(ClubError::DuplicatePlacement);
        }
        let placement = |club: &Club, id: PlayerId| -> Result<Placement, ClubError> {
            let p = club.player(id).ok_or(ClubError::PlayerNotFound(id))?;
            Ok(Placement {
                player_id: p.id,
                name: p.name.clone(),
                points: p.points,
            })
        };
        let first = placement(self, first_id)?;
        let second = placement(self, second_id)?;
        let third = placement(self, third_id)?;
        let entry = ArchiveEntry::new(
            month,
            first,
            second,
            third,
            self.players.len(),
            self.matches_recorded,
        );
        self.archives.insert(0, entry);
        self.matches_recorded = 0;
        Ok(&self.archives[0])
    }

    /// Remove an archive entry by id.
    pub fn remove_archive(&mut self, id: ArchiveId) -> Result<ArchiveEntry, ClubError> {
        let idx = self
            .archives
            .iter()
            .position(|a| a.id == id)
            .ok_or(ClubError::ArchiveNotFound(id))?;
        Ok(self.archives.remove(idx))
    }
}

impl Default for Club {
    fn default() -> Self {
        Self::new()
    }
}

//! Casual match recording and the tier-gap points formula.

use crate::models::{Club, ClubError, PlayerId, PlayerStats, Tier};
use serde::{Deserialize, Serialize};

/// Points exchanged for a win, by tier gap: beating someone two or more
/// tiers up is worth 3, one tier up 2, anything else 1.
pub fn points_exchanged(winner: Tier, loser: Tier) -> u32 {
    let gap = loser.rank() as i32 - winner.rank() as i32;
    if gap >= 2 {
        3
    } else if gap == 1 {
        2
    } else {
        1
    }
}

/// Snapshot of both players right after a recorded match (for API responses).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub winner_id: PlayerId,
    pub winner_name: String,
    pub winner: PlayerStats,
    pub loser_id: PlayerId,
    pub loser_name: String,
    pub loser: PlayerStats,
    pub points_exchanged: u32,
}

/// Record a casual (non-bracket) match between two distinct players.
///
/// When `points` is None the tier-gap formula decides the stake. The winner
/// gains the stake and a win; the loser loses the stake (floored at zero)
/// and a loss.
pub fn record_casual_match(
    club: &mut Club,
    winner_id: PlayerId,
    loser_id: PlayerId,
    points: Option<u32>,
) -> Result<MatchRecord, ClubError> {
    if winner_id == loser_id {
        return Err(ClubError::SamePlayer);
    }
    let winner_tier = club
        .player(winner_id)
        .ok_or(ClubError::PlayerNotFound(winner_id))?
        .tier();
    let loser_tier = club
        .player(loser_id)
        .ok_or(ClubError::PlayerNotFound(loser_id))?
        .tier();

    let stake = points.unwrap_or_else(|| points_exchanged(winner_tier, loser_tier));

    let (winner_name, winner_stats) = {
        let w = club
            .player_mut(winner_id)
            .ok_or(ClubError::PlayerNotFound(winner_id))?;
        w.points += stake;
        w.wins += 1;
        (w.name.clone(), w.stats())
    };
    let (loser_name, loser_stats) = {
        let l = club
            .player_mut(loser_id)
            .ok_or(ClubError::PlayerNotFound(loser_id))?;
        l.points = l.points.saturating_sub(stake);
        l.losses += 1;
        (l.name.clone(), l.stats())
    };

    club.matches_recorded += 1;

    Ok(MatchRecord {
        winner_id,
        winner_name,
        winner: winner_stats,
        loser_id,
        loser_name,
        loser: loser_stats,
        points_exchanged: stake,
    })
}

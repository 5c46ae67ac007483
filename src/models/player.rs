//! Player, Tier, and stats/leaderboard view structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player (used in matches, archives, and lookups).
pub type PlayerId = Uuid;

/// Skill tier derived from a player's point total.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

impl Tier {
    /// All tiers in ascending order (used for tier-ordered listings).
    pub const ALL: [Tier; 5] = [
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Diamond,
    ];

    /// Tier for a point total: 0-9 bronze, 10-19 silver, 20-29 gold,
    /// 30-39 platinum, 40+ diamond.
    pub fn from_points(points: u32) -> Self {
        match points {
            0..=9 => Tier::Bronze,
            10..=19 => Tier::Silver,
            20..=29 => Tier::Gold,
            30..=39 => Tier::Platinum,
            _ => Tier::Diamond,
        }
    }

    /// Position in the tier ladder, bronze = 0 .. diamond = 4.
    pub fn rank(self) -> u32 {
        match self {
            Tier::Bronze => 0,
            Tier::Silver => 1,
            Tier::Gold => 2,
            Tier::Platinum => 3,
            Tier::Diamond => 4,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Platinum => "Platinum",
            Tier::Diamond => "Diamond",
        };
        write!(f, "{}", name)
    }
}

/// A registered club member.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// Optional contact address; not used for identity.
    pub email: Option<String>,
    pub points: u32,
    pub wins: u32,
    pub losses: u32,
    /// Set once when the player wins a bracket tournament.
    pub is_tournament_winner: bool,
    pub joined_at: DateTime<Utc>,
}

impl Player {
    /// Create a new player with the given name and starting points.
    pub fn new(name: impl Into<String>, email: Option<String>, points: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email,
            points,
            wins: 0,
            losses: 0,
            is_tournament_winner: false,
            joined_at: Utc::now(),
        }
    }

    /// Current tier, derived from points.
    pub fn tier(&self) -> Tier {
        Tier::from_points(self.points)
    }

    /// Win percentage over all recorded games (0.0 when none played).
    pub fn win_percentage(&self) -> f64 {
        let games = self.wins + self.losses;
        if games == 0 {
            0.0
        } else {
            self.wins as f64 * 100.0 / games as f64
        }
    }

    /// Current stats as a separate struct (for API responses).
    pub fn stats(&self) -> PlayerStats {
        PlayerStats::from_player(self)
    }
}

/// Statistics view of a player (for API / display).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub points: u32,
    pub tier: Tier,
    pub wins: u32,
    pub losses: u32,
    pub win_percentage: f64,
    pub is_tournament_winner: bool,
}

impl PlayerStats {
    pub fn from_player(p: &Player) -> Self {
        Self {
            points: p.points,
            tier: p.tier(),
            wins: p.wins,
            losses: p.losses,
            win_percentage: p.win_percentage(),
            is_tournament_winner: p.is_tournament_winner,
        }
    }
}

/// One row of the public leaderboard, badges included.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardRow {
    pub id: PlayerId,
    pub name: String,
    pub points: u32,
    pub tier: Tier,
    pub wins: u32,
    pub losses: u32,
    pub win_percentage: f64,
    /// Placed in at least one monthly archive.
    pub is_champion: bool,
    pub is_tournament_winner: bool,
}

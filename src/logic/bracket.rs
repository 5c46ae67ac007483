//! Bracket engine: generation, winner advancement, and round naming.

use crate::logic::reporter::WinnerReporter;
use crate::models::{
    BracketError, BracketMatch, BracketTournament, Participant, PlayerId, TierFilter,
};
use rand::seq::SliceRandom;
use rand::Rng;

/// What a resolved match produced.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MatchOutcome {
    /// The winner moved into the given slot of the next round.
    Advanced {
        winner: Participant,
        next_round: usize,
        next_match: usize,
    },
    /// The final is decided; the tournament has a champion.
    Champion { winner: Participant },
}

/// Generate a fresh bracket from the given entrants (thread-local RNG).
pub fn generate_bracket(
    entrants: Vec<Participant>,
    tier_filter: TierFilter,
) -> Result<BracketTournament, BracketError> {
    generate_bracket_with_rng(entrants, tier_filter, &mut rand::thread_rng())
}

/// Generate a fresh bracket, shuffling with the caller's RNG.
///
/// 1. Require at least 2 entrants.
/// 2. Shuffle uniformly.
/// 3. Pad with byes to the next power of two (byes always take the tail seeds).
/// 4. Pair consecutive entrants into round 1; later rounds start empty and
///    fill via winner propagation.
pub fn generate_bracket_with_rng<R: Rng + ?Sized>(
    mut entrants: Vec<Participant>,
    tier_filter: TierFilter,
    rng: &mut R,
) -> Result<BracketTournament, BracketError> {
    if entrants.len() < 2 {
        return Err(BracketError::InsufficientParticipants {
            count: entrants.len(),
        });
    }

    entrants.shuffle(rng);

    let bracket_size = entrants.len().next_power_of_two();
    while entrants.len() < bracket_size {
        entrants.push(Participant::bye());
    }
    for (i, p) in entrants.iter_mut().enumerate() {
        p.seed = (i + 1) as u32;
    }

    let first_round: Vec<BracketMatch> = entrants
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| BracketMatch::paired(i, pair[0].clone(), pair[1].clone()))
        .collect();

    let total_rounds = bracket_size.trailing_zeros() as usize;
    let mut rounds = Vec::with_capacity(total_rounds);
    rounds.push(first_round);
    for _ in 2..=total_rounds {
        let prev_matches = rounds[rounds.len() - 1].len();
        rounds.push((0..prev_matches / 2).map(BracketMatch::pending).collect());
    }

    Ok(BracketTournament {
        active: true,
        participants: entrants,
        rounds,
        winner: None,
        tier_filter,
    })
}

/// Whether the match at (1-based round, 0-based index) can be decided now:
/// it exists, is not completed, and its players are in place — for round 1
/// that means both slots filled, for later rounds that both feeder matches
/// of the previous round are completed.
pub fn can_resolve(t: &BracketTournament, round: usize, match_index: usize) -> bool {
    let Some(m) = t.match_at(round, match_index) else {
        return false;
    };
    if m.completed {
        return false;
    }
    if round == 1 {
        m.player1.is_some() && m.player2.is_some()
    } else {
        let feeders = [match_index * 2, match_index * 2 + 1];
        feeders.iter().all(|&i| {
            t.match_at(round - 1, i)
                .map(|fm| fm.completed)
                .unwrap_or(false)
        })
    }
}

/// Decide the match at (1-based round, 0-based index) and advance the winner.
///
/// Matches with a bye auto-resolve to the other slot's occupant and need no
/// `choice`; all other matches require `choice` to name one of the two
/// players. The winner fills the next round's slot by source-index parity
/// (even index -> player1, odd -> player2). Deciding the final sets the
/// tournament winner.
pub fn resolve_match(
    t: &mut BracketTournament,
    round: usize,
    match_index: usize,
    choice: Option<PlayerId>,
) -> Result<MatchOutcome, BracketError> {
    if !t.active {
        return Err(BracketError::NoActiveTournament);
    }
    let total_rounds = t.total_rounds();
    {
        let m = t
            .match_at(round, match_index)
            .ok_or(BracketError::MatchNotFound { round, match_index })?;
        if m.completed {
            return Err(BracketError::MatchAlreadyCompleted);
        }
    }
    if !can_resolve(t, round, match_index) {
        return Err(BracketError::MatchNotReady);
    }

    let winner = {
        let m = &t.rounds[round - 1][match_index];
        let (p1, p2) = match (&m.player1, &m.player2) {
            (Some(p1), Some(p2)) => (p1, p2),
            _ => return Err(BracketError::MatchNotReady),
        };
        if p1.is_bye || p2.is_bye {
            // A bye in slot 1 forwards slot 2, so a double-bye match forwards
            // its second bye.
            let w = if p1.is_bye { p2.clone() } else { p1.clone() };
            if let Some(chosen) = choice {
                if chosen != w.id {
                    return Err(BracketError::InvalidWinner);
                }
            }
            w
        } else {
            let chosen = choice.ok_or(BracketError::MissingWinnerChoice)?;
            if chosen == p1.id {
                p1.clone()
            } else if chosen == p2.id {
                p2.clone()
            } else {
                return Err(BracketError::InvalidWinner);
            }
        }
    };

    let m = &mut t.rounds[round - 1][match_index];
    m.winner = Some(winner.clone());
    m.completed = true;

    if round < total_rounds {
        let next_match = match_index / 2;
        let next = &mut t.rounds[round][next_match];
        if match_index % 2 == 0 {
            next.player1 = Some(winner.clone());
        } else {
            next.player2 = Some(winner.clone());
        }
        Ok(MatchOutcome::Advanced {
            winner,
            next_round: round + 1,
            next_match,
        })
    } else {
        t.winner = Some(winner.clone());
        Ok(MatchOutcome::Champion { winner })
    }
}

/// Report a newly decided champion to the record store, skipping players
/// already flagged. At most one mark call per champion.
pub async fn report_champion<R>(champion: &Participant, reporter: &R) -> Result<(), BracketError>
where
    R: WinnerReporter + ?Sized,
{
    let already = reporter
        .is_tournament_winner(champion.id)
        .await
        .map_err(|e| BracketError::WinnerReportFailed(e.to_string()))?;
    if !already {
        reporter
            .mark_tournament_winner(champion.id, true)
            .await
            .map_err(|e| BracketError::WinnerReportFailed(e.to_string()))?;
    }
    Ok(())
}

/// Decide a match and, when it crowns a champion, report the champion.
///
/// The bracket transition is applied before the report is issued, so the
/// bracket reflects the result even if reporting fails; a failure surfaces
/// as `WinnerReportFailed` with the state already in place.
pub async fn resolve_and_report<R>(
    t: &mut BracketTournament,
    round: usize,
    match_index: usize,
    choice: Option<PlayerId>,
    reporter: &R,
) -> Result<MatchOutcome, BracketError>
where
    R: WinnerReporter + ?Sized,
{
    let outcome = resolve_match(t, round, match_index, choice)?;
    if let MatchOutcome::Champion { winner } = &outcome {
        report_champion(winner, reporter).await?;
    }
    Ok(outcome)
}

/// Display names for rounds 1..=total_rounds.
///
/// Small brackets use the conventional fixed labels; beyond six rounds the
/// last three are Quarterfinals/Semifinals/Final and the rest are "Round k".
pub fn round_names(total_rounds: usize) -> Vec<String> {
    match total_rounds {
        0 => Vec::new(),
        1 => vec!["Final".to_string()],
        2 => vec!["Semifinals".to_string(), "Final".to_string()],
        3 => vec![
            "Quarterfinals".to_string(),
            "Semifinals".to_string(),
            "Final".to_string(),
        ],
        4 => vec![
            "First Round".to_string(),
            "Quarterfinals".to_string(),
            "Semifinals".to_string(),
            "Final".to_string(),
        ],
        5 => vec![
            "First Round".to_string(),
            "Second Round".to_string(),
            "Quarterfinals".to_string(),
            "Semifinals".to_string(),
            "Final".to_string(),
        ],
        6 => vec![
            "First Round".to_string(),
            "Second Round".to_string(),
            "Third Round".to_string(),
            "Quarterfinals".to_string(),
            "Semifinals".to_string(),
            "Final".to_string(),
        ],
        _ => (1..=total_rounds)
            .map(|r| {
                if r == total_rounds {
                    "Final".to_string()
                } else if r == total_rounds - 1 {
                    "Semifinals".to_string()
                } else if r == total_rounds - 2 {
                    "Quarterfinals".to_string()
                } else {
                    format!("Round {}", r)
                }
            })
            .collect(),
    }
}

/// Name of a single 1-based round, or None when out of range.
pub fn round_name(total_rounds: usize, round: usize) -> Option<String> {
    if round == 0 || round > total_rounds {
        return None;
    }
    round_names(total_rounds).into_iter().nth(round - 1)
}

//! Integration tests for the bracket engine: generation, byes, winner
//! advancement, round naming, and champion reporting.

use async_trait::async_trait;
use chess_club_web::{
    can_resolve, generate_bracket_with_rng, resolve_and_report, resolve_match, round_name,
    round_names, BracketError, BracketTournament, MatchOutcome, Participant, Player, PlayerId,
    ReportError, TierFilter, WinnerReporter,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use uuid::Uuid;

fn entrants(n: usize) -> Vec<Participant> {
    (0..n)
        .map(|i| Participant::from_player(&Player::new(format!("P{i}"), None, (i * 3) as u32)))
        .collect()
}

fn bracket(n: usize) -> BracketTournament {
    generate_bracket_with_rng(entrants(n), TierFilter::All, &mut StdRng::seed_from_u64(7))
        .unwrap()
}

/// Decide every undecided match of a round: byes resolve with no choice,
/// real matches pick player1.
fn decide_round(t: &mut BracketTournament, round: usize) {
    let count = t.round(round).unwrap().len();
    for i in 0..count {
        let m = t.match_at(round, i).unwrap();
        if m.completed {
            continue;
        }
        let choice = if m.has_bye() {
            None
        } else {
            Some(m.player1.as_ref().unwrap().id)
        };
        resolve_match(t, round, i, choice).unwrap();
    }
}

/// Test double for the record store: counts mark calls, can be pre-flagged
/// or set to fail.
#[derive(Default)]
struct RecordingReporter {
    flagged: Mutex<HashSet<PlayerId>>,
    marks: AtomicUsize,
    fail: bool,
}

impl RecordingReporter {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn preflagged(player: PlayerId) -> Self {
        let reporter = Self::default();
        reporter.flagged.lock().unwrap().insert(player);
        reporter
    }

    fn mark_count(&self) -> usize {
        self.marks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WinnerReporter for RecordingReporter {
    async fn is_tournament_winner(&self, player: PlayerId) -> Result<bool, ReportError> {
        if self.fail {
            return Err(ReportError::new("record store offline"));
        }
        Ok(self.flagged.lock().unwrap().contains(&player))
    }

    async fn mark_tournament_winner(
        &self,
        player: PlayerId,
        winner: bool,
    ) -> Result<(), ReportError> {
        if self.fail {
            return Err(ReportError::new("record store offline"));
        }
        self.marks.fetch_add(1, Ordering::SeqCst);
        let mut flagged = self.flagged.lock().unwrap();
        if winner {
            flagged.insert(player);
        } else {
            flagged.remove(&player);
        }
        Ok(())
    }
}

#[test]
fn generate_requires_at_least_2_entrants() {
    for n in [0, 1] {
        let result =
            generate_bracket_with_rng(entrants(n), TierFilter::All, &mut StdRng::seed_from_u64(1));
        assert_eq!(
            result.unwrap_err(),
            BracketError::InsufficientParticipants { count: n }
        );
    }
}

#[test]
fn bracket_shape_for_all_small_entrant_counts() {
    for n in 2..=17 {
        let t = bracket(n);
        let bracket_size = n.next_power_of_two();
        let total_rounds = bracket_size.trailing_zeros() as usize;

        assert!(t.active);
        assert!(t.winner.is_none());
        assert_eq!(t.participants.len(), bracket_size, "n={n}");
        let byes = t.participants.iter().filter(|p| p.is_bye).count();
        assert_eq!(byes, bracket_size - n, "n={n}");
        assert_eq!(t.total_rounds(), total_rounds, "n={n}");
        for r in 1..=total_rounds {
            assert_eq!(
                t.round(r).unwrap().len(),
                bracket_size / 2usize.pow(r as u32),
                "n={n} round={r}"
            );
        }
        // Final round is always a single match.
        assert_eq!(t.round(total_rounds).unwrap().len(), 1);
    }
}

#[test]
fn byes_fill_tail_seeds_in_order() {
    let t = bracket(5);
    assert_eq!(t.participants.len(), 8);
    assert!(t.participants[..5].iter().all(|p| !p.is_bye));
    assert!(t.participants[5..].iter().all(|p| p.is_bye));
    for (i, p) in t.participants.iter().enumerate() {
        assert_eq!(p.seed, (i + 1) as u32);
    }
}

#[test]
fn every_entrant_appears_in_exactly_one_first_round_match() {
    let t = bracket(11);
    let mut seen: Vec<PlayerId> = Vec::new();
    for m in t.round(1).unwrap() {
        seen.push(m.player1.as_ref().unwrap().id);
        seen.push(m.player2.as_ref().unwrap().id);
    }
    let mut expected: Vec<PlayerId> = t.participants.iter().map(|p| p.id).collect();
    seen.sort();
    expected.sort();
    assert_eq!(seen, expected);
}

#[test]
fn three_player_bracket_has_one_bye_that_resolves_without_a_choice() {
    let mut t = bracket(3);
    assert_eq!(t.participants.len(), 4);
    assert_eq!(t.total_rounds(), 2);
    assert_eq!(t.round(1).unwrap().len(), 2);
    assert_eq!(t.round(2).unwrap().len(), 1);

    let bye_index = t
        .round(1)
        .unwrap()
        .iter()
        .position(|m| m.has_bye())
        .unwrap();
    let expected_winner = t.match_at(1, bye_index).unwrap().player1.clone().unwrap();
    assert!(!expected_winner.is_bye);

    let outcome = resolve_match(&mut t, 1, bye_index, None).unwrap();
    let m = t.match_at(1, bye_index).unwrap();
    assert!(m.completed);
    assert_eq!(m.winner.as_ref().unwrap().id, expected_winner.id);
    match outcome {
        MatchOutcome::Advanced { winner, next_round, .. } => {
            assert_eq!(winner.id, expected_winner.id);
            assert_eq!(next_round, 2);
        }
        other => panic!("expected Advanced, got {other:?}"),
    }
}

#[test]
fn bye_match_rejects_a_choice_naming_the_bye() {
    let mut t = bracket(3);
    let bye_index = t
        .round(1)
        .unwrap()
        .iter()
        .position(|m| m.has_bye())
        .unwrap();
    let m = t.match_at(1, bye_index).unwrap();
    let bye_id = m.player2.as_ref().unwrap().id;
    let real_id = m.player1.as_ref().unwrap().id;

    assert_eq!(
        resolve_match(&mut t, 1, bye_index, Some(bye_id)).unwrap_err(),
        BracketError::InvalidWinner
    );
    // Naming the real player is accepted.
    resolve_match(&mut t, 1, bye_index, Some(real_id)).unwrap();
}

#[test]
fn real_match_requires_a_winner_choice() {
    let mut t = bracket(4);
    assert_eq!(
        resolve_match(&mut t, 1, 0, None).unwrap_err(),
        BracketError::MissingWinnerChoice
    );
}

#[test]
fn winner_outside_the_match_is_rejected() {
    let mut t = bracket(4);
    assert_eq!(
        resolve_match(&mut t, 1, 0, Some(Uuid::new_v4())).unwrap_err(),
        BracketError::InvalidWinner
    );
}

#[test]
fn winners_propagate_by_source_index_parity() {
    let mut t = bracket(8);
    let mut winners = Vec::new();
    for i in 0..4 {
        let chosen = t.match_at(1, i).unwrap().player1.clone().unwrap();
        let outcome = resolve_match(&mut t, 1, i, Some(chosen.id)).unwrap();
        match outcome {
            MatchOutcome::Advanced {
                winner,
                next_round,
                next_match,
            } => {
                assert_eq!(next_round, 2);
                assert_eq!(next_match, i / 2);
                assert_eq!(winner.id, chosen.id);
            }
            other => panic!("expected Advanced, got {other:?}"),
        }
        winners.push(chosen);
    }

    let semi = t.round(2).unwrap();
    assert_eq!(semi[0].player1.as_ref().unwrap().id, winners[0].id);
    assert_eq!(semi[0].player2.as_ref().unwrap().id, winners[1].id);
    assert_eq!(semi[1].player1.as_ref().unwrap().id, winners[2].id);
    assert_eq!(semi[1].player2.as_ref().unwrap().id, winners[3].id);
}

#[test]
fn later_round_match_waits_for_both_feeders() {
    let mut t = bracket(8);
    assert!(!can_resolve(&t, 2, 1));

    // Only one of the two feeders (matches 2 and 3) completed.
    let chosen = t.match_at(1, 2).unwrap().player1.clone().unwrap();
    resolve_match(&mut t, 1, 2, Some(chosen.id)).unwrap();
    assert!(!can_resolve(&t, 2, 1));
    let semi_player = t.match_at(2, 1).unwrap().player1.clone().unwrap();
    assert_eq!(
        resolve_match(&mut t, 2, 1, Some(semi_player.id)).unwrap_err(),
        BracketError::MatchNotReady
    );

    let chosen = t.match_at(1, 3).unwrap().player1.clone().unwrap();
    resolve_match(&mut t, 1, 3, Some(chosen.id)).unwrap();
    assert!(can_resolve(&t, 2, 1));
}

#[test]
fn completed_match_cannot_be_decided_again() {
    let mut t = bracket(4);
    let chosen = t.match_at(1, 0).unwrap().player1.clone().unwrap();
    resolve_match(&mut t, 1, 0, Some(chosen.id)).unwrap();
    assert_eq!(
        resolve_match(&mut t, 1, 0, Some(chosen.id)).unwrap_err(),
        BracketError::MatchAlreadyCompleted
    );
    assert!(!can_resolve(&t, 1, 0));
}

#[test]
fn missing_matches_and_inactive_tournaments_are_rejected() {
    let mut t = bracket(4);
    assert_eq!(
        resolve_match(&mut t, 0, 0, None).unwrap_err(),
        BracketError::MatchNotFound {
            round: 0,
            match_index: 0
        }
    );
    assert_eq!(
        resolve_match(&mut t, 3, 0, None).unwrap_err(),
        BracketError::MatchNotFound {
            round: 3,
            match_index: 0
        }
    );
    assert_eq!(
        resolve_match(&mut t, 1, 5, None).unwrap_err(),
        BracketError::MatchNotFound {
            round: 1,
            match_index: 5
        }
    );

    let mut inactive = BracketTournament::inactive();
    assert_eq!(
        resolve_match(&mut inactive, 1, 0, None).unwrap_err(),
        BracketError::NoActiveTournament
    );
}

#[test]
fn double_bye_match_forwards_a_bye_that_then_loses() {
    // 5 entrants in an 8-slot bracket: seeds 6-8 are byes, so round 1 is
    // (real, real), (real, real), (real, bye), (bye, bye).
    let mut t = bracket(5);
    let last = t.match_at(1, 3).unwrap();
    assert!(last.player1.as_ref().unwrap().is_bye);
    assert!(last.player2.as_ref().unwrap().is_bye);

    resolve_match(&mut t, 1, 3, None).unwrap();
    let forwarded = t.match_at(1, 3).unwrap().winner.clone().unwrap();
    assert!(forwarded.is_bye);

    let real = t.match_at(1, 2).unwrap().player1.clone().unwrap();
    resolve_match(&mut t, 1, 2, None).unwrap();

    // The semifinal now holds a real player against the forwarded bye and
    // resolves on its own.
    let semi = t.match_at(2, 1).unwrap();
    assert_eq!(semi.player1.as_ref().unwrap().id, real.id);
    assert_eq!(semi.player2.as_ref().unwrap().id, forwarded.id);
    resolve_match(&mut t, 2, 1, None).unwrap();
    let winner = t.match_at(2, 1).unwrap().winner.clone().unwrap();
    assert_eq!(winner.id, real.id);
    assert!(!winner.is_bye);
}

#[test]
fn winner_is_set_only_when_the_final_completes() {
    let mut t = bracket(8);
    decide_round(&mut t, 1);
    assert!(t.winner.is_none());
    decide_round(&mut t, 2);
    assert!(t.winner.is_none());
    assert!(!t.is_complete());

    let finalist = t.match_at(3, 0).unwrap().player1.clone().unwrap();
    let outcome = resolve_match(&mut t, 3, 0, Some(finalist.id)).unwrap();
    assert_eq!(
        outcome,
        MatchOutcome::Champion {
            winner: t.winner.clone().unwrap()
        }
    );
    assert_eq!(t.winner.as_ref().unwrap().id, finalist.id);
    assert!(t.is_complete());
}

#[tokio::test]
async fn eight_player_run_reports_the_champion_exactly_once() {
    let mut t = bracket(8);
    assert_eq!(
        round_names(t.total_rounds()),
        vec!["Quarterfinals", "Semifinals", "Final"]
    );

    let reporter = RecordingReporter::default();
    for round in 1..=3 {
        let count = t.round(round).unwrap().len();
        for i in 0..count {
            let chosen = t.match_at(round, i).unwrap().player1.clone().unwrap();
            resolve_and_report(&mut t, round, i, Some(chosen.id), &reporter)
                .await
                .unwrap();
        }
    }

    let champion = t.winner.clone().unwrap();
    assert_eq!(reporter.mark_count(), 1);
    assert!(reporter
        .is_tournament_winner(champion.id)
        .await
        .unwrap());
}

#[tokio::test]
async fn already_flagged_champion_is_not_marked_again() {
    let mut t = bracket(2);
    let champion = t.match_at(1, 0).unwrap().player1.clone().unwrap();
    let reporter = RecordingReporter::preflagged(champion.id);

    let outcome = resolve_and_report(&mut t, 1, 0, Some(champion.id), &reporter)
        .await
        .unwrap();
    assert!(matches!(outcome, MatchOutcome::Champion { .. }));
    assert_eq!(reporter.mark_count(), 0);
}

#[tokio::test]
async fn report_failure_surfaces_but_bracket_stays_complete() {
    let mut t = bracket(2);
    let champion = t.match_at(1, 0).unwrap().player1.clone().unwrap();
    let reporter = RecordingReporter::failing();

    let err = resolve_and_report(&mut t, 1, 0, Some(champion.id), &reporter)
        .await
        .unwrap_err();
    assert!(matches!(err, BracketError::WinnerReportFailed(_)));

    // The local transition was applied before the report was attempted.
    assert!(t.match_at(1, 0).unwrap().completed);
    assert_eq!(t.winner.as_ref().unwrap().id, champion.id);
    assert!(t.is_complete());
}

#[test]
fn reset_then_generate_produces_a_fresh_bracket() {
    let mut t = bracket(6);
    decide_round(&mut t, 1);

    t = BracketTournament::inactive();
    assert!(!t.active);
    assert!(t.participants.is_empty());
    assert!(t.rounds.is_empty());
    assert!(t.winner.is_none());
    assert_eq!(t.tier_filter, TierFilter::All);

    t = generate_bracket_with_rng(entrants(6), TierFilter::All, &mut StdRng::seed_from_u64(99))
        .unwrap();
    assert!(t.active);
    assert_eq!(t.participants.len(), 8);
    assert_eq!(t.total_rounds(), 3);
    assert!(t
        .rounds
        .iter()
        .flatten()
        .all(|m| !m.completed && m.winner.is_none()));
}

#[test]
fn entrants_with_duplicate_names_are_told_apart_by_id() {
    let first = Participant::from_player(&Player::new("Alice", None, 10));
    let second = Participant::from_player(&Player::new("Alice", None, 12));
    let second_id = second.id;
    let mut t = generate_bracket_with_rng(
        vec![first, second],
        TierFilter::All,
        &mut StdRng::seed_from_u64(3),
    )
    .unwrap();

    resolve_match(&mut t, 1, 0, Some(second_id)).unwrap();
    let winner = t.winner.clone().unwrap();
    assert_eq!(winner.id, second_id);
    assert_eq!(winner.points, 12);
}

#[test]
fn round_name_table_is_exact_for_small_brackets() {
    assert_eq!(round_names(1), vec!["Final"]);
    assert_eq!(round_names(2), vec!["Semifinals", "Final"]);
    assert_eq!(round_names(3), vec!["Quarterfinals", "Semifinals", "Final"]);
    assert_eq!(
        round_names(4),
        vec!["First Round", "Quarterfinals", "Semifinals", "Final"]
    );
    assert_eq!(
        round_names(5),
        vec![
            "First Round",
            "Second Round",
            "Quarterfinals",
            "Semifinals",
            "Final"
        ]
    );
    assert_eq!(
        round_names(6),
        vec![
            "First Round",
            "Second Round",
            "Third Round",
            "Quarterfinals",
            "Semifinals",
            "Final"
        ]
    );
}

#[test]
fn round_names_fall_back_to_generic_labels_for_big_brackets() {
    assert_eq!(
        round_names(7),
        vec![
            "Round 1",
            "Round 2",
            "Round 3",
            "Round 4",
            "Quarterfinals",
            "Semifinals",
            "Final"
        ]
    );
    assert_eq!(round_name(7, 7).as_deref(), Some("Final"));
    assert_eq!(round_name(4, 1).as_deref(), Some("First Round"));
    assert_eq!(round_name(3, 0), None);
    assert_eq!(round_name(3, 4), None);
}

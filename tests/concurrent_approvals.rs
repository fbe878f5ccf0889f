//! Concurrency tests for the ledger
//!
//! Approvals, deletions and manual recomputations race from many threads.
//! Writers are serialised by the store, so the final timeline must match a
//! fresh single-threaded rebuild.

mod fixtures;

use skill_ledger::types::RatingKind;
use skill_ledger::ApprovalState;
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use fixtures::{create_test_ledger, match_input, register};

const MATCHES: usize = 24;

#[test]
fn test_concurrent_approvals_and_recomputes() {
    let ledger = Arc::new(create_test_ledger());
    let users = register(&ledger, &["ALI", "BOB", "CAT", "DAN"]);

    // Every match starts approved by its winners
    let games: Vec<_> = (0..MATCHES)
        .map(|i| {
            let winner = &users[i % users.len()];
            let loser = &users[(i + 1) % users.len()];
            let game = ledger
                .create_match(match_input(&[winner], &[loser], 30.0), Some(winner.id))
                .unwrap();
            (game.id, loser.id)
        })
        .collect();

    thread::scope(|scope| {
        for (match_id, loser) in &games {
            let ledger = ledger.clone();
            scope.spawn(move || {
                let outcome = ledger.approve_match(match_id, loser).unwrap();
                assert_eq!(outcome.game.approval, ApprovalState::FullyApproved);
                assert!(outcome.replay.is_some());
            });
        }
        for _ in 0..4 {
            let ledger = ledger.clone();
            scope.spawn(move || {
                ledger.recompute_all().unwrap();
            });
        }
    });

    // Seeds plus one observation per participant and kind for each match
    let observations = ledger.store().all_observations().unwrap();
    assert_eq!(observations.len(), users.len() * 3 + MATCHES * 2 * 3);

    let replayed: HashSet<_> = observations
        .iter()
        .filter_map(|observation| observation.source_match)
        .collect();
    assert_eq!(replayed.len(), MATCHES);

    let elo_total: f64 = users
        .iter()
        .map(|user| ledger.current_elo(&user.id).unwrap())
        .sum();
    assert!((elo_total - 1500.0 * users.len() as f64).abs() < 1e-6);

    // A quiet rebuild reproduces exactly what the racing writers left behind
    ledger.recompute_all().unwrap();
    assert_eq!(ledger.store().all_observations().unwrap(), observations);
}

#[test]
fn test_concurrent_deletes_and_approvals() {
    let ledger = Arc::new(create_test_ledger());
    let users = register(&ledger, &["ALI", "BOB"]);
    let (alice, bob) = (&users[0], &users[1]);

    let games: Vec<_> = (0..MATCHES)
        .map(|_| {
            ledger
                .create_match(match_input(&[alice], &[bob], 20.0), Some(alice.id))
                .unwrap()
                .id
        })
        .collect();
    let (deleted, approved) = games.split_at(MATCHES / 2);

    thread::scope(|scope| {
        for match_id in deleted {
            let ledger = ledger.clone();
            scope.spawn(move || {
                ledger.delete_match(match_id).unwrap();
            });
        }
        for match_id in approved {
            let ledger = ledger.clone();
            let approver = bob.id;
            scope.spawn(move || {
                ledger.approve_match(match_id, &approver).unwrap();
            });
        }
    });

    let remaining = ledger.store().list_matches().unwrap();
    assert_eq!(remaining.len(), approved.len());
    assert!(remaining.iter().all(|game| game.is_eligible()));

    let history = ledger.rating_history(&alice.id, RatingKind::Elo).unwrap();
    assert_eq!(history.len(), 1 + approved.len());
    assert!(history.windows(2).all(|pair| pair[0].value < pair[1].value));
}

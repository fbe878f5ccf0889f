//! Performance benchmarks for rating replay

use chrono::{DateTime, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use skill_ledger::config::RatingConfig;
use skill_ledger::ledger::engine::SeedAnchor;
use skill_ledger::rating::{team_elo_delta, TeamRatingCalculator, TrueSkillCalculator};
use skill_ledger::types::{Match, NewMatch, TrueSkillValue};
use skill_ledger::{ApprovalState, InMemoryLedgerStore, Ledger, RecomputationEngine};
use std::sync::Arc;
use uuid::Uuid;

const PLAYERS: usize = 16;

fn at(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().unwrap_or_default()
}

/// Round-robin 2v2 history between a fixed pool of players
fn synthetic_history(matches: usize) -> (Vec<SeedAnchor>, Vec<Match>) {
    let players: Vec<Uuid> = (0..PLAYERS).map(|_| Uuid::new_v4()).collect();
    let anchors = players
        .iter()
        .map(|&user_id| SeedAnchor {
            user_id,
            timestamp: at(0),
        })
        .collect();

    let games = (0..matches)
        .map(|i| Match {
            id: Uuid::new_v4(),
            sequence: i as u64,
            winners: vec![players[i % PLAYERS], players[(i + 1) % PLAYERS]],
            losers: vec![players[(i + 5) % PLAYERS], players[(i + 7) % PLAYERS]],
            winner_score: 10,
            loser_score: (i % 10) as u32,
            importance: 30.0,
            timestamp: at(60 * (i as i64 + 1)),
            approval: ApprovalState::FullyApproved,
        })
        .collect();

    (anchors, games)
}

fn bench_team_updates(c: &mut Criterion) {
    let calculator = TrueSkillCalculator::new(&RatingConfig::default()).unwrap();
    let winners = vec![
        TrueSkillValue {
            mean: 27.0,
            deviation: 4.0,
        },
        TrueSkillValue {
            mean: 22.5,
            deviation: 6.1,
        },
    ];
    let losers = vec![TrueSkillValue::default(), TrueSkillValue::default()];

    c.bench_function("trueskill_two_teams", |b| {
        b.iter(|| {
            calculator
                .update_teams(black_box(&winners), black_box(&losers))
                .unwrap()
        })
    });

    let winner_elos = vec![1540.0, 1490.0];
    let loser_elos = vec![1500.0, 1475.0];
    c.bench_function("team_elo_delta", |b| {
        b.iter(|| team_elo_delta(black_box(&winner_elos), black_box(&loser_elos), 30.0).unwrap())
    });
}

fn bench_replay(c: &mut Criterion) {
    let engine = RecomputationEngine::new(&RatingConfig::default()).unwrap();

    let mut group = c.benchmark_group("replay");
    for size in [100usize, 1_000, 5_000] {
        let (anchors, games) = synthetic_history(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| engine.replay(black_box(&anchors), black_box(&games)).unwrap())
        });
    }
    group.finish();
}

fn bench_ledger_recompute(c: &mut Criterion) {
    let store = Arc::new(InMemoryLedgerStore::new());
    let ledger = Ledger::new(store, &RatingConfig::default()).unwrap();
    let users: Vec<_> = (0..PLAYERS)
        .map(|i| {
            ledger
                .create_user(&format!("P{}", i), &format!("player {}", i))
                .unwrap()
        })
        .collect();

    for i in 0..500 {
        let winner = &users[i % PLAYERS];
        let loser = &users[(i + 3) % PLAYERS];
        let game = ledger
            .create_match(
                NewMatch {
                    winners: vec![winner.id],
                    losers: vec![loser.id],
                    winner_score: 10,
                    loser_score: 4,
                    importance: 30.0,
                    timestamp: None,
                },
                Some(winner.id),
            )
            .unwrap();
        ledger.approve_match(&game.id, &loser.id).unwrap();
    }

    c.bench_function("ledger_recompute_all_500", |b| {
        b.iter(|| ledger.recompute_all().unwrap())
    });
}

criterion_group!(
    benches,
    bench_team_updates,
    bench_replay,
    bench_ledger_recompute
);
criterion_main!(benches);

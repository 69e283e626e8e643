//! Arena Ledger - Settlement Benchmarks
//!
//! Criterion-based benchmarks for the hot paths of the settlement engine.
//!
//! Run: cargo bench --bench settlement_benchmarks
//!
//! These benchmarks measure:
//! - Tiered wallet debits (pure and through the store)
//! - Bet placement with limit checks
//! - Pari-mutuel pool computation
//! - Full guild-war resolution fan-out
//! - Snapshot serialization

use std::sync::Arc;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use rust_decimal::Decimal;

use arena_ledger::{
    settle_pool, BalanceTier, Bet, EngineConfig, ManualClock, NewGuildWar, NewUser, Role, SettlementEngine,
    UserId, Wallet,
};

fn engine() -> (SettlementEngine, UserId) {
    let engine = SettlementEngine::with_clock(EngineConfig::default(), Arc::new(ManualClock::new(Utc::now())));
    let admin = engine
        .register_user(NewUser {
            username: "admin".to_string(),
            email: "admin@bench".to_string(),
            role: Role::SuperAdmin,
            upi_id: None,
        })
        .unwrap()
        .id;
    (engine, admin)
}

fn player(engine: &SettlementEngine, name: &str, deposited: i64) -> UserId {
    let id = engine
        .register_user(NewUser {
            username: name.to_string(),
            email: format!("{name}@bench"),
            ..Default::default()
        })
        .unwrap()
        .id;
    if deposited > 0 {
        engine.credit(id, BalanceTier::Deposited, Decimal::from(deposited)).unwrap();
    }
    id
}

/// Two VIP-led guilds and an open war between them.
fn war_setup(engine: &SettlementEngine, admin: UserId, members: usize) -> (u64, u64, u64) {
    let mut guilds = Vec::new();
    for side in ["a", "b"] {
        let leader = player(engine, &format!("leader_{side}"), 200);
        engine.buy_vip(leader, "month").unwrap();
        let guild = engine.create_guild(leader, &format!("Guild {side}")).unwrap();
        for i in 1..members {
            let m = player(engine, &format!("member_{side}_{i}"), 0);
            engine.join_guild(m, guild.id).unwrap();
        }
        guilds.push(guild.id);
    }
    let war = engine
        .create_guild_war(
            admin,
            NewGuildWar {
                guild_a: guilds[0],
                guild_b: guilds[1],
                start_time: Utc::now(),
                prize_pool: Decimal::from(10_000),
                commission_percent: Decimal::from(10),
            },
        )
        .unwrap();
    (war.id, guilds[0], guilds[1])
}

// ============================================================================
// WALLET BENCHMARKS
// ============================================================================

fn bench_wallet(c: &mut Criterion) {
    let mut group = c.benchmark_group("Wallet");

    group.bench_function("tiered_debit_pure", |b| {
        b.iter_batched(
            || Wallet::new(Decimal::from(30), Decimal::from(50), Decimal::from(20)),
            |mut wallet| black_box(wallet.debit(Decimal::from(60))),
            BatchSize::SmallInput,
        );
    });

    let (engine, _) = engine();
    let alice = player(&engine, "alice", 1_000_000_000);
    group.bench_function("store_debit", |b| {
        b.iter(|| black_box(engine.debit(alice, Decimal::ONE)));
    });

    group.bench_function("session_view", |b| {
        b.iter(|| black_box(engine.session_view(alice)));
    });

    group.finish();
}

// ============================================================================
// BETTING BENCHMARKS
// ============================================================================

fn bench_place_bet(c: &mut Criterion) {
    let mut group = c.benchmark_group("Betting");

    group.bench_function("place_bet", |b| {
        b.iter_batched(
            || {
                let (engine, admin) = engine();
                let (war_id, guild_a, _) = war_setup(&engine, admin, 1);
                let bettor = player(&engine, "bettor", 1_000);
                (engine, war_id, guild_a, bettor)
            },
            |(engine, war_id, guild_a, bettor)| {
                black_box(engine.place_bet(bettor, war_id, guild_a, Decimal::from(100)))
            },
            BatchSize::SmallInput,
        );
    });

    for size in [100usize, 1_000, 10_000] {
        let bets: Vec<Bet> = (0..size as u64)
            .map(|i| Bet {
                id: i,
                user_id: i,
                war_id: 1,
                guild_id: if i % 3 == 0 { 2 } else { 1 },
                amount: Decimal::from(10 + (i % 490)),
                placed_at: Utc::now(),
            })
            .collect();
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("settle_pool", size), &bets, |b, bets| {
            b.iter(|| black_box(settle_pool(bets, 1, 2, Decimal::from(10))));
        });
    }

    group.finish();
}

// ============================================================================
// RESOLUTION BENCHMARKS
// ============================================================================

fn bench_resolve_guild_war(c: &mut Criterion) {
    let mut group = c.benchmark_group("Resolution");

    for bettors in [10usize, 100, 500] {
        group.throughput(Throughput::Elements(bettors as u64));
        group.bench_with_input(BenchmarkId::new("resolve_guild_war", bettors), &bettors, |b, &bettors| {
            b.iter_batched(
                || {
                    let (engine, admin) = engine();
                    let (war_id, guild_a, guild_b) = war_setup(&engine, admin, 20);
                    for i in 0..bettors {
                        let p = player(&engine, &format!("bettor{i}"), 500);
                        let side = if i % 2 == 0 { guild_a } else { guild_b };
                        engine.place_bet(p, war_id, side, Decimal::from(50)).unwrap();
                    }
                    (engine, admin, war_id, guild_a)
                },
                |(engine, admin, war_id, winner)| black_box(engine.resolve_guild_war(admin, war_id, winner)),
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

// ============================================================================
// SNAPSHOT BENCHMARKS
// ============================================================================

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("Snapshot");

    let (engine, admin) = engine();
    let (war_id, guild_a, _) = war_setup(&engine, admin, 50);
    for i in 0..1_000 {
        let p = player(&engine, &format!("user{i}"), 100);
        engine.place_bet(p, war_id, guild_a, Decimal::from(10)).unwrap();
    }

    group.bench_function("serialize_1000_users", |b| {
        b.iter(|| black_box(serde_json::to_vec(&engine.snapshot()).unwrap()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_wallet,
    bench_place_bet,
    bench_resolve_guild_war,
    bench_snapshot,
);

criterion_main!(benches);

//! Criterion benchmarks for the hot paths of a transition.
//!
//! Covers: index accumulation, single-source synchronization, and the
//! read-only full sync over many sources.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use trickle_core::claim::{Claim, ClaimType};
use trickle_core::coins::{Coin, Coins};
use trickle_core::decimal::Dec;
use trickle_core::index::RewardIndexes;
use trickle_core::memory::MemorySharesSource;
use trickle_core::params::RewardPeriod;
use trickle_core::store::{IncentiveStore, MemoryStore};
use trickle_core::types::Address;
use trickle_engine::accumulator::Accumulator;
use trickle_engine::synchronizer::{synchronize_claim, synchronized_claim};

fn factor(s: &str) -> Dec {
    s.parse().unwrap_or_default()
}

fn bench_accumulate(c: &mut Criterion) {
    let period = RewardPeriod::new(
        true,
        "bnb-a",
        1,
        u64::MAX,
        Coins::new([Coin::new("hard", 2000), Coin::new("ukava", 1000), Coin::new("swp", 500)]).unwrap_or_default(),
    );
    let total = factor("123456789.123456789");

    c.bench_function("accumulate_three_denoms", |b| {
        b.iter(|| {
            let mut acc = Accumulator::new(1000, RewardIndexes::new());
            acc.accumulate(black_box(&period), black_box(&total), black_box(4600))
        })
    });
}

fn bench_synchronize(c: &mut Criterion) {
    let owner = Address([1; 20]);
    let mut claim = Claim::new(ClaimType::HardSupply, owner);
    claim.reward_indexes.set("bnb-a", RewardIndexes::new().with("hard", factor("0.02")));
    let global = RewardIndexes::new().with("hard", factor("7.22")).with("ukava", factor("3.64"));
    let shares = factor("1000000.5");

    c.bench_function("synchronize_single_source", |b| {
        b.iter(|| synchronize_claim(black_box(claim.clone()), "bnb-a", Some(black_box(&global)), &shares))
    });
}

fn bench_full_sync(c: &mut Criterion) {
    let owner = Address([1; 20]);
    let mut store = MemoryStore::new();
    let mut shares = MemorySharesSource::new();
    let _ = store.set_claim(Claim::new(ClaimType::Swap, owner));
    for i in 0..100 {
        let pool = format!("pool-{i}");
        let _ = store.set_reward_indexes(ClaimType::Swap, &pool, RewardIndexes::new().with("swp", factor("1.5")));
        shares.set_owner_shares(ClaimType::Swap, owner, &pool, factor("42"));
    }

    c.bench_function("synchronized_claim_100_sources", |b| {
        b.iter(|| synchronized_claim(black_box(&store), &shares, ClaimType::Swap, &owner))
    });
}

criterion_group!(benches, bench_accumulate, bench_synchronize, bench_full_sync);
criterion_main!(benches);

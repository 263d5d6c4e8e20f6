//! RocksStore behaviour across reopen and under the engine.

use trickle_core::claim::{Claim, ClaimType};
use trickle_core::coins::Coins;
use trickle_core::decimal::Dec;
use trickle_core::index::RewardIndexes;
use trickle_core::memory::{MemoryBank, MemorySharesSource};
use trickle_core::params::{Params, RewardPeriod};
use trickle_core::store::IncentiveStore;
use trickle_core::types::Address;
use trickle_engine::IncentiveEngine;
use trickle_node::storage::RocksStore;

fn dec(s: &str) -> Dec {
    s.parse().unwrap()
}

fn owner(seed: u8) -> Address {
    Address([seed; 20])
}

#[test]
fn claims_and_indexes_persist_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("incentive");
    let idx = RewardIndexes::new().with("hard", dec("0.02")).with("ukava", dec("0.04"));

    {
        let mut store = RocksStore::open(&path).unwrap();
        let mut claim = Claim::new(ClaimType::HardSupply, owner(1));
        claim.reward = Coins::single("hard", 77).unwrap();
        claim.reward_indexes.set("bnb", idx.clone());
        store.set_claim(claim).unwrap();
        store.set_reward_indexes(ClaimType::HardSupply, "bnb", idx.clone()).unwrap();
        store.set_accrual_time(ClaimType::HardSupply, "bnb", 1_600_000_000).unwrap();
        store.flush().unwrap();
    }

    let store = RocksStore::open(&path).unwrap();
    let claim = store.claim(ClaimType::HardSupply, &owner(1)).unwrap().unwrap();
    assert_eq!(claim.reward.amount_of("hard"), 77);
    assert_eq!(claim.reward_indexes.get("bnb"), Some(&idx));
    assert_eq!(store.reward_indexes(ClaimType::HardSupply, "bnb").unwrap(), Some(idx));
    assert_eq!(store.accrual_time(ClaimType::HardSupply, "bnb").unwrap(), Some(1_600_000_000));
    assert_eq!(store.claim(ClaimType::HardBorrow, &owner(1)).unwrap(), None);
}

#[test]
fn iter_claims_is_per_claim_type() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = RocksStore::open(dir.path().join("incentive")).unwrap();
    for seed in 1..=3 {
        store.set_claim(Claim::new(ClaimType::Delegator, owner(seed))).unwrap();
    }
    store.set_claim(Claim::new(ClaimType::Savings, owner(9))).unwrap();

    let delegator = store.iter_claims(ClaimType::Delegator).unwrap();
    assert_eq!(delegator.len(), 3);
    assert!(delegator.iter().all(|c| c.claim_type == ClaimType::Delegator));
    assert_eq!(store.iter_claims(ClaimType::Savings).unwrap().len(), 1);
    assert!(store.iter_claims(ClaimType::Earn).unwrap().is_empty());
}

#[test]
fn failed_batch_leaves_disk_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = RocksStore::open(dir.path().join("incentive")).unwrap();

    let mut params = Params { claim_end: 10_000, ..Params::default() };
    params.reward_periods.insert(
        ClaimType::Swap,
        vec![
            RewardPeriod::new(true, "a", 1, 10_000, Coins::single("swp", 10).unwrap()),
            RewardPeriod::new(true, "b", 1, 10_000, Coins::single("swp", 10).unwrap()),
        ],
    );
    let mut shares = MemorySharesSource::new();
    shares.set_total(ClaimType::Swap, "a", dec("5"));
    shares.set_total(ClaimType::Swap, "b", dec("5"));

    let mut engine = IncentiveEngine::new(store, shares, MemoryBank::default(), params).unwrap();
    engine.accumulate_all(100).unwrap();
    engine.accumulate_all(200).unwrap();

    // Pool b alone is already ahead; the next batch must not move pool a either.
    let period_b = engine.params().period(ClaimType::Swap, "b").unwrap().clone();
    engine.accumulate_reward(ClaimType::Swap, &period_b, 400).unwrap();
    assert!(engine.accumulate_all(300).is_err());

    let store = engine.store();
    assert_eq!(store.accrual_time(ClaimType::Swap, "a").unwrap(), Some(200));
    assert_eq!(store.accrual_time(ClaimType::Swap, "b").unwrap(), Some(400));
    assert_eq!(
        store.reward_indexes(ClaimType::Swap, "a").unwrap(),
        Some(RewardIndexes::new().with("swp", dec("200")))
    );
}

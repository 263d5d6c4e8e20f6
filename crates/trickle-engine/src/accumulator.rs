//! Global reward index accumulation.
//!
//! Each configured reward period advances its source's global index once per
//! transition: `factor += emitted / total_shares` for every emitted denom.
//! The accrual time always moves to the transition time, including when
//! nothing was emitted or nobody holds shares.

use tracing::trace;
use trickle_core::calculator::calculate_per_second_rewards;
use trickle_core::claim::ClaimType;
use trickle_core::decimal::Dec;
use trickle_core::error::{CorruptionError, IncentiveError};
use trickle_core::index::RewardIndexes;
use trickle_core::params::RewardPeriod;
use trickle_core::store::IncentiveStore;
use trickle_core::types::Timestamp;

/// A source's global index together with the time it was last advanced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Accumulator {
    pub previous_accumulation_time: Timestamp,
    pub indexes: RewardIndexes,
}

impl Accumulator {
    pub fn new(previous_accumulation_time: Timestamp, indexes: RewardIndexes) -> Self {
        Self { previous_accumulation_time, indexes }
    }

    /// Advance to `current`, spreading the period's emission over
    /// `total_shares`.
    ///
    /// # Errors
    ///
    /// - [`CorruptionError::BackwardTime`] if `current` precedes the stored time
    /// - [`CorruptionError::NegativeShares`] if `total_shares < 0`
    pub fn accumulate(
        &mut self,
        period: &RewardPeriod,
        total_shares: &Dec,
        current: Timestamp,
    ) -> Result<(), IncentiveError> {
        if total_shares.is_negative() {
            return Err(CorruptionError::NegativeShares {
                source_id: period.source_id.clone(),
                shares: total_shares.to_string(),
            }
            .into());
        }

        let (increment, next) = calculate_per_second_rewards(
            &period.source_id,
            period.start,
            period.end,
            &period.rewards_per_second,
            self.previous_accumulation_time,
            current,
        )?;
        self.previous_accumulation_time = next;

        // no holders: emission for this window goes nowhere
        if total_shares.is_zero() {
            return Ok(());
        }

        for coin in increment.iter() {
            let per_share = Dec::from(coin.amount).quo_dec(total_shares)?;
            let factor = self.indexes.get(&coin.denom).cloned().unwrap_or_default();
            self.indexes.set(&coin.denom, &factor + &per_share);
        }
        Ok(())
    }
}

/// Advance the global index of `period.source_id` to `now`.
///
/// The first call for a source only records `now` as its baseline. Empty
/// indexes are never written.
pub fn accumulate_rewards<S: IncentiveStore + ?Sized>(
    store: &mut S,
    claim_type: ClaimType,
    period: &RewardPeriod,
    total_shares: &Dec,
    now: Timestamp,
) -> Result<(), IncentiveError> {
    let source_id = period.source_id.as_str();
    let previous = store.accrual_time(claim_type, source_id)?.unwrap_or(now);
    let indexes = store.reward_indexes(claim_type, source_id)?.unwrap_or_default();

    let mut acc = Accumulator::new(previous, indexes);
    acc.accumulate(period, total_shares, now)?;

    store.set_accrual_time(claim_type, source_id, acc.previous_accumulation_time)?;
    if !acc.indexes.is_empty() {
        store.set_reward_indexes(claim_type, source_id, acc.indexes)?;
    }
    trace!(%claim_type, source_id, previous, now, %total_shares, "accumulated");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use trickle_core::coins::{Coin, Coins};
    use trickle_core::store::MemoryStore;

    fn d(s: &str) -> Dec {
        s.parse().unwrap()
    }

    fn period(start: u64, end: u64) -> RewardPeriod {
        RewardPeriod::new(
            true,
            "bnb-a",
            start,
            end,
            Coins::new([Coin::new("hard", 2000), Coin::new("ukava", 1000)]).unwrap(),
        )
    }

    fn indexes(hard: &str, ukava: &str) -> RewardIndexes {
        RewardIndexes::new().with("hard", d(hard)).with("ukava", d(ukava))
    }

    #[test]
    fn one_hour_of_emission() {
        let mut acc = Accumulator::new(1000, indexes("0.02", "0.04"));
        acc.accumulate(&period(1, 100_000), &d("1000000"), 1000 + 3600).unwrap();
        assert_eq!(acc.indexes, indexes("7.22", "3.64"));
        assert_eq!(acc.previous_accumulation_time, 4600);
    }

    #[test]
    fn zero_shares_only_moves_time() {
        let mut acc = Accumulator::new(1000, indexes("0.02", "0.04"));
        acc.accumulate(&period(1, 100_000), &Dec::zero(), 2000).unwrap();
        assert_eq!(acc.indexes, indexes("0.02", "0.04"));
        assert_eq!(acc.previous_accumulation_time, 2000);
    }

    #[test]
    fn negative_shares_rejected() {
        let mut acc = Accumulator::new(1000, RewardIndexes::new());
        let err = acc.accumulate(&period(1, 100_000), &d("-1"), 2000).unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn new_denom_starts_from_zero() {
        let mut acc = Accumulator::new(10, RewardIndexes::new().with("hard", d("1")));
        acc.accumulate(&period(1, 100_000), &d("1000"), 11).unwrap();
        assert_eq!(acc.indexes, indexes("3", "1"));
    }

    #[test]
    fn first_call_sets_baseline_only() {
        let mut store = MemoryStore::new();
        accumulate_rewards(&mut store, ClaimType::HardSupply, &period(1, 100_000), &d("10"), 500).unwrap();
        assert_eq!(store.accrual_time(ClaimType::HardSupply, "bnb-a").unwrap(), Some(500));
        assert_eq!(store.reward_indexes(ClaimType::HardSupply, "bnb-a").unwrap(), None);
    }

    #[test]
    fn second_call_writes_indexes() {
        let mut store = MemoryStore::new();
        let p = period(1, 100_000);
        accumulate_rewards(&mut store, ClaimType::HardSupply, &p, &d("1000"), 500).unwrap();
        accumulate_rewards(&mut store, ClaimType::HardSupply, &p, &d("1000"), 510).unwrap();
        assert_eq!(
            store.reward_indexes(ClaimType::HardSupply, "bnb-a").unwrap(),
            Some(indexes("20", "10"))
        );
    }

    #[test]
    fn pre_start_leaves_indexes_but_moves_time() {
        let mut store = MemoryStore::new();
        let p = period(10_000, 20_000);
        accumulate_rewards(&mut store, ClaimType::Swap, &p, &d("1000"), 500).unwrap();
        accumulate_rewards(&mut store, ClaimType::Swap, &p, &d("1000"), 900).unwrap();
        assert_eq!(store.accrual_time(ClaimType::Swap, "bnb-a").unwrap(), Some(900));
        assert_eq!(store.reward_indexes(ClaimType::Swap, "bnb-a").unwrap(), None);
    }

    #[test]
    fn backward_time_writes_nothing() {
        let mut store = MemoryStore::new();
        let p = period(1, 100_000);
        accumulate_rewards(&mut store, ClaimType::Swap, &p, &d("1000"), 500).unwrap();
        accumulate_rewards(&mut store, ClaimType::Swap, &p, &d("1000"), 600).unwrap();
        let before = store.clone();
        let err = accumulate_rewards(&mut store, ClaimType::Swap, &p, &d("1000"), 599).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(store.accrual_time(ClaimType::Swap, "bnb-a").unwrap(), Some(600));
        assert_eq!(
            store.reward_indexes(ClaimType::Swap, "bnb-a").unwrap(),
            before.reward_indexes(ClaimType::Swap, "bnb-a").unwrap()
        );
    }
}

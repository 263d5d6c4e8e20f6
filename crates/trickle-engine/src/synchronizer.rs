//! Lazy per-owner settlement.
//!
//! A claim stores, per source id, the global index it was last synchronized
//! at. Synchronizing credits `(global - stored) * shares` per denom and moves
//! the checkpoint up to the global value. Initializing a new position only
//! moves the checkpoint, so a position never earns for time before it
//! existed.

use tracing::debug;
use trickle_core::claim::{Claim, ClaimType};
use trickle_core::coins::Coins;
use trickle_core::decimal::Dec;
use trickle_core::error::{CorruptionError, IncentiveError};
use trickle_core::index::RewardIndexes;
use trickle_core::store::IncentiveStore;
use trickle_core::traits::SharesSource;
use trickle_core::types::Address;

/// Reward earned by `shares` while one denom's factor moved from `old` to
/// `new`, rounded half-to-even to whole units.
///
/// # Errors
///
/// - [`CorruptionError::DecreasingRewardFactor`] if `new < old`
/// - [`CorruptionError::NegativeShares`] if `shares < 0`
pub fn calculate_single_reward(
    source_id: &str,
    denom: &str,
    old: &Dec,
    new: &Dec,
    shares: &Dec,
) -> Result<u128, CorruptionError> {
    let increase = new - old;
    if increase.is_negative() {
        return Err(CorruptionError::DecreasingRewardFactor {
            source_id: source_id.to_string(),
            denom: denom.to_string(),
            claim_factor: old.to_string(),
            global_factor: new.to_string(),
        });
    }
    if shares.is_negative() {
        return Err(CorruptionError::NegativeShares {
            source_id: source_id.to_string(),
            shares: shares.to_string(),
        });
    }
    increase
        .mul_dec(shares)
        .round_to_u128()
        .map_err(|e| CorruptionError::ArithmeticOverflow(e.to_string()))
}

/// Reward earned between two index snapshots of one source.
///
/// Denoms missing from `old` start at zero. A denom present in `old` but
/// missing from `new` means the global index lost an entry.
pub fn calculate_rewards(
    source_id: &str,
    old: &RewardIndexes,
    new: &RewardIndexes,
    shares: &Dec,
) -> Result<Coins, CorruptionError> {
    for index in old.iter() {
        if new.get(&index.denom).is_none() {
            return Err(CorruptionError::MissingRewardFactor {
                source_id: source_id.to_string(),
                denom: index.denom.clone(),
            });
        }
    }

    let zero = Dec::zero();
    let mut reward = Coins::empty();
    for index in new.iter() {
        let old_factor = old.get(&index.denom).unwrap_or(&zero);
        let amount = calculate_single_reward(source_id, &index.denom, old_factor, &index.factor, shares)?;
        reward
            .add_amount(&index.denom, amount)
            .map_err(|e| CorruptionError::ArithmeticOverflow(e.to_string()))?;
    }
    Ok(reward)
}

/// Bring `claim`'s checkpoint for `source_id` up to `global`, crediting what
/// `shares` earned in between.
///
/// `global == None` (source never rewarded) returns the claim unchanged.
/// The checkpoint moves even when `shares` is zero.
pub fn synchronize_claim(
    mut claim: Claim,
    source_id: &str,
    global: Option<&RewardIndexes>,
    shares: &Dec,
) -> Result<Claim, CorruptionError> {
    let Some(global) = global else {
        return Ok(claim);
    };
    let empty = RewardIndexes::new();
    let stored = claim.reward_indexes.get(source_id).unwrap_or(&empty);

    let earned = calculate_rewards(source_id, stored, global, shares)?;
    claim.reward = claim
        .reward
        .checked_add(&earned)
        .map_err(|e| CorruptionError::ArithmeticOverflow(e.to_string()))?;
    claim.reward_indexes.set(source_id, global.clone());
    Ok(claim)
}

/// Synchronize `owner`'s stored claim on one source.
///
/// Owners without a claim have nothing to catch up on; this is a no-op for
/// them.
pub fn synchronize_reward<S: IncentiveStore + ?Sized>(
    store: &mut S,
    claim_type: ClaimType,
    source_id: &str,
    owner: &Address,
    shares: &Dec,
) -> Result<(), IncentiveError> {
    let Some(claim) = store.claim(claim_type, owner)? else {
        debug!(%claim_type, source_id, %owner, "no claim to synchronize");
        return Ok(());
    };
    let global = store.reward_indexes(claim_type, source_id)?;
    let before = claim.reward.clone();
    let claim = synchronize_claim(claim, source_id, global.as_ref(), shares)?;
    debug!(%claim_type, source_id, %owner, %shares, previous = %before, reward = %claim.reward, "synchronized");
    store.set_claim(claim)
}

/// Start tracking `source_id` on `owner`'s claim at the current global
/// index, creating the claim if needed. Other sources are untouched and no
/// reward is credited.
pub fn initialize_reward<S: IncentiveStore + ?Sized>(
    store: &mut S,
    claim_type: ClaimType,
    source_id: &str,
    owner: &Address,
) -> Result<(), IncentiveError> {
    let mut claim = store
        .claim(claim_type, owner)?
        .unwrap_or_else(|| Claim::new(claim_type, *owner));
    let global = store.reward_indexes(claim_type, source_id)?.unwrap_or_default();
    claim.reward_indexes.set(source_id, global);
    debug!(%claim_type, source_id, %owner, "initialized");
    store.set_claim(claim)
}

/// `owner`'s claim as it would be after synchronizing, with the owner's
/// current shares, every rewarded source the owner either holds shares in or
/// already has a checkpoint for. Other sources are left out so the claim does
/// not pick up checkpoints for pools the owner never joined. Nothing is
/// written.
pub fn synchronized_claim<S, Src>(
    store: &S,
    shares: &Src,
    claim_type: ClaimType,
    owner: &Address,
) -> Result<Option<Claim>, IncentiveError>
where
    S: IncentiveStore + ?Sized,
    Src: SharesSource + ?Sized,
{
    let Some(mut claim) = store.claim(claim_type, owner)? else {
        return Ok(None);
    };
    for (source_id, global) in store.iter_reward_indexes(claim_type)? {
        let owner_shares = shares.owner_shares(claim_type, owner, &source_id);
        if owner_shares.is_none() && claim.reward_indexes.get(&source_id).is_none() {
            continue;
        }
        claim = synchronize_claim(claim, &source_id, Some(&global), &owner_shares.unwrap_or_default())?;
    }
    Ok(Some(claim))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trickle_core::memory::MemorySharesSource;
    use trickle_core::store::MemoryStore;

    fn d(s: &str) -> Dec {
        s.parse().unwrap()
    }

    fn idx(pairs: &[(&str, &str)]) -> RewardIndexes {
        pairs.iter().fold(RewardIndexes::new(), |acc, (denom, f)| acc.with(denom, d(f)))
    }

    const OWNER: Address = Address([5; 20]);

    #[test]
    fn single_reward_rounds_half_even() {
        assert_eq!(calculate_single_reward("s", "hard", &d("0"), &d("0.5"), &d("5")).unwrap(), 2);
        assert_eq!(calculate_single_reward("s", "hard", &d("0"), &d("0.5"), &d("7")).unwrap(), 4);
        assert_eq!(calculate_single_reward("s", "hard", &d("1"), &d("1"), &d("99")).unwrap(), 0);
    }

    #[test]
    fn decreasing_factor_is_corruption() {
        let err = calculate_single_reward("s", "hard", &d("2"), &d("1"), &d("1")).unwrap_err();
        assert!(matches!(err, CorruptionError::DecreasingRewardFactor { .. }));
    }

    #[test]
    fn lost_denom_is_corruption() {
        let err = calculate_rewards("s", &idx(&[("hard", "1")]), &idx(&[("swp", "1")]), &d("1")).unwrap_err();
        assert!(matches!(err, CorruptionError::MissingRewardFactor { .. }));
    }

    #[test]
    fn new_denom_counts_from_zero() {
        let reward = calculate_rewards(
            "s",
            &idx(&[("hard", "1")]),
            &idx(&[("hard", "1.5"), ("swp", "0.25")]),
            &d("100"),
        )
        .unwrap();
        assert_eq!(reward.amount_of("hard"), 50);
        assert_eq!(reward.amount_of("swp"), 25);
    }

    #[test]
    fn sync_without_global_is_noop() {
        let claim = Claim::new(ClaimType::Swap, OWNER);
        let synced = synchronize_claim(claim.clone(), "pool", None, &d("10")).unwrap();
        assert_eq!(synced, claim);
    }

    #[test]
    fn zero_shares_moves_checkpoint_only() {
        let mut claim = Claim::new(ClaimType::Swap, OWNER);
        claim.reward_indexes.set("pool", idx(&[("swp", "1")]));
        let global = idx(&[("swp", "3")]);
        let synced = synchronize_claim(claim, "pool", Some(&global), &Dec::zero()).unwrap();
        assert!(synced.reward.is_empty());
        assert_eq!(synced.reward_indexes.get("pool"), Some(&global));
    }

    #[test]
    fn sync_credits_delta_times_shares() {
        let mut store = MemoryStore::new();
        store.set_reward_indexes(ClaimType::HardSupply, "bnb", idx(&[("hard", "1")])).unwrap();
        initialize_reward(&mut store, ClaimType::HardSupply, "bnb", &OWNER).unwrap();
        store.set_reward_indexes(ClaimType::HardSupply, "bnb", idx(&[("hard", "1.25")])).unwrap();

        synchronize_reward(&mut store, ClaimType::HardSupply, "bnb", &OWNER, &d("400")).unwrap();
        let claim = store.claim(ClaimType::HardSupply, &OWNER).unwrap().unwrap();
        assert_eq!(claim.reward.amount_of("hard"), 100);
        assert_eq!(claim.reward_indexes.get("bnb"), Some(&idx(&[("hard", "1.25")])));
    }

    #[test]
    fn sync_without_claim_writes_nothing() {
        let mut store = MemoryStore::new();
        store.set_reward_indexes(ClaimType::HardSupply, "bnb", idx(&[("hard", "1")])).unwrap();
        synchronize_reward(&mut store, ClaimType::HardSupply, "bnb", &OWNER, &d("1")).unwrap();
        assert_eq!(store.claim(ClaimType::HardSupply, &OWNER).unwrap(), None);
    }

    #[test]
    fn initialize_leaves_other_sources_and_reward() {
        let mut store = MemoryStore::new();
        let mut claim = Claim::new(ClaimType::Earn, OWNER);
        claim.reward = Coins::single("ukava", 7).unwrap();
        claim.reward_indexes.set("vault-a", idx(&[("ukava", "0.5")]));
        store.set_claim(claim).unwrap();
        store.set_reward_indexes(ClaimType::Earn, "vault-b", idx(&[("ukava", "9")])).unwrap();

        initialize_reward(&mut store, ClaimType::Earn, "vault-b", &OWNER).unwrap();
        let claim = store.claim(ClaimType::Earn, &OWNER).unwrap().unwrap();
        assert_eq!(claim.reward.amount_of("ukava"), 7);
        assert_eq!(claim.reward_indexes.get("vault-a"), Some(&idx(&[("ukava", "0.5")])));
        assert_eq!(claim.reward_indexes.get("vault-b"), Some(&idx(&[("ukava", "9")])));
    }

    #[test]
    fn initialize_unrewarded_source_stores_empty_checkpoint() {
        let mut store = MemoryStore::new();
        initialize_reward(&mut store, ClaimType::Savings, "usdx", &OWNER).unwrap();
        let claim = store.claim(ClaimType::Savings, &OWNER).unwrap().unwrap();
        assert_eq!(claim.reward_indexes.get("usdx"), Some(&RewardIndexes::new()));
    }

    #[test]
    fn synchronized_claim_covers_held_sources_without_writing() {
        let mut store = MemoryStore::new();
        let mut shares = MemorySharesSource::new();
        shares.set_owner_shares(ClaimType::Swap, OWNER, "a", d("10"));
        store.set_claim(Claim::new(ClaimType::Swap, OWNER)).unwrap();
        store.set_reward_indexes(ClaimType::Swap, "a", idx(&[("swp", "2")])).unwrap();
        store.set_reward_indexes(ClaimType::Swap, "b", idx(&[("swp", "5")])).unwrap();

        let synced = synchronized_claim(&store, &shares, ClaimType::Swap, &OWNER).unwrap().unwrap();
        assert_eq!(synced.reward.amount_of("swp"), 20);
        assert_eq!(synced.reward_indexes.source_ids(), vec!["a".to_string()]);

        let stored = store.claim(ClaimType::Swap, &OWNER).unwrap().unwrap();
        assert!(stored.reward.is_empty());
        assert!(synchronized_claim(&store, &shares, ClaimType::Swap, &Address([6; 20])).unwrap().is_none());
    }

    #[test]
    fn synchronized_claim_skips_pools_never_joined() {
        let mut store = MemoryStore::new();
        let mut shares = MemorySharesSource::new();
        // checkpointed at "a" but the position was closed since
        let mut claim = Claim::new(ClaimType::Swap, OWNER);
        claim.reward_indexes.set("a", idx(&[("swp", "1")]));
        store.set_claim(claim).unwrap();
        shares.set_owner_shares(ClaimType::Swap, OWNER, "b", d("4"));
        shares.set_owner_shares(ClaimType::Swap, Address([6; 20]), "c", d("9"));
        store.set_reward_indexes(ClaimType::Swap, "a", idx(&[("swp", "3")])).unwrap();
        store.set_reward_indexes(ClaimType::Swap, "b", idx(&[("swp", "2")])).unwrap();
        store.set_reward_indexes(ClaimType::Swap, "c", idx(&[("swp", "7")])).unwrap();

        let synced = synchronized_claim(&store, &shares, ClaimType::Swap, &OWNER).unwrap().unwrap();
        assert_eq!(synced.reward_indexes.source_ids(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(synced.reward_indexes.get("a"), Some(&idx(&[("swp", "3")])));
        // no shares left in "a"; "b" was never initialized so it counts from zero
        assert_eq!(synced.reward.amount_of("swp"), 8);
    }
}

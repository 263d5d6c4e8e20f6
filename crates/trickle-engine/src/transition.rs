//! All-or-nothing state transitions.
//!
//! Every engine operation runs against a [`CacheStore`]: reads fall through to
//! the committed store, writes are buffered in a [`ChangeSet`]. The buffer is
//! applied only when the operation returns `Ok`; any error drops it, so a
//! failed transition leaves no trace, including writes made before the
//! failing step.

use std::collections::BTreeMap;

use tracing::{debug, error};
use trickle_core::claim::{Claim, ClaimType};
use trickle_core::error::IncentiveError;
use trickle_core::index::RewardIndexes;
use trickle_core::store::{ensure_non_empty, ChangeSet, IncentiveStore};
use trickle_core::types::{Address, Timestamp};

/// Write-buffering overlay over a committed store.
pub struct CacheStore<'a, S: IncentiveStore + ?Sized> {
    base: &'a S,
    changes: ChangeSet,
}

impl<'a, S: IncentiveStore + ?Sized> CacheStore<'a, S> {
    pub fn new(base: &'a S) -> Self {
        Self { base, changes: ChangeSet::default() }
    }

    pub fn changes(&self) -> &ChangeSet {
        &self.changes
    }

    pub fn into_changes(self) -> ChangeSet {
        self.changes
    }
}

impl<S: IncentiveStore + ?Sized> IncentiveStore for CacheStore<'_, S> {
    fn accrual_time(&self, claim_type: ClaimType, source_id: &str) -> Result<Option<Timestamp>, IncentiveError> {
        match self.changes.accrual_times.get(&(claim_type, source_id.to_string())) {
            Some(time) => Ok(Some(*time)),
            None => self.base.accrual_time(claim_type, source_id),
        }
    }

    fn set_accrual_time(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        time: Timestamp,
    ) -> Result<(), IncentiveError> {
        self.changes.accrual_times.insert((claim_type, source_id.to_string()), time);
        Ok(())
    }

    fn reward_indexes(&self, claim_type: ClaimType, source_id: &str) -> Result<Option<RewardIndexes>, IncentiveError> {
        match self.changes.reward_indexes.get(&(claim_type, source_id.to_string())) {
            Some(indexes) => Ok(Some(indexes.clone())),
            None => self.base.reward_indexes(claim_type, source_id),
        }
    }

    fn set_reward_indexes(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        indexes: RewardIndexes,
    ) -> Result<(), IncentiveError> {
        ensure_non_empty(claim_type, source_id, &indexes)?;
        self.changes.reward_indexes.insert((claim_type, source_id.to_string()), indexes);
        Ok(())
    }

    fn iter_reward_indexes(&self, claim_type: ClaimType) -> Result<Vec<(String, RewardIndexes)>, IncentiveError> {
        let mut merged: BTreeMap<String, RewardIndexes> =
            self.base.iter_reward_indexes(claim_type)?.into_iter().collect();
        for ((t, source_id), indexes) in &self.changes.reward_indexes {
            if *t == claim_type {
                merged.insert(source_id.clone(), indexes.clone());
            }
        }
        Ok(merged.into_iter().collect())
    }

    fn claim(&self, claim_type: ClaimType, owner: &Address) -> Result<Option<Claim>, IncentiveError> {
        match self.changes.claims.get(&(claim_type, *owner)) {
            Some(claim) => Ok(Some(claim.clone())),
            None => self.base.claim(claim_type, owner),
        }
    }

    fn set_claim(&mut self, claim: Claim) -> Result<(), IncentiveError> {
        self.changes.claims.insert((claim.claim_type, claim.owner), claim);
        Ok(())
    }

    fn iter_claims(&self, claim_type: ClaimType) -> Result<Vec<Claim>, IncentiveError> {
        let mut merged: BTreeMap<Address, Claim> = self
            .base
            .iter_claims(claim_type)?
            .into_iter()
            .map(|c| (c.owner, c))
            .collect();
        for ((t, owner), claim) in &self.changes.claims {
            if *t == claim_type {
                merged.insert(*owner, claim.clone());
            }
        }
        Ok(merged.into_values().collect())
    }
}

/// Run `op` as one atomic transition over `store`.
///
/// On `Ok` the buffered writes are applied with [`IncentiveStore::apply`];
/// on `Err` they are dropped and the error is returned unchanged.
pub fn run_transition<S, T, F>(store: &mut S, op: F) -> Result<T, IncentiveError>
where
    S: IncentiveStore + ?Sized,
    F: FnOnce(&mut CacheStore<'_, S>) -> Result<T, IncentiveError>,
{
    let (result, changes) = {
        let mut cache = CacheStore::new(&*store);
        let result = op(&mut cache);
        (result, cache.into_changes())
    };

    match result {
        Ok(value) => {
            let writes = changes.len();
            store.apply(changes)?;
            debug!(writes, "transition committed");
            Ok(value)
        }
        Err(e) => {
            if e.is_fatal() {
                error!(error = %e, discarded = changes.len(), "transition aborted");
            } else {
                debug!(error = %e, discarded = changes.len(), "transition rejected");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trickle_core::error::{ClaimError, CorruptionError};
    use trickle_core::store::MemoryStore;

    fn idx(factor: &str) -> RewardIndexes {
        RewardIndexes::new().with("hard", factor.parse().unwrap())
    }

    #[test]
    fn reads_see_own_writes_and_fall_through() {
        let mut base = MemoryStore::new();
        base.set_accrual_time(ClaimType::Swap, "a", 1).unwrap();
        let mut cache = CacheStore::new(&base);
        assert_eq!(cache.accrual_time(ClaimType::Swap, "a").unwrap(), Some(1));
        cache.set_accrual_time(ClaimType::Swap, "a", 2).unwrap();
        assert_eq!(cache.accrual_time(ClaimType::Swap, "a").unwrap(), Some(2));
        assert_eq!(base.accrual_time(ClaimType::Swap, "a").unwrap(), Some(1));
    }

    #[test]
    fn iteration_merges_overlay() {
        let mut base = MemoryStore::new();
        base.set_reward_indexes(ClaimType::Swap, "a", idx("1")).unwrap();
        base.set_reward_indexes(ClaimType::Swap, "c", idx("1")).unwrap();
        let mut cache = CacheStore::new(&base);
        cache.set_reward_indexes(ClaimType::Swap, "a", idx("2")).unwrap();
        cache.set_reward_indexes(ClaimType::Swap, "b", idx("3")).unwrap();
        let all = cache.iter_reward_indexes(ClaimType::Swap).unwrap();
        let ids: Vec<_> = all.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(all[0].1, idx("2"));
    }

    #[test]
    fn ok_commits() {
        let mut store = MemoryStore::new();
        run_transition(&mut store, |s| s.set_accrual_time(ClaimType::Earn, "v", 9)).unwrap();
        assert_eq!(store.accrual_time(ClaimType::Earn, "v").unwrap(), Some(9));
    }

    #[test]
    fn error_discards_earlier_writes() {
        let mut store = MemoryStore::new();
        let err = run_transition(&mut store, |s| {
            s.set_accrual_time(ClaimType::Earn, "v", 9)?;
            s.set_claim(Claim::new(ClaimType::Earn, Address([1; 20])))?;
            Err::<(), _>(CorruptionError::BackwardTime { source_id: "v".into(), previous: 9, current: 8 }.into())
        })
        .unwrap_err();
        assert!(err.is_fatal());
        assert!(store.is_empty());

        let err = run_transition(&mut store, |s| {
            s.set_accrual_time(ClaimType::Earn, "v", 9)?;
            Err::<(), _>(ClaimError::ZeroClaim.into())
        })
        .unwrap_err();
        assert!(!err.is_fatal());
        assert!(store.is_empty());
    }

    #[test]
    fn sync_corruption_discards_sibling_writes() {
        let owner = Address([2; 20]);
        let mut store = MemoryStore::new();
        let mut claim = Claim::new(ClaimType::HardSupply, owner);
        claim.reward_indexes.set("bnb", idx("10"));
        store.set_claim(claim.clone()).unwrap();
        store.set_reward_indexes(ClaimType::HardSupply, "bnb", idx("5")).unwrap();

        let err = run_transition(&mut store, |s| {
            s.set_accrual_time(ClaimType::HardSupply, "bnb", 50)?;
            s.set_reward_indexes(ClaimType::HardSupply, "usdx", idx("1"))?;
            crate::synchronizer::synchronize_reward(s, ClaimType::HardSupply, "bnb", &owner, &"3".parse().unwrap())
        })
        .unwrap_err();
        assert!(matches!(err, IncentiveError::Corruption(CorruptionError::DecreasingRewardFactor { .. })));
        assert_eq!(store.accrual_time(ClaimType::HardSupply, "bnb").unwrap(), None);
        assert_eq!(store.reward_indexes(ClaimType::HardSupply, "usdx").unwrap(), None);
        assert_eq!(store.claim(ClaimType::HardSupply, &owner).unwrap(), Some(claim));
    }
}

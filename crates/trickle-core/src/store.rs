//! Incentive state storage interface and in-memory implementation.
//!
//! Three keyed maps per [`ClaimType`]:
//! - accrual time: source id → last processed timestamp
//! - reward indexes: source id → global [`RewardIndexes`]
//! - claims: owner → [`Claim`]
//!
//! Absent entries are normal and resolved by the caller's defaults. Writing
//! an empty reward index set is refused: an empty global index and a missing
//! one mean different things to the synchronizer.

use std::collections::BTreeMap;

use crate::claim::{Claim, ClaimType};
use crate::error::{CorruptionError, IncentiveError};
use crate::index::RewardIndexes;
use crate::types::{Address, Timestamp};

/// Buffered writes of one transition, applied all-or-nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub accrual_times: BTreeMap<(ClaimType, String), Timestamp>,
    pub reward_indexes: BTreeMap<(ClaimType, String), RewardIndexes>,
    pub claims: BTreeMap<(ClaimType, Address), Claim>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.accrual_times.is_empty() && self.reward_indexes.is_empty() && self.claims.is_empty()
    }

    /// Number of buffered writes.
    pub fn len(&self) -> usize {
        self.accrual_times.len() + self.reward_indexes.len() + self.claims.len()
    }
}

/// Reject an empty index set before it reaches storage.
pub fn ensure_non_empty(
    claim_type: ClaimType,
    source_id: &str,
    indexes: &RewardIndexes,
) -> Result<(), CorruptionError> {
    if indexes.is_empty() {
        return Err(CorruptionError::EmptyIndexes(format!("{claim_type}/{source_id}")));
    }
    Ok(())
}

/// Mutable incentive state.
///
/// Not thread-safe; callers wrap it in a `Mutex` if shared.
pub trait IncentiveStore: Send + Sync {
    /// Last processed time of `source_id`. `None` before its first accumulation.
    fn accrual_time(&self, claim_type: ClaimType, source_id: &str) -> Result<Option<Timestamp>, IncentiveError>;

    fn set_accrual_time(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        time: Timestamp,
    ) -> Result<(), IncentiveError>;

    /// Global indexes of `source_id`. `None` if it has never been rewarded.
    fn reward_indexes(&self, claim_type: ClaimType, source_id: &str) -> Result<Option<RewardIndexes>, IncentiveError>;

    /// # Errors
    ///
    /// - [`CorruptionError::EmptyIndexes`] if `indexes` is empty
    fn set_reward_indexes(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        indexes: RewardIndexes,
    ) -> Result<(), IncentiveError>;

    /// All global indexes of a claim type, ordered by source id.
    fn iter_reward_indexes(&self, claim_type: ClaimType) -> Result<Vec<(String, RewardIndexes)>, IncentiveError>;

    fn claim(&self, claim_type: ClaimType, owner: &Address) -> Result<Option<Claim>, IncentiveError>;

    /// Store `claim` under its own type and owner.
    fn set_claim(&mut self, claim: Claim) -> Result<(), IncentiveError>;

    /// All claims of a claim type, ordered by owner.
    fn iter_claims(&self, claim_type: ClaimType) -> Result<Vec<Claim>, IncentiveError>;

    /// Apply a change set.
    ///
    /// The default applies entries one by one and is only atomic for
    /// in-memory stores; persistent backends override it with a batch write.
    fn apply(&mut self, changes: ChangeSet) -> Result<(), IncentiveError> {
        for ((claim_type, source_id), indexes) in &changes.reward_indexes {
            ensure_non_empty(*claim_type, source_id, indexes)?;
        }
        for ((claim_type, source_id), time) in changes.accrual_times {
            self.set_accrual_time(claim_type, &source_id, time)?;
        }
        for ((claim_type, source_id), indexes) in changes.reward_indexes {
            self.set_reward_indexes(claim_type, &source_id, indexes)?;
        }
        for (_, claim) in changes.claims {
            self.set_claim(claim)?;
        }
        Ok(())
    }
}

/// In-memory incentive store for tests and simulations.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    accrual_times: BTreeMap<(ClaimType, String), Timestamp>,
    reward_indexes: BTreeMap<(ClaimType, String), RewardIndexes>,
    claims: BTreeMap<(ClaimType, Address), Claim>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored entries across all maps.
    pub fn len(&self) -> usize {
        self.accrual_times.len() + self.reward_indexes.len() + self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IncentiveStore for MemoryStore {
    fn accrual_time(&self, claim_type: ClaimType, source_id: &str) -> Result<Option<Timestamp>, IncentiveError> {
        Ok(self.accrual_times.get(&(claim_type, source_id.to_string())).copied())
    }

    fn set_accrual_time(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        time: Timestamp,
    ) -> Result<(), IncentiveError> {
        self.accrual_times.insert((claim_type, source_id.to_string()), time);
        Ok(())
    }

    fn reward_indexes(&self, claim_type: ClaimType, source_id: &str) -> Result<Option<RewardIndexes>, IncentiveError> {
        Ok(self.reward_indexes.get(&(claim_type, source_id.to_string())).cloned())
    }

    fn set_reward_indexes(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        indexes: RewardIndexes,
    ) -> Result<(), IncentiveError> {
        ensure_non_empty(claim_type, source_id, &indexes)?;
        self.reward_indexes.insert((claim_type, source_id.to_string()), indexes);
        Ok(())
    }

    fn iter_reward_indexes(&self, claim_type: ClaimType) -> Result<Vec<(String, RewardIndexes)>, IncentiveError> {
        Ok(self
            .reward_indexes
            .iter()
            .filter(|((t, _), _)| *t == claim_type)
            .map(|((_, id), idx)| (id.clone(), idx.clone()))
            .collect())
    }

    fn claim(&self, claim_type: ClaimType, owner: &Address) -> Result<Option<Claim>, IncentiveError> {
        Ok(self.claims.get(&(claim_type, *owner)).cloned())
    }

    fn set_claim(&mut self, claim: Claim) -> Result<(), IncentiveError> {
        self.claims.insert((claim.claim_type, claim.owner), claim);
        Ok(())
    }

    fn iter_claims(&self, claim_type: ClaimType) -> Result<Vec<Claim>, IncentiveError> {
        Ok(self
            .claims
            .iter()
            .filter(|((t, _), _)| *t == claim_type)
            .map(|(_, c)| c.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idx(denom: &str, factor: &str) -> RewardIndexes {
        RewardIndexes::new().with(denom, factor.parse().unwrap())
    }

    #[test]
    fn missing_entries_are_none() {
        let store = MemoryStore::new();
        assert_eq!(store.accrual_time(ClaimType::Swap, "pool").unwrap(), None);
        assert_eq!(store.reward_indexes(ClaimType::Swap, "pool").unwrap(), None);
        assert_eq!(store.claim(ClaimType::Swap, &Address([1; 20])).unwrap(), None);
    }

    #[test]
    fn keys_are_scoped_by_claim_type() {
        let mut store = MemoryStore::new();
        store.set_accrual_time(ClaimType::HardSupply, "bnb", 10).unwrap();
        store.set_reward_indexes(ClaimType::HardSupply, "bnb", idx("hard", "1")).unwrap();
        assert_eq!(store.accrual_time(ClaimType::HardBorrow, "bnb").unwrap(), None);
        assert_eq!(store.reward_indexes(ClaimType::HardBorrow, "bnb").unwrap(), None);
        assert_eq!(store.iter_reward_indexes(ClaimType::HardSupply).unwrap().len(), 1);
        assert!(store.iter_reward_indexes(ClaimType::HardBorrow).unwrap().is_empty());
    }

    #[test]
    fn empty_indexes_refused() {
        let mut store = MemoryStore::new();
        let err = store
            .set_reward_indexes(ClaimType::Earn, "vault", RewardIndexes::new())
            .unwrap_err();
        assert!(err.is_fatal());
        assert!(store.is_empty());
    }

    #[test]
    fn apply_rejects_empty_indexes_before_writing() {
        let mut store = MemoryStore::new();
        let mut changes = ChangeSet::default();
        changes.accrual_times.insert((ClaimType::Earn, "vault".into()), 5);
        changes.reward_indexes.insert((ClaimType::Earn, "vault".into()), RewardIndexes::new());
        assert!(store.apply(changes).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn apply_writes_everything() {
        let mut store = MemoryStore::new();
        let owner = Address([3; 20]);
        let mut changes = ChangeSet::default();
        changes.accrual_times.insert((ClaimType::Earn, "vault".into()), 5);
        changes.reward_indexes.insert((ClaimType::Earn, "vault".into()), idx("ukava", "0.5"));
        changes.claims.insert((ClaimType::Earn, owner), Claim::new(ClaimType::Earn, owner));
        assert_eq!(changes.len(), 3);
        store.apply(changes).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.iter_claims(ClaimType::Earn).unwrap().len(), 1);
    }
}

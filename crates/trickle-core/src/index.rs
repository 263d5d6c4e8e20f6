//! Reward index model.
//!
//! A reward index records, per reward denom, the cumulative reward emitted
//! per unit of source share since tracking began. Global indexes only ever
//! grow; a claim's copy is a checkpoint of the global value at its last
//! synchronization.
//!
//! Both collections are kept sorted by key so their encoding is canonical.

use serde::{Deserialize, Serialize};

use crate::decimal::Dec;
use crate::error::ParamsError;

/// Cumulative reward-per-share for one denom.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct RewardIndex {
    pub denom: String,
    pub factor: Dec,
}

impl RewardIndex {
    pub fn new(denom: impl Into<String>, factor: Dec) -> Self {
        Self { denom: denom.into(), factor }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.denom.trim().is_empty() {
            return Err(ParamsError::InvalidIndex("blank denom".into()));
        }
        if self.factor.is_negative() {
            return Err(ParamsError::InvalidIndex(format!(
                "negative factor {} for {}",
                self.factor, self.denom
            )));
        }
        Ok(())
    }
}

/// Denom-unique set of [`RewardIndex`] entries.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct RewardIndexes(Vec<RewardIndex>);

impl RewardIndexes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    fn position(&self, denom: &str) -> Result<usize, usize> {
        self.0.binary_search_by(|i| i.denom.as_str().cmp(denom))
    }

    pub fn get(&self, denom: &str) -> Option<&Dec> {
        self.position(denom).ok().map(|pos| &self.0[pos].factor)
    }

    /// Insert or overwrite the factor for `denom`.
    pub fn set(&mut self, denom: &str, factor: Dec) {
        match self.position(denom) {
            Ok(pos) => self.0[pos].factor = factor,
            Err(pos) => self.0.insert(pos, RewardIndex::new(denom, factor)),
        }
    }

    /// Copy with `denom` set to `factor`.
    pub fn with(&self, denom: &str, factor: Dec) -> Self {
        let mut out = self.clone();
        out.set(denom, factor);
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = &RewardIndex> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn denoms(&self) -> Vec<String> {
        self.0.iter().map(|i| i.denom.clone()).collect()
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        for index in &self.0 {
            index.validate()?;
        }
        if self.0.windows(2).any(|w| w[0].denom >= w[1].denom) {
            return Err(ParamsError::InvalidIndex("duplicate or unsorted denoms".into()));
        }
        Ok(())
    }
}

impl FromIterator<RewardIndex> for RewardIndexes {
    /// Later entries for the same denom overwrite earlier ones.
    fn from_iter<T: IntoIterator<Item = RewardIndex>>(iter: T) -> Self {
        let mut out = Self::new();
        for index in iter {
            out.set(&index.denom, index.factor);
        }
        out
    }
}

/// Reward indexes for one source id (collateral type, pool id, vault denom).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct MultiRewardIndex {
    pub source_id: String,
    pub reward_indexes: RewardIndexes,
}

impl MultiRewardIndex {
    pub fn new(source_id: impl Into<String>, reward_indexes: RewardIndexes) -> Self {
        Self { source_id: source_id.into(), reward_indexes }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.source_id.trim().is_empty() {
            return Err(ParamsError::InvalidIndex("blank source id".into()));
        }
        self.reward_indexes.validate()
    }
}

/// Source-id-unique set of [`MultiRewardIndex`] entries, as stored on a claim.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct MultiRewardIndexes(Vec<MultiRewardIndex>);

impl MultiRewardIndexes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    fn position(&self, source_id: &str) -> Result<usize, usize> {
        self.0.binary_search_by(|m| m.source_id.as_str().cmp(source_id))
    }

    pub fn get(&self, source_id: &str) -> Option<&RewardIndexes> {
        self.position(source_id).ok().map(|pos| &self.0[pos].reward_indexes)
    }

    /// Replace (or add) the indexes stored for `source_id`.
    pub fn set(&mut self, source_id: &str, indexes: RewardIndexes) {
        match self.position(source_id) {
            Ok(pos) => self.0[pos].reward_indexes = indexes,
            Err(pos) => self.0.insert(pos, MultiRewardIndex::new(source_id, indexes)),
        }
    }

    pub fn with(&self, source_id: &str, indexes: RewardIndexes) -> Self {
        let mut out = self.clone();
        out.set(source_id, indexes);
        out
    }

    pub fn remove(&mut self, source_id: &str) -> Option<RewardIndexes> {
        self.position(source_id).ok().map(|pos| self.0.remove(pos).reward_indexes)
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.0.iter().map(|m| m.source_id.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MultiRewardIndex> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        for entry in &self.0 {
            entry.validate()?;
        }
        if self.0.windows(2).any(|w| w[0].source_id >= w[1].source_id) {
            return Err(ParamsError::InvalidIndex("duplicate or unsorted source ids".into()));
        }
        Ok(())
    }
}

impl FromIterator<MultiRewardIndex> for MultiRewardIndexes {
    fn from_iter<T: IntoIterator<Item = MultiRewardIndex>>(iter: T) -> Self {
        let mut out = Self::new();
        for entry in iter {
            out.set(&entry.source_id, entry.reward_indexes);
        }
        out
    }
}

//! In-memory [`SharesSource`] and [`RewardBank`] for tests and simulations.

use std::collections::BTreeMap;

use crate::claim::ClaimType;
use crate::coins::Coins;
use crate::decimal::Dec;
use crate::error::{ClaimError, IncentiveError};
use crate::traits::{RewardBank, SharesSource};
use crate::types::Address;

/// Share balances set directly by the caller.
#[derive(Clone, Debug, Default)]
pub struct MemorySharesSource {
    totals: BTreeMap<(ClaimType, String), Dec>,
    owners: BTreeMap<(ClaimType, Address, String), Dec>,
}

impl MemorySharesSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_total(&mut self, claim_type: ClaimType, source_id: &str, shares: Dec) {
        self.totals.insert((claim_type, source_id.to_string()), shares);
    }

    /// Set an owner's shares and keep the source total consistent.
    pub fn set_owner_shares(&mut self, claim_type: ClaimType, owner: Address, source_id: &str, shares: Dec) {
        let key = (claim_type, owner, source_id.to_string());
        let previous = self.owners.insert(key, shares.clone()).unwrap_or_default();
        let total = self.totals.entry((claim_type, source_id.to_string())).or_default();
        *total = &(&*total - &previous) + &shares;
    }

    pub fn remove_source(&mut self, claim_type: ClaimType, source_id: &str) {
        self.totals.remove(&(claim_type, source_id.to_string()));
        self.owners.retain(|(t, _, id), _| !(*t == claim_type && id == source_id));
    }
}

impl SharesSource for MemorySharesSource {
    fn total_source_shares(&self, claim_type: ClaimType, source_id: &str) -> Option<Dec> {
        self.totals.get(&(claim_type, source_id.to_string())).cloned()
    }

    fn owner_shares(&self, claim_type: ClaimType, owner: &Address, source_id: &str) -> Option<Dec> {
        self.owners.get(&(claim_type, *owner, source_id.to_string())).cloned()
    }
}

/// A payout recorded by [`MemoryBank`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimelockedTransfer {
    pub receiver: Address,
    pub amount: Coins,
    pub lockup_seconds: u64,
}

/// Module account with a fixed starting balance. Every payout is recorded.
#[derive(Clone, Debug, Default)]
pub struct MemoryBank {
    module: Coins,
    transfers: Vec<TimelockedTransfer>,
}

impl MemoryBank {
    pub fn new(module: Coins) -> Self {
        Self { module, transfers: Vec::new() }
    }

    pub fn transfers(&self) -> &[TimelockedTransfer] {
        &self.transfers
    }

    /// Total sent to `receiver` so far.
    pub fn received(&self, receiver: &Address) -> Coins {
        self.transfers
            .iter()
            .filter(|t| &t.receiver == receiver)
            .fold(Coins::empty(), |acc, t| acc.checked_add(&t.amount).unwrap_or(acc))
    }
}

impl RewardBank for MemoryBank {
    fn module_balance(&self) -> Coins {
        self.module.clone()
    }

    fn send_timelocked(&mut self, receiver: &Address, amount: &Coins, lockup_seconds: u64) -> Result<(), IncentiveError> {
        for coin in amount.iter() {
            let have = self.module.amount_of(&coin.denom);
            if have < coin.amount {
                return Err(ClaimError::InsufficientModuleFunds {
                    denom: coin.denom.clone(),
                    have,
                    need: coin.amount,
                }
                .into());
            }
        }
        self.module = self.module.checked_sub(amount)?;
        self.transfers.push(TimelockedTransfer {
            receiver: *receiver,
            amount: amount.clone(),
            lockup_seconds,
        });
        Ok(())
    }
}

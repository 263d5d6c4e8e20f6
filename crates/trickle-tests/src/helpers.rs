//! Shared builders for scenario and property tests.

use trickle_core::claim::ClaimType;
use trickle_core::coins::{Coin, Coins};
use trickle_core::decimal::Dec;
use trickle_core::memory::{MemoryBank, MemorySharesSource};
use trickle_core::params::{Multiplier, MultipliersPerDenom, Params, RewardPeriod};
use trickle_core::store::MemoryStore;
use trickle_core::traits::SharesSource;
use trickle_core::types::{Address, Timestamp};
use trickle_engine::IncentiveEngine;

pub type TestEngine = IncentiveEngine<MemoryStore, MemorySharesSource, MemoryBank>;

/// Address filled with a seed byte.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

/// Parse a decimal literal. Panics on malformed input.
pub fn dec(s: &str) -> Dec {
    s.parse().unwrap_or_else(|e| panic!("bad decimal {s:?}: {e}"))
}

/// Coins from `(denom, amount)` pairs.
pub fn coins(pairs: &[(&str, u128)]) -> Coins {
    Coins::new(pairs.iter().map(|(d, a)| Coin::new(*d, *a))).unwrap_or_else(|e| panic!("bad coins: {e}"))
}

/// An active period running from `start` to `end`.
pub fn period(source_id: &str, start: Timestamp, end: Timestamp, rate: &[(&str, u128)]) -> RewardPeriod {
    RewardPeriod::new(true, source_id, start, end, coins(rate))
}

/// Multipliers for `denom`, optionally restricted to one claim type.
pub fn multipliers(denom: &str, context: Option<ClaimType>, entries: &[(&str, u32, &str)]) -> MultipliersPerDenom {
    MultipliersPerDenom {
        denom: denom.to_string(),
        context,
        multipliers: entries
            .iter()
            .map(|(name, months, factor)| Multiplier::new(*name, *months, dec(factor)))
            .collect(),
    }
}

/// Builder for [`Params`].
#[derive(Default)]
pub struct ParamsBuilder {
    params: Params,
}

impl ParamsBuilder {
    pub fn new(claim_end: Timestamp) -> Self {
        Self { params: Params { claim_end, ..Params::default() } }
    }

    pub fn period(mut self, claim_type: ClaimType, period: RewardPeriod) -> Self {
        self.params.reward_periods.entry(claim_type).or_default().push(period);
        self
    }

    pub fn multipliers(mut self, entry: MultipliersPerDenom) -> Self {
        self.params.claim_multipliers.push(entry);
        self
    }

    pub fn build(self) -> Params {
        self.params
    }
}

/// Engine over in-memory state with a funded module account.
pub fn engine(params: Params, module_funds: Coins) -> TestEngine {
    IncentiveEngine::new(MemoryStore::new(), MemorySharesSource::new(), MemoryBank::new(module_funds), params)
        .unwrap_or_else(|e| panic!("invalid params: {e}"))
}

/// Open a position: sync with the old shares, set the new ones, then
/// (re)initialize the checkpoint. Mirrors the host's hook order.
pub fn deposit(engine: &mut TestEngine, claim_type: ClaimType, source_id: &str, owner: Address, shares: Dec) {
    let existing = engine.shares().owner_shares(claim_type, &owner, source_id).is_some();
    if existing {
        engine
            .before_position_modified(claim_type, source_id, &owner)
            .unwrap_or_else(|e| panic!("sync failed: {e}"));
    }
    engine.shares_mut().set_owner_shares(claim_type, owner, source_id, shares);
    if !existing {
        engine
            .after_position_created(claim_type, source_id, &owner)
            .unwrap_or_else(|e| panic!("init failed: {e}"));
    }
}

//! The incentive engine façade.
//!
//! [`IncentiveEngine`] owns the committed store, the shares source, the
//! reward bank and the current params. Every public operation is one atomic
//! transition: it either commits all of its writes or none.

use tracing::{error, info, warn};
use trickle_core::claim::{Claim, ClaimType};
use trickle_core::coins::Coins;
use trickle_core::decimal::Dec;
use trickle_core::error::{IncentiveError, ParamsError};
use trickle_core::params::{Params, RewardPeriod};
use trickle_core::store::IncentiveStore;
use trickle_core::traits::{RewardBank, SharesSource};
use trickle_core::types::{Address, Timestamp};

use crate::accumulator::accumulate_rewards;
use crate::payout::{claim_reward, send_payout, ClaimRequest};
use crate::synchronizer;
use crate::transition::run_transition;

pub struct IncentiveEngine<S, Src, B> {
    store: S,
    shares: Src,
    bank: B,
    params: Params,
}

impl<S, Src, B> IncentiveEngine<S, Src, B>
where
    S: IncentiveStore,
    Src: SharesSource,
    B: RewardBank,
{
    /// # Errors
    ///
    /// - [`ParamsError`] if `params` fail validation
    pub fn new(store: S, shares: Src, bank: B, params: Params) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(Self { store, shares, bank, params })
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Replace the params. Invalid params are rejected and the old ones kept.
    pub fn set_params(&mut self, params: Params) -> Result<(), ParamsError> {
        params.validate()?;
        info!(claim_end = params.claim_end, "params updated");
        self.params = params;
        Ok(())
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn shares(&self) -> &Src {
        &self.shares
    }

    /// Mutable access for the modules that own the share balances.
    pub fn shares_mut(&mut self) -> &mut Src {
        &mut self.shares
    }

    pub fn bank(&self) -> &B {
        &self.bank
    }

    pub fn into_parts(self) -> (S, Src, B, Params) {
        (self.store, self.shares, self.bank, self.params)
    }

    /// Seed `owner`'s checkpoint for a newly opened position.
    pub fn initialize_reward(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        owner: &Address,
    ) -> Result<(), IncentiveError> {
        run_transition(&mut self.store, |store| {
            synchronizer::initialize_reward(store, claim_type, source_id, owner)
        })
    }

    /// Credit `owner` for `owner_shares` held since their last sync.
    pub fn synchronize_reward(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        owner: &Address,
        owner_shares: &Dec,
    ) -> Result<(), IncentiveError> {
        run_transition(&mut self.store, |store| {
            synchronizer::synchronize_reward(store, claim_type, source_id, owner, owner_shares)
        })
    }

    /// Advance one period's global index to `now` using the source's
    /// current total shares (zero if the source has no record).
    pub fn accumulate_reward(
        &mut self,
        claim_type: ClaimType,
        period: &RewardPeriod,
        now: Timestamp,
    ) -> Result<(), IncentiveError> {
        let total = self
            .shares
            .total_source_shares(claim_type, &period.source_id)
            .unwrap_or_default();
        run_transition(&mut self.store, |store| {
            accumulate_rewards(store, claim_type, period, &total, now)
        })
    }

    /// Accumulate every active period, claim types in [`ClaimType::ALL`]
    /// order and periods in param order, as a single transition.
    ///
    /// Returns how many periods were accumulated.
    pub fn accumulate_all(&mut self, now: Timestamp) -> Result<usize, IncentiveError> {
        let shares = &self.shares;
        let params = &self.params;
        run_transition(&mut self.store, |store| {
            let mut count = 0;
            for claim_type in ClaimType::ALL {
                for period in params.periods(claim_type) {
                    if !period.active {
                        continue;
                    }
                    let total = shares
                        .total_source_shares(claim_type, &period.source_id)
                        .unwrap_or_default();
                    accumulate_rewards(store, claim_type, period, &total, now)?;
                    count += 1;
                }
            }
            Ok(count)
        })
    }

    /// Pay out a claim. See [`claim_reward`] for the checks applied.
    ///
    /// The claim update commits before any coins move. If the store refuses
    /// the commit nothing is sent. If a transfer fails afterwards the claim
    /// stays reduced, so the same reward can never be paid twice, and the
    /// fatal error is returned for the host to act on.
    pub fn claim(&mut self, request: &ClaimRequest, now: Timestamp) -> Result<Coins, IncentiveError> {
        let shares = &self.shares;
        let bank = &self.bank;
        let params = &self.params;
        let payout = match run_transition(&mut self.store, |store| {
            claim_reward(store, shares, bank, params, request, now)
        }) {
            Ok(payout) => payout,
            Err(e) => {
                warn!(owner = %request.owner, claim_type = %request.claim_type, error = %e, "claim rejected");
                return Err(e);
            }
        };

        if let Err(e) = send_payout(&mut self.bank, &payout) {
            error!(
                owner = %request.owner,
                claim_type = %request.claim_type,
                owed = %payout.paid,
                error = %e,
                "claim committed but payout failed"
            );
            return Err(e);
        }

        info!(
            claim_type = %request.claim_type,
            owner = %request.owner,
            receiver = %payout.receiver,
            multiplier = %request.multiplier_name,
            paid = %payout.paid,
            transfers = payout.transfers.len(),
            "claim paid"
        );
        Ok(payout.paid)
    }

    /// Stored claim, without synchronization.
    pub fn get_claim(&self, claim_type: ClaimType, owner: &Address) -> Result<Option<Claim>, IncentiveError> {
        self.store.claim(claim_type, owner)
    }

    /// Claim as it would be after a full sync. Read-only.
    pub fn synchronized_claim(
        &self,
        claim_type: ClaimType,
        owner: &Address,
    ) -> Result<Option<Claim>, IncentiveError> {
        synchronizer::synchronized_claim(&self.store, &self.shares, claim_type, owner)
    }

    /// Hook: a position in `source_id` was just opened.
    pub fn after_position_created(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        owner: &Address,
    ) -> Result<(), IncentiveError> {
        self.initialize_reward(claim_type, source_id, owner)
    }

    /// Hook: a position in `source_id` is about to change. Syncs with the
    /// shares held before the change.
    pub fn before_position_modified(
        &mut self,
        claim_type: ClaimType,
        source_id: &str,
        owner: &Address,
    ) -> Result<(), IncentiveError> {
        let shares = self
            .shares
            .owner_shares(claim_type, owner, source_id)
            .unwrap_or_default();
        self.synchronize_reward(claim_type, source_id, owner, &shares)
    }
}

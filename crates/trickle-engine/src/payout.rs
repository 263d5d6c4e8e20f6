//! Claim settlement: multiplier resolution, payout and vesting lockup.

use std::collections::{BTreeMap, BTreeSet};

use trickle_core::claim::ClaimType;
use trickle_core::coins::Coins;
use trickle_core::constants::SECONDS_PER_LOCKUP_MONTH;
use trickle_core::decimal::Dec;
use trickle_core::error::{ClaimError, IncentiveError};
use trickle_core::params::{Multiplier, Params};
use trickle_core::store::IncentiveStore;
use trickle_core::traits::{RewardBank, SharesSource};
use trickle_core::types::{Address, Timestamp};

use crate::synchronizer::synchronized_claim;

/// A request to pay out part or all of a claim.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimRequest {
    pub owner: Address,
    pub receiver: Address,
    pub claim_type: ClaimType,
    pub multiplier_name: String,
    /// Denoms to claim. Empty claims every denom the claim holds.
    pub denoms: Vec<String>,
}

impl ClaimRequest {
    /// Claim everything `owner` has for `claim_type`, paid to `owner`.
    pub fn all(owner: Address, claim_type: ClaimType, multiplier_name: impl Into<String>) -> Self {
        Self {
            owner,
            receiver: owner,
            claim_type,
            multiplier_name: multiplier_name.into(),
            denoms: Vec::new(),
        }
    }

    pub fn to_receiver(mut self, receiver: Address) -> Self {
        self.receiver = receiver;
        self
    }

    pub fn with_denoms(mut self, denoms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.denoms = denoms.into_iter().map(Into::into).collect();
        self
    }
}

/// Lockup applied to a payout under `multiplier`.
pub fn lockup_seconds(multiplier: &Multiplier) -> u64 {
    u64::from(multiplier.lockup_months) * SECONDS_PER_LOCKUP_MONTH
}

/// `amount * factor`, truncated to whole units.
pub fn apply_multiplier(amount: u128, factor: &Dec) -> Result<u128, IncentiveError> {
    Ok(Dec::from(amount).mul_dec(factor).truncate_to_u128()?)
}

fn resolve<'p>(
    params: &'p Params,
    denom: &str,
    request: &ClaimRequest,
) -> Result<&'p Multiplier, ClaimError> {
    params
        .multiplier(denom, &request.multiplier_name, request.claim_type)
        .ok_or_else(|| ClaimError::InvalidMultiplier {
            name: request.multiplier_name.clone(),
            denom: denom.to_string(),
        })
}

/// Transfers owed for a settled claim, one per distinct lockup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payout {
    pub receiver: Address,
    /// Sum over every transfer.
    pub paid: Coins,
    /// Lockup seconds to the coins locked for that long.
    pub transfers: BTreeMap<u64, Coins>,
}

/// Settle `request` at time `now` and return the transfers it owes.
///
/// Order of checks: no denom listed twice, claim exists, multiplier valid
/// for every requested denom, claim window still open. The claim is then
/// fully synchronized, each selected denom is paid `reward * factor`
/// (truncated), and exactly the paid amount is removed from the claim.
///
/// Nothing is sent here. The caller commits the claim update first and then
/// hands the plan to [`send_payout`], so a failed commit never moves coins.
///
/// When `request.denoms` is empty the denoms are only known after
/// synchronization, so multipliers are resolved after the expiry check.
///
/// # Errors
///
/// - [`ClaimError::DuplicateDenom`] if a denom is requested twice
/// - [`ClaimError::ClaimNotFound`] if the owner has no claim of this type
/// - [`ClaimError::InvalidMultiplier`] if a denom has no such multiplier
/// - [`ClaimError::ClaimExpired`] if `now >= params.claim_end`
/// - [`ClaimError::ZeroClaim`] if nothing would be paid
/// - [`ClaimError::InsufficientModuleFunds`] if the bank cannot pay
pub fn claim_reward<S, Src, B>(
    store: &mut S,
    shares: &Src,
    bank: &B,
    params: &Params,
    request: &ClaimRequest,
    now: Timestamp,
) -> Result<Payout, IncentiveError>
where
    S: IncentiveStore + ?Sized,
    Src: SharesSource + ?Sized,
    B: RewardBank + ?Sized,
{
    let mut seen = BTreeSet::new();
    if let Some(dup) = request.denoms.iter().find(|d| !seen.insert(d.as_str())) {
        return Err(ClaimError::DuplicateDenom(dup.clone()).into());
    }

    if store.claim(request.claim_type, &request.owner)?.is_none() {
        return Err(ClaimError::ClaimNotFound {
            owner: request.owner.to_string(),
            claim_type: request.claim_type.to_string(),
        }
        .into());
    }

    for denom in &request.denoms {
        resolve(params, denom, request)?;
    }

    if now >= params.claim_end {
        return Err(ClaimError::ClaimExpired { now, claim_end: params.claim_end }.into());
    }

    let Some(mut claim) = synchronized_claim(&*store, shares, request.claim_type, &request.owner)? else {
        return Err(ClaimError::ClaimNotFound {
            owner: request.owner.to_string(),
            claim_type: request.claim_type.to_string(),
        }
        .into());
    };

    let denoms = if request.denoms.is_empty() {
        claim.reward.denoms()
    } else {
        request.denoms.clone()
    };

    // denoms sharing a lockup go out in one transfer
    let mut transfers: BTreeMap<u64, Coins> = BTreeMap::new();
    let mut paid = Coins::empty();
    for denom in &denoms {
        let multiplier = resolve(params, denom, request)?;
        let amount = apply_multiplier(claim.reward.amount_of(denom), &multiplier.factor)?;
        if amount > 0 {
            paid.add_amount(denom, amount)?;
            transfers.entry(lockup_seconds(multiplier)).or_default().add_amount(denom, amount)?;
        }
    }
    if paid.is_empty() {
        return Err(ClaimError::ZeroClaim.into());
    }

    // every transfer must be fundable before any is sent
    let balance = bank.module_balance();
    if let Some(short) = paid.iter().find(|c| balance.amount_of(&c.denom) < c.amount) {
        return Err(ClaimError::InsufficientModuleFunds {
            denom: short.denom.clone(),
            have: balance.amount_of(&short.denom),
            need: short.amount,
        }
        .into());
    }

    claim.reward = claim.reward.checked_sub(&paid)?;
    store.set_claim(claim)?;
    Ok(Payout { receiver: request.receiver, paid, transfers })
}

/// Send every transfer of `payout`, shortest lockup first. Stops at the
/// first failure.
pub fn send_payout<B>(bank: &mut B, payout: &Payout) -> Result<(), IncentiveError>
where
    B: RewardBank + ?Sized,
{
    for (lockup, coins) in &payout.transfers {
        bank.send_timelocked(&payout.receiver, coins, *lockup)?;
    }
    Ok(())
}

//! Contracts with the collaborators around the engine.
//!
//! - [`SharesSource`]: read-only share balances reported by the modules that
//!   own each source activity (lending, AMM, staking, vaults, savings, minting)
//! - [`RewardBank`]: the account that holds undistributed rewards and pays
//!   claims out

use crate::claim::ClaimType;
use crate::coins::Coins;
use crate::decimal::Dec;
use crate::error::IncentiveError;
use crate::types::Address;

/// Share balances per source id.
///
/// `None` means the source has no record; the engine treats it as zero
/// shares, never as an error.
pub trait SharesSource: Send + Sync {
    /// Sum of all owners' shares in `source_id`.
    fn total_source_shares(&self, claim_type: ClaimType, source_id: &str) -> Option<Dec>;

    /// Shares `owner` holds in `source_id`.
    fn owner_shares(&self, claim_type: ClaimType, owner: &Address, source_id: &str) -> Option<Dec>;
}

/// Reward payout account.
pub trait RewardBank: Send + Sync {
    /// Undistributed reward held by the incentive module account.
    fn module_balance(&self) -> Coins;

    /// Move `amount` from the module account to `receiver`, locked for
    /// `lockup_seconds`.
    ///
    /// # Errors
    ///
    /// - [`ClaimError::InsufficientModuleFunds`](crate::error::ClaimError::InsufficientModuleFunds)
    ///   if the module account cannot cover `amount`
    fn send_timelocked(&mut self, receiver: &Address, amount: &Coins, lockup_seconds: u64) -> Result<(), IncentiveError>;
}

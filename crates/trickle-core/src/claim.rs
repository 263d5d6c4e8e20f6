//! Per-owner reward claims.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::coins::Coins;
use crate::error::ParamsError;
use crate::index::MultiRewardIndexes;
use crate::types::Address;

/// The kind of source activity a claim (and its reward periods) belongs to.
///
/// Each kind has its own accrual times, global indexes and claims. The
/// variant order is the order in which periods are accumulated.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
    bincode::Encode, bincode::Decode,
)]
#[serde(rename_all = "snake_case")]
pub enum ClaimType {
    UsdxMinting,
    HardSupply,
    HardBorrow,
    Delegator,
    Swap,
    Savings,
    Earn,
}

impl ClaimType {
    pub const ALL: [ClaimType; 7] = [
        ClaimType::UsdxMinting,
        ClaimType::HardSupply,
        ClaimType::HardBorrow,
        ClaimType::Delegator,
        ClaimType::Swap,
        ClaimType::Savings,
        ClaimType::Earn,
    ];

    /// Stable one-byte tag, used as a storage key prefix.
    pub fn as_byte(self) -> u8 {
        match self {
            ClaimType::UsdxMinting => 1,
            ClaimType::HardSupply => 2,
            ClaimType::HardBorrow => 3,
            ClaimType::Delegator => 4,
            ClaimType::Swap => 5,
            ClaimType::Savings => 6,
            ClaimType::Earn => 7,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_byte() == byte)
    }

    pub fn name(self) -> &'static str {
        match self {
            ClaimType::UsdxMinting => "usdx_minting",
            ClaimType::HardSupply => "hard_supply",
            ClaimType::HardBorrow => "hard_borrow",
            ClaimType::Delegator => "delegator",
            ClaimType::Swap => "swap",
            ClaimType::Savings => "savings",
            ClaimType::Earn => "earn",
        }
    }
}

impl fmt::Display for ClaimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ClaimType {
    type Err = ParamsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| ParamsError::InvalidClaim(format!("unknown claim type {s:?}")))
    }
}

/// An owner's accumulated-but-unpaid reward for one [`ClaimType`], plus the
/// index checkpoint of every source the owner has been synchronized on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Claim {
    pub claim_type: ClaimType,
    pub owner: Address,
    pub reward: Coins,
    pub reward_indexes: MultiRewardIndexes,
}

impl Claim {
    /// Empty claim: no reward, no checkpoints.
    pub fn new(claim_type: ClaimType, owner: Address) -> Self {
        Self {
            claim_type,
            owner,
            reward: Coins::empty(),
            reward_indexes: MultiRewardIndexes::new(),
        }
    }

    pub fn has_source(&self, source_id: &str) -> bool {
        self.reward_indexes.get(source_id).is_some()
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.owner.is_zero() {
            return Err(ParamsError::InvalidClaim("claim owner cannot be empty".into()));
        }
        self.reward
            .validate()
            .map_err(|e| ParamsError::InvalidClaim(e.to_string()))?;
        self.reward_indexes.validate()
    }
}

//! Multi-denom token amounts.
//!
//! [`Coins`] is kept canonical at all times: sorted by denom, one entry per
//! denom, no zero amounts. Two equal balances therefore always encode to the
//! same bytes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::MAX_DENOM_LEN;
use crate::error::CoinsError;

/// A single denom amount in whole token units.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, bincode::Encode, bincode::Decode)]
pub struct Coin {
    pub denom: String,
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self { denom: denom.into(), amount }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Check a denom: 3..=128 chars, leading ASCII letter, then letters, digits
/// or one of `/:._-`.
pub fn validate_denom(denom: &str) -> Result<(), CoinsError> {
    let mut chars = denom.chars();
    let leading_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || "/:._-".contains(c));
    if !leading_letter || !rest_ok || denom.len() < 3 || denom.len() > MAX_DENOM_LEN {
        return Err(CoinsError::InvalidDenom(denom.to_string()));
    }
    Ok(())
}

/// Sorted, zero-free set of [`Coin`]s.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, Hash, bincode::Encode, bincode::Decode)]
#[serde(try_from = "Vec<Coin>", into = "Vec<Coin>")]
pub struct Coins(Vec<Coin>);

impl Coins {
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Build a canonical set from arbitrary coins. Duplicate denoms are
    /// summed and zero amounts dropped.
    pub fn new(coins: impl IntoIterator<Item = Coin>) -> Result<Self, CoinsError> {
        let mut out = Self::empty();
        for coin in coins {
            validate_denom(&coin.denom)?;
            out.add_amount(&coin.denom, coin.amount)?;
        }
        Ok(out)
    }

    /// One-denom set. Empty if `amount` is zero.
    pub fn single(denom: impl Into<String>, amount: u128) -> Result<Self, CoinsError> {
        Self::new([Coin::new(denom, amount)])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn denoms(&self) -> Vec<String> {
        self.0.iter().map(|c| c.denom.clone()).collect()
    }

    /// Amount of `denom`, zero if absent.
    pub fn amount_of(&self, denom: &str) -> u128 {
        match self.0.binary_search_by(|c| c.denom.as_str().cmp(denom)) {
            Ok(pos) => self.0[pos].amount,
            Err(_) => 0,
        }
    }

    /// Add `amount` of `denom` in place.
    pub fn add_amount(&mut self, denom: &str, amount: u128) -> Result<(), CoinsError> {
        if amount == 0 {
            return Ok(());
        }
        match self.0.binary_search_by(|c| c.denom.as_str().cmp(denom)) {
            Ok(pos) => {
                let coin = &mut self.0[pos];
                coin.amount = coin
                    .amount
                    .checked_add(amount)
                    .ok_or_else(|| CoinsError::Overflow(denom.to_string()))?;
            }
            Err(pos) => self.0.insert(pos, Coin::new(denom, amount)),
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &Coins) -> Result<Coins, CoinsError> {
        let mut out = self.clone();
        for coin in other.iter() {
            out.add_amount(&coin.denom, coin.amount)?;
        }
        Ok(out)
    }

    /// `self - other`. Fails if any denom would go negative.
    pub fn checked_sub(&self, other: &Coins) -> Result<Coins, CoinsError> {
        let mut out = self.clone();
        for coin in other.iter() {
            let have = out.amount_of(&coin.denom);
            if have < coin.amount {
                return Err(CoinsError::Insufficient {
                    denom: coin.denom.clone(),
                    have,
                    need: coin.amount,
                });
            }
            if let Ok(pos) = out.0.binary_search_by(|c| c.denom.cmp(&coin.denom)) {
                out.0[pos].amount -= coin.amount;
                if out.0[pos].amount == 0 {
                    out.0.remove(pos);
                }
            }
        }
        Ok(out)
    }

    /// Whether every denom in `other` is covered by `self`.
    pub fn is_all_gte(&self, other: &Coins) -> bool {
        other.iter().all(|c| self.amount_of(&c.denom) >= c.amount)
    }

    /// Keep only the listed denoms.
    pub fn filter(&self, denoms: &[String]) -> Coins {
        Self(self.0.iter().filter(|c| denoms.contains(&c.denom)).cloned().collect())
    }

    pub fn validate(&self) -> Result<(), CoinsError> {
        for coin in &self.0 {
            validate_denom(&coin.denom)?;
            if coin.amount == 0 {
                return Err(CoinsError::InvalidDenom(format!("zero amount for {}", coin.denom)));
            }
        }
        if self.0.windows(2).any(|w| w[0].denom >= w[1].denom) {
            return Err(CoinsError::InvalidDenom("coins not sorted or duplicated".into()));
        }
        Ok(())
    }
}

impl TryFrom<Vec<Coin>> for Coins {
    type Error = CoinsError;

    fn try_from(coins: Vec<Coin>) -> Result<Self, Self::Error> {
        Self::new(coins)
    }
}

impl From<Coins> for Vec<Coin> {
    fn from(coins: Coins) -> Self {
        coins.0
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, coin) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{coin}")?;
        }
        Ok(())
    }
}

//! Governance parameters: reward periods, claim multipliers and the claim
//! window.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::claim::ClaimType;
use crate::coins::Coins;
use crate::constants::DEFAULT_CLAIM_END;
use crate::decimal::Dec;
use crate::error::ParamsError;
use crate::types::Timestamp;

/// Emission schedule for one source id.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct RewardPeriod {
    pub active: bool,
    pub source_id: String,
    pub start: Timestamp,
    pub end: Timestamp,
    pub rewards_per_second: Coins,
}

impl RewardPeriod {
    pub fn new(
        active: bool,
        source_id: impl Into<String>,
        start: Timestamp,
        end: Timestamp,
        rewards_per_second: Coins,
    ) -> Self {
        Self { active, source_id: source_id.into(), start, end, rewards_per_second }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.source_id.trim().is_empty() {
            return Err(ParamsError::BlankSourceId);
        }
        if self.start == 0 {
            return Err(ParamsError::ZeroStart(self.source_id.clone()));
        }
        if self.end == 0 {
            return Err(ParamsError::ZeroEnd(self.source_id.clone()));
        }
        if self.start > self.end {
            return Err(ParamsError::EndBeforeStart {
                source_id: self.source_id.clone(),
                start: self.start,
                end: self.end,
            });
        }
        self.rewards_per_second.validate().map_err(|e| ParamsError::InvalidRate {
            source_id: self.source_id.clone(),
            reason: e.to_string(),
        })
    }
}

/// A named vesting schedule: the fraction of a claim paid out, and how many
/// months the payout stays locked.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Multiplier {
    pub name: String,
    pub lockup_months: u32,
    pub factor: Dec,
}

impl Multiplier {
    pub fn new(name: impl Into<String>, lockup_months: u32, factor: Dec) -> Self {
        Self { name: name.into(), lockup_months, factor }
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.name.trim().is_empty() {
            return Err(ParamsError::BlankMultiplierName);
        }
        if !self.factor.is_positive() || self.factor > Dec::one() {
            return Err(ParamsError::InvalidMultiplierFactor {
                name: self.name.clone(),
                factor: self.factor.to_string(),
            });
        }
        Ok(())
    }
}

/// Multipliers available for one reward denom. `context` restricts them to
/// claims of one type; `None` applies to any claim type without its own
/// entry.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct MultipliersPerDenom {
    pub denom: String,
    #[serde(default)]
    pub context: Option<ClaimType>,
    pub multipliers: Vec<Multiplier>,
}

impl MultipliersPerDenom {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.denom.trim().is_empty() {
            return Err(ParamsError::BlankDenom);
        }
        let mut names = BTreeSet::new();
        for m in &self.multipliers {
            m.validate()?;
            if !names.insert(m.name.as_str()) {
                return Err(ParamsError::DuplicateMultiplier {
                    denom: self.denom.clone(),
                    name: m.name.clone(),
                });
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, bincode::Encode, bincode::Decode)]
pub struct Params {
    pub reward_periods: BTreeMap<ClaimType, Vec<RewardPeriod>>,
    pub claim_multipliers: Vec<MultipliersPerDenom>,
    pub claim_end: Timestamp,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            reward_periods: BTreeMap::new(),
            claim_multipliers: Vec::new(),
            claim_end: DEFAULT_CLAIM_END,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.claim_end == 0 {
            return Err(ParamsError::ZeroClaimEnd);
        }

        for (claim_type, periods) in &self.reward_periods {
            let mut seen = BTreeSet::new();
            for period in periods {
                period.validate()?;
                if !seen.insert(period.source_id.as_str()) {
                    return Err(ParamsError::DuplicatePeriod {
                        claim_type: claim_type.to_string(),
                        source_id: period.source_id.clone(),
                    });
                }
            }
        }

        let mut seen = BTreeSet::new();
        for per_denom in &self.claim_multipliers {
            per_denom.validate()?;
            if !seen.insert((per_denom.denom.as_str(), per_denom.context)) {
                return Err(ParamsError::DuplicateDenom {
                    denom: per_denom.denom.clone(),
                    context: per_denom.context.map_or("any".to_string(), |c| c.to_string()),
                });
            }
        }
        Ok(())
    }

    /// Reward periods of one claim type, in param order.
    pub fn periods(&self, claim_type: ClaimType) -> &[RewardPeriod] {
        self.reward_periods.get(&claim_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn period(&self, claim_type: ClaimType, source_id: &str) -> Option<&RewardPeriod> {
        self.periods(claim_type).iter().find(|p| p.source_id == source_id)
    }

    /// Resolve multiplier `name` for `denom` when claiming a `context` claim.
    ///
    /// Multipliers scoped to `context` take precedence over context-free ones.
    pub fn multiplier(&self, denom: &str, name: &str, context: ClaimType) -> Option<&Multiplier> {
        let find = |ctx: Option<ClaimType>| {
            self.claim_multipliers
                .iter()
                .find(|m| m.denom == denom && m.context == ctx)
        };
        find(Some(context))
            .or_else(|| find(None))
            .and_then(|per_denom| per_denom.multipliers.iter().find(|m| m.name == name))
    }
}

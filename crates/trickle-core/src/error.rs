//! Error types for the Trickle incentive engine.
//!
//! Errors fall into two classes. [`CorruptionError`] (and storage or coin
//! arithmetic failures) mean persisted state can no longer be trusted: the
//! enclosing transition must abort and nothing it wrote may commit.
//! [`ClaimError`] and [`ParamsError`] are ordinary user or governance input
//! failures that leave state untouched.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    #[error("empty decimal string")] Empty,
    #[error("invalid decimal string: {0}")] Invalid(String),
    #[error("too many fractional digits: {0} > 18")] TooPrecise(usize),
    #[error("decimal out of range: {0}")] OutOfRange(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoinsError {
    #[error("invalid denom: {0:?}")] InvalidDenom(String),
    #[error("insufficient {denom}: have {have}, need {need}")] Insufficient { denom: String, have: u128, need: u128 },
    #[error("amount overflow for {0}")] Overflow(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamsError {
    #[error("reward period source id cannot be blank")] BlankSourceId,
    #[error("reward period {0} start time cannot be 0")] ZeroStart(String),
    #[error("reward period {0} end time cannot be 0")] ZeroEnd(String),
    #[error("reward period {source_id} ends ({end}) before it starts ({start})")] EndBeforeStart { source_id: String, start: u64, end: u64 },
    #[error("invalid rewards per second for {source_id}: {reason}")] InvalidRate { source_id: String, reason: String },
    #[error("duplicated {claim_type} reward period for {source_id}")] DuplicatePeriod { claim_type: String, source_id: String },
    #[error("multiplier denom cannot be blank")] BlankDenom,
    #[error("duplicated multipliers for denom {denom} in context {context}")] DuplicateDenom { denom: String, context: String },
    #[error("duplicated multiplier {name} for denom {denom}")] DuplicateMultiplier { denom: String, name: String },
    #[error("multiplier name cannot be blank")] BlankMultiplierName,
    #[error("multiplier {name} factor {factor} must be in (0, 1]")] InvalidMultiplierFactor { name: String, factor: String },
    #[error("claim end time cannot be 0")] ZeroClaimEnd,
    #[error("invalid reward index: {0}")] InvalidIndex(String),
    #[error("invalid claim: {0}")] InvalidClaim(String),
}

/// Invariant violations. Any of these aborts the whole transition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CorruptionError {
    #[error("accrual time went backwards for {source_id}: previous {previous}, current {current}")] BackwardTime { source_id: String, previous: u64, current: u64 },
    #[error("global reward factor decreased for {source_id}/{denom}: claim {claim_factor}, global {global_factor}")] DecreasingRewardFactor { source_id: String, denom: String, claim_factor: String, global_factor: String },
    #[error("global reward index for {source_id}/{denom} disappeared")] MissingRewardFactor { source_id: String, denom: String },
    #[error("refusing to persist empty reward indexes for {0}")] EmptyIndexes(String),
    #[error("negative shares for {source_id}: {shares}")] NegativeShares { source_id: String, shares: String },
    #[error("arithmetic overflow: {0}")] ArithmeticOverflow(String),
}

/// Recoverable claim failures. State is left unmodified.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClaimError {
    #[error("no {claim_type} claim for {owner}")] ClaimNotFound { owner: String, claim_type: String },
    #[error("invalid multiplier {name} for denom {denom}")] InvalidMultiplier { name: String, denom: String },
    #[error("claim expired: time {now} >= claim end {claim_end}")] ClaimExpired { now: u64, claim_end: u64 },
    #[error("denom {0} listed more than once")] DuplicateDenom(String),
    #[error("cannot claim - no rewards would be paid")] ZeroClaim,
    #[error("insufficient module funds for {denom}: have {have}, need {need}")] InsufficientModuleFunds { denom: String, have: u128, need: u128 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend: {0}")] Backend(String),
    #[error("codec: {0}")] Codec(String),
    #[error("missing column family: {0}")] MissingColumnFamily(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IncentiveError {
    #[error(transparent)] Decimal(#[from] DecimalError),
    #[error(transparent)] Coins(#[from] CoinsError),
    #[error(transparent)] Params(#[from] ParamsError),
    #[error(transparent)] Corruption(#[from] CorruptionError),
    #[error(transparent)] Claim(#[from] ClaimError),
    #[error(transparent)] Store(#[from] StoreError),
}

impl IncentiveError {
    /// Whether this error means persisted state is untrustworthy.
    ///
    /// Fatal errors must abort the enclosing transition; the host should
    /// halt rather than retry.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Corruption(_) | Self::Store(_) | Self::Coins(_))
    }
}

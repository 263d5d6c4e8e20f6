//! Node configuration and the on-disk params file.
//!
//! [`NodeConfig`] is read from an optional TOML file and then overridden by
//! `TRICKLE_*` environment variables. [`ParamsFile`] is the human-edited
//! TOML form of [`Params`]: times are RFC 3339 strings and factors are
//! decimal strings. TOML integers stop at `i64::MAX`, so a coin amount may
//! also be written as a decimal string to reach the full `u128` range.
//!
//! ```toml
//! claim_end = "2030-01-01T00:00:00Z"
//!
//! [[reward_periods]]
//! claim_type = "swap"
//! source_id = "ukava:usdx"
//! start = "2024-01-01T00:00:00Z"
//! end = "2026-01-01T00:00:00Z"
//! rewards_per_second = [{ denom = "swp", amount = 2000 }]
//!
//! [[claim_multipliers]]
//! denom = "swp"
//! multipliers = [{ name = "large", lockup_months = 12, factor = "1.0" }]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use trickle_core::claim::ClaimType;
use trickle_core::coins::{Coin, Coins};
use trickle_core::decimal::Dec;
use trickle_core::error::IncentiveError;
use trickle_core::params::{Multiplier, MultipliersPerDenom, Params, RewardPeriod};
use trickle_core::types::Timestamp;

use crate::error::NodeError;

/// Output format for the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for a node instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Root directory for all persistent data.
    pub data_dir: PathBuf,
    /// Log level filter string (e.g. "info", "trickle_engine=trace").
    pub log_level: String,
    pub log_format: LogFormat,
    /// Params file to load at startup. Default params are used when unset.
    pub params_file: Option<PathBuf>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("trickle");

        Self {
            data_dir,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            params_file: None,
        }
    }
}

impl NodeConfig {
    /// Load from `path` (if given), then apply `TRICKLE_*` overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, NodeError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        let cfg = builder
            .add_source(Environment::with_prefix("TRICKLE"))
            .build()?
            .try_deserialize()?;
        Ok(cfg)
    }

    /// Path to the RocksDB incentive state directory.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("incentive")
    }

    /// Params from `params_file`, or the defaults.
    pub fn params(&self) -> Result<Params, NodeError> {
        match &self.params_file {
            Some(path) => ParamsFile::load(path)?.into_params(),
            None => Ok(Params::default()),
        }
    }
}

// --- Params file ---

#[derive(Debug, Clone, Deserialize)]
pub struct CoinEntry {
    pub denom: String,
    pub amount: AmountEntry,
}

/// `amount = 2000` or `amount = "340282366920938463463374607431768211455"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AmountEntry {
    Int(u64),
    Text(String),
}

impl AmountEntry {
    pub fn to_u128(&self) -> Result<u128, NodeError> {
        match self {
            Self::Int(n) => Ok(u128::from(*n)),
            Self::Text(s) => s
                .parse()
                .map_err(|_| NodeError::Field { field: "coin amount", value: s.clone() }),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RewardPeriodEntry {
    pub claim_type: String,
    #[serde(default = "default_active")]
    pub active: bool,
    pub source_id: String,
    pub start: String,
    pub end: String,
    pub rewards_per_second: Vec<CoinEntry>,
}

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultiplierEntry {
    pub name: String,
    pub lockup_months: u32,
    pub factor: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MultipliersEntry {
    pub denom: String,
    #[serde(default)]
    pub context: Option<String>,
    pub multipliers: Vec<MultiplierEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ParamsFile {
    #[serde(default)]
    pub reward_periods: Vec<RewardPeriodEntry>,
    #[serde(default)]
    pub claim_multipliers: Vec<MultipliersEntry>,
    pub claim_end: String,
}

impl ParamsFile {
    pub fn load(path: &Path) -> Result<Self, NodeError> {
        let file = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(true))
            .build()?
            .try_deserialize()?;
        Ok(file)
    }

    pub fn from_toml(text: &str) -> Result<Self, NodeError> {
        let file = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        Ok(file)
    }

    /// Convert to validated [`Params`].
    pub fn into_params(self) -> Result<Params, NodeError> {
        let mut reward_periods: BTreeMap<ClaimType, Vec<RewardPeriod>> = BTreeMap::new();
        for entry in self.reward_periods {
            let claim_type: ClaimType = entry.claim_type.parse()?;
            let coins = entry
                .rewards_per_second
                .into_iter()
                .map(|c| Ok(Coin::new(c.denom, c.amount.to_u128()?)))
                .collect::<Result<Vec<_>, NodeError>>()?;
            let rate = Coins::new(coins).map_err(IncentiveError::from)?;
            let period = RewardPeriod::new(
                entry.active,
                entry.source_id,
                parse_time(&entry.start)?,
                parse_time(&entry.end)?,
                rate,
            );
            reward_periods.entry(claim_type).or_default().push(period);
        }

        let mut claim_multipliers = Vec::with_capacity(self.claim_multipliers.len());
        for entry in self.claim_multipliers {
            let context = entry.context.as_deref().map(str::parse::<ClaimType>).transpose()?;
            let multipliers = entry
                .multipliers
                .into_iter()
                .map(|m| Ok(Multiplier::new(m.name, m.lockup_months, parse_factor(&m.factor)?)))
                .collect::<Result<Vec<_>, NodeError>>()?;
            claim_multipliers.push(MultipliersPerDenom { denom: entry.denom, context, multipliers });
        }

        let params = Params { reward_periods, claim_multipliers, claim_end: parse_time(&self.claim_end)? };
        params.validate()?;
        Ok(params)
    }
}

/// RFC 3339 string to unix seconds. Times at or before the epoch are rejected.
pub fn parse_time(value: &str) -> Result<Timestamp, NodeError> {
    let parsed = chrono::DateTime::parse_from_rfc3339(value).map_err(|e| NodeError::Time {
        value: value.to_string(),
        reason: e.to_string(),
    })?;
    match u64::try_from(parsed.timestamp()) {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(NodeError::Time { value: value.to_string(), reason: "must be after the unix epoch".into() }),
    }
}

fn parse_factor(value: &str) -> Result<Dec, NodeError> {
    value
        .parse()
        .map_err(|_| NodeError::Field { field: "multiplier factor", value: value.to_string() })
}

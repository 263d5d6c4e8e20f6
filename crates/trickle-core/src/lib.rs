//! # trickle-core
//! Foundation types and traits for the Trickle incentive engine.
//!
//! Everything here is pure data or a contract between crates. The algorithms
//! that move global indexes and settle claims live in `trickle-engine`.

pub mod calculator;
pub mod claim;
pub mod coins;
pub mod constants;
pub mod decimal;
pub mod error;
pub mod index;
pub mod memory;
pub mod params;
pub mod store;
pub mod traits;
pub mod types;

pub use claim::{Claim, ClaimType};
pub use coins::{Coin, Coins};
pub use decimal::Dec;
pub use error::IncentiveError;
pub use index::{MultiRewardIndex, MultiRewardIndexes, RewardIndex, RewardIndexes};
pub use memory::{MemoryBank, MemorySharesSource};
pub use params::{Multiplier, MultipliersPerDenom, Params, RewardPeriod};
pub use store::{ChangeSet, IncentiveStore, MemoryStore};
pub use traits::{RewardBank, SharesSource};
pub use types::{Address, Timestamp};

//! # trickle-engine
//! Reward accumulation, lazy synchronization and claim payout.
//!
//! - [`accumulator`]: advances global per-source indexes over time
//! - [`synchronizer`]: catches individual claims up to the global index
//! - [`payout`]: settles claims through vesting multipliers
//! - [`transition`]: buffers writes so every operation commits atomically
//! - [`engine`]: the [`IncentiveEngine`] tying them together

pub mod accumulator;
pub mod engine;
pub mod payout;
pub mod synchronizer;
pub mod transition;

pub use engine::IncentiveEngine;
pub use payout::{ClaimRequest, Payout};

//! Engine constants. All times are unix seconds.

/// Number of fractional digits carried by [`Dec`](crate::decimal::Dec).
pub const DEC_PLACES: usize = 18;

/// `10^DEC_PLACES`, the fixed-point scale of [`Dec`](crate::decimal::Dec).
pub const DEC_SCALE: u64 = 1_000_000_000_000_000_000;

/// Default global claim deadline: one second after the unix epoch, which
/// makes every claim expired until governance sets a real value.
pub const DEFAULT_CLAIM_END: u64 = 1;

/// Length of one multiplier lockup month in seconds (30 days).
pub const SECONDS_PER_LOCKUP_MONTH: u64 = 30 * 24 * 60 * 60;

/// Maximum length of a denom or source id.
pub const MAX_DENOM_LEN: usize = 128;

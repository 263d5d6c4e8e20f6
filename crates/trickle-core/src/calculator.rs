//! Per-second reward emission over an accrual window.
//!
//! Pure function, no state. The accumulator in `trickle-engine` feeds it the
//! stored accrual time and the transition's current time.

use crate::coins::Coins;
use crate::error::CorruptionError;
use crate::types::Timestamp;

/// Seconds of `[start, end]` that fall inside `(previous, current]`.
pub fn elapsed_in_period(start: Timestamp, end: Timestamp, previous: Timestamp, current: Timestamp) -> u64 {
    if current <= start || previous >= end {
        return 0;
    }
    let from = previous.max(start);
    let to = current.min(end);
    to.saturating_sub(from)
}

/// Rewards emitted between `previous` and `current` for a period running
/// from `start` to `end` at `rewards_per_second`.
///
/// Returns the increment and the new accrual time, which is always
/// `current` so a later call never re-counts or skips seconds.
///
/// # Errors
///
/// - [`CorruptionError::BackwardTime`] if `current < previous`
/// - [`CorruptionError::ArithmeticOverflow`] if `rate * seconds` exceeds `u128`
pub fn calculate_per_second_rewards(
    source_id: &str,
    start: Timestamp,
    end: Timestamp,
    rewards_per_second: &Coins,
    previous: Timestamp,
    current: Timestamp,
) -> Result<(Coins, Timestamp), CorruptionError> {
    if current < previous {
        return Err(CorruptionError::BackwardTime {
            source_id: source_id.to_string(),
            previous,
            current,
        });
    }

    let seconds = elapsed_in_period(start, end, previous, current);
    if seconds == 0 {
        return Ok((Coins::empty(), current));
    }

    let mut increment = Coins::empty();
    for coin in rewards_per_second.iter() {
        let amount = coin
            .amount
            .checked_mul(u128::from(seconds))
            .ok_or_else(|| CorruptionError::ArithmeticOverflow(format!("{coin} x {seconds}s")))?;
        increment
            .add_amount(&coin.denom, amount)
            .map_err(|e| CorruptionError::ArithmeticOverflow(e.to_string()))?;
    }
    Ok((increment, current))
}

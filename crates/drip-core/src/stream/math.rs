//! Vesting arithmetic.
//!
//! Pure functions of a stream's parameters and a timestamp. Nothing here
//! touches the stream table or a clock, which keeps every arithmetic
//! property directly checkable in isolation.

use serde::{Deserialize, Serialize};

/// Interpolation applied between `start_time` and `stop_time`.
///
/// The curve is configuration rather than a hard-coded formula, so a
/// deployment whose originating protocol vests on a different schedule can
/// slot its own interpolation in without touching the ledger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum VestingCurve {
    /// Straight-line vesting: the vested amount grows proportionally to
    /// elapsed time, truncated toward zero.
    #[default]
    Linear,
}

impl VestingCurve {
    /// Returns the amount of `deposit` vested to the recipient at `now`.
    ///
    /// - `now <= start_time` vests nothing.
    /// - `now >= stop_time` vests the full deposit.
    /// - In between, `Linear` vests `deposit * elapsed / duration` with
    ///   integer truncation.
    ///
    /// The recipient side holds this truncated floor and the sender side
    /// (`deposit - vested`) holds the rounding remainder, so the two sides
    /// always account for the whole deposit to within one unit, and exactly
    /// outside the vesting window.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // quotient < deposit, see below
    pub fn vested(self, deposit: u64, start_time: u64, stop_time: u64, now: u64) -> u64 {
        if now <= start_time || stop_time <= start_time {
            return 0;
        }
        if now >= stop_time {
            return deposit;
        }

        let elapsed = u128::from(now - start_time);
        let duration = u128::from(stop_time - start_time);

        match self {
            // The upcast keeps the product exact; elapsed < duration bounds
            // the quotient strictly below `deposit`, so the downcast never
            // truncates.
            Self::Linear => ((u128::from(deposit) * elapsed) / duration) as u64,
        }
    }
}

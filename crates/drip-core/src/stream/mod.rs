//! Funds-over-time stream accounting.
//!
//! A stream locks a fixed token deposit in escrow and vests it toward a
//! recipient over a time window. The [`StreamingLedger`] owns the
//! authoritative table of all streams and answers "what can this address
//! claim right now"; claimable balances are computed from the record and
//! the shared clock, never stored and never rewritten by any background
//! process.
//!
//! # Lifecycle
//!
//! ```text
//! create_stream --> Stream (ACTIVE)
//!      withdraw --> Stream (ACTIVE, withdrawn grows)
//!      withdraw --> Stream (SETTLED) once the full deposit is out
//!        cancel --> Stream (CANCELLED), escrow split by vested share
//! ```
//!
//! # Key invariants
//!
//! - Fixed total supply per stream: sender and recipient balances always
//!   account for the whole deposit, exactly at the window's endpoints and
//!   to within one unit of truncation while vesting is in progress.
//! - `withdrawn_by_recipient` is monotone and never exceeds the vested
//!   amount, concurrent withdrawals included.
//! - Ids are unique and never reused; failed creations record nothing.
//! - Terminal streams reject every mutation and answer every balance query
//!   with zero.

mod error;
mod ledger;
mod math;
mod state;

#[cfg(test)]
mod tests;

pub use error::StreamError;
pub use ledger::{LedgerConfig, LedgerConfigBuilder, LedgerStats, StreamingLedger};
pub use math::VestingCurve;
pub use state::{Stream, StreamId, StreamStatus};

//! Stream records and lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::account::AccountId;

/// Unique handle of a stream.
///
/// Ids are allocated from a monotonically increasing counter starting at 1
/// and are never reused, not even after failed creations (an id is only
/// consumed once validation and escrow both succeed). A raw value of 0
/// therefore never denotes a live stream.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StreamId(u64);

impl StreamId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw numeric value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a stream.
///
/// ```text
/// Active --withdraw(partial)--> Active
/// Active --withdraw(full)-----> Settled
/// Active --cancel-------------> Cancelled
/// ```
///
/// `Settled` and `Cancelled` are terminal: every further mutation fails
/// with `StreamClosed`, and both parties' claimable balances are zero
/// because both sides were paid out in full when the stream closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamStatus {
    /// The stream is vesting; claimable balances shift from sender to
    /// recipient as time passes.
    Active,
    /// The full deposit has been withdrawn by the recipient.
    Settled,
    /// The sender terminated the stream early; each party received its
    /// share as of the cancellation time.
    Cancelled,
}

impl StreamStatus {
    /// Returns `true` for states that accept no further mutation.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Settled | Self::Cancelled)
    }

    /// Returns the string representation used in logs and errors.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Settled => "SETTLED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A time-bound escrow commitment moving a fixed deposit from sender to
/// recipient at a defined rate.
///
/// Records are owned exclusively by the streaming ledger; callers only ever
/// see cloned snapshots. Claimable balances are not stored anywhere: they
/// are computed from the record and the current time, so time passing moves
/// funds without any write occurring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stream {
    /// Unique handle assigned at creation.
    pub id: StreamId,
    /// The party whose escrowed deposit funds the stream.
    pub sender: AccountId,
    /// The party the deposit vests toward. Always differs from `sender`.
    pub recipient: AccountId,
    /// Total amount locked at creation. Immutable and greater than zero.
    pub deposit: u64,
    /// Time vesting begins. Immutable.
    pub start_time: u64,
    /// Time the full deposit has vested. Strictly after `start_time`.
    pub stop_time: u64,
    /// Cumulative amount already paid out to the recipient. Non-decreasing
    /// and never in excess of the currently vested amount.
    pub withdrawn_by_recipient: u64,
    /// Current lifecycle state.
    pub status: StreamStatus,
}

impl Stream {
    /// Deposit not yet paid out to the recipient.
    #[must_use]
    pub const fn remaining_balance(&self) -> u64 {
        self.deposit.saturating_sub(self.withdrawn_by_recipient)
    }

    /// Length of the vesting window.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.stop_time.saturating_sub(self.start_time)
    }
}

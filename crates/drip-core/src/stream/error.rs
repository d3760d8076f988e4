//! Streaming ledger error types.

use thiserror::Error;

use super::state::{StreamId, StreamStatus};
use crate::account::AccountId;
use crate::token::TokenError;

/// Errors that can occur during streaming ledger operations.
///
/// Every variant is a validation failure detected before any state change,
/// so a failed operation always returns to the unchanged prior state. Reads
/// never error: an unknown stream or an uninvolved party simply has a zero
/// balance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum StreamError {
    /// The stop time does not lie strictly after the start time.
    #[error("invalid stream duration: start_time={start_time}, stop_time={stop_time}")]
    InvalidDuration {
        /// The requested start time.
        start_time: u64,
        /// The requested stop time.
        stop_time: u64,
    },

    /// The deposit was zero.
    #[error("stream deposit must be greater than zero")]
    InvalidDeposit,

    /// Sender and recipient were the same party.
    #[error("stream sender and recipient must differ, both were {party}")]
    InvalidParties {
        /// The identity supplied for both sides.
        party: AccountId,
    },

    /// The start time lies before the current time.
    #[error("stream start time {start_time} is earlier than the current time {now}")]
    StartTimeInPast {
        /// The requested start time.
        start_time: u64,
        /// The ledger's current time.
        now: u64,
    },

    /// The caller is not entitled to perform this operation.
    #[error("account {caller} is not authorized to {operation} stream {stream_id}")]
    Unauthorized {
        /// The stream the caller addressed.
        stream_id: StreamId,
        /// The unauthorized caller.
        caller: AccountId,
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// The requested amount was zero or exceeds the claimable balance.
    #[error(
        "withdrawal of {requested} from stream {stream_id} exceeds the claimable balance {available}"
    )]
    InsufficientBalance {
        /// The stream being withdrawn from.
        stream_id: StreamId,
        /// The amount the caller asked for.
        requested: u64,
        /// The amount actually claimable right now.
        available: u64,
    },

    /// The stream is in a terminal state and accepts no further mutation.
    #[error("stream {stream_id} is closed: {status}")]
    StreamClosed {
        /// The stream the caller addressed.
        stream_id: StreamId,
        /// The terminal state the stream is in.
        status: StreamStatus,
    },

    /// No stream with this id exists. Mutating calls only; reads answer
    /// unknown ids with a zero balance.
    #[error("unknown stream: {stream_id}")]
    UnknownStream {
        /// The id that resolved to nothing.
        stream_id: StreamId,
    },

    /// Cancellation is disabled on this ledger.
    #[error("stream cancellation is not supported by this ledger")]
    Unsupported,

    /// The escrow debit or credit against the token ledger failed.
    #[error("escrow transfer failed: {0}")]
    Escrow(#[from] TokenError),
}

//! Coordinator error types.

use thiserror::Error;

use crate::stream::{StreamError, StreamId};

/// Errors that can occur when driving a stream coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CoordinatorError {
    /// A stream is already bound to this coordinator.
    #[error("coordinator already has stream {stream_id} bound")]
    AlreadyConfigured {
        /// The stream bound by the earlier `start_stream` call.
        stream_id: StreamId,
    },

    /// No stream has been bound yet.
    #[error("no stream is bound to this coordinator")]
    Unbound,

    /// The underlying ledger rejected the operation.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

//! Bind-once façade over the streaming ledger.
//!
//! A coordinator stands for one named relationship, such as "the treasury's
//! outgoing stream to its beneficiary", and exposes at most one stream by
//! that relationship rather than by raw id. Binding is a tagged state
//! (`Unbound`/`Bound`), not a nullable field with a sentinel check:
//! [`StreamCoordinator::start_stream`] is only legal while unbound, and the
//! check is atomic under concurrent attempts because the binding lock is
//! held across the ledger call.
//!
//! The coordinator owns no balance math. Every query and mutation is
//! forwarded verbatim to the [`StreamingLedger`] with the bound id.

mod error;

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::account::AccountId;
use crate::stream::{StreamId, StreamingLedger};
use crate::token::TokenLedger;

pub use error::CoordinatorError;

/// Binding state of a coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    /// No stream has been started yet.
    Unbound,
    /// `start_stream` succeeded and bound this id.
    Bound(StreamId),
}

/// Treasury-side façade that opens and tracks a single outgoing stream.
///
/// Holds the account whose token balance funds the stream, a handle to the
/// ledger that owns the stream records, and the one-time binding.
pub struct StreamCoordinator {
    ledger: Arc<StreamingLedger>,
    token: Arc<dyn TokenLedger>,
    account: AccountId,
    binding: Mutex<Binding>,
}

impl StreamCoordinator {
    /// Creates an unbound coordinator streaming from `account`.
    pub fn new(
        ledger: Arc<StreamingLedger>,
        token: Arc<dyn TokenLedger>,
        account: AccountId,
    ) -> Self {
        Self {
            ledger,
            token,
            account,
            binding: Mutex::new(Binding::Unbound),
        }
    }

    /// The account this coordinator streams from.
    #[must_use]
    pub fn account(&self) -> &AccountId {
        &self.account
    }

    /// Starts the coordinator's one stream toward `counterparty`, funding
    /// it with the account's entire token balance and running it from now
    /// for `duration` time units.
    ///
    /// The binding lock is held across the ledger call, so under concurrent
    /// attempts exactly one caller can ever succeed.
    ///
    /// # Errors
    ///
    /// - [`CoordinatorError::AlreadyConfigured`] if a stream is already
    ///   bound.
    /// - [`CoordinatorError::Stream`] for every ledger rejection; an empty
    ///   treasury surfaces as an invalid deposit.
    pub fn start_stream(
        &self,
        duration: u64,
        counterparty: &AccountId,
    ) -> Result<StreamId, CoordinatorError> {
        let mut binding = self
            .binding
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Binding::Bound(stream_id) = *binding {
            return Err(CoordinatorError::AlreadyConfigured { stream_id });
        }

        let deposit = self.token.balance_of(&self.account);
        let id = self.ledger.create_stream_with_duration(
            &self.account,
            counterparty,
            deposit,
            duration,
        )?;
        *binding = Binding::Bound(id);

        tracing::info!(
            stream_id = %id,
            account = %self.account,
            counterparty = %counterparty,
            deposit,
            duration,
            "coordinator bound its outgoing stream"
        );

        Ok(id)
    }

    /// The bound stream id, or `None` before a successful `start_stream`.
    #[must_use]
    pub fn current_stream_id(&self) -> Option<StreamId> {
        match *self
            .binding
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
        {
            Binding::Unbound => None,
            Binding::Bound(id) => Some(id),
        }
    }

    /// Claimable balance of `address` on the bound stream.
    ///
    /// Forwarded verbatim to the ledger. An unbound coordinator answers 0,
    /// the same as any other absent entitlement.
    #[must_use]
    pub fn balance_of(&self, address: &AccountId) -> u64 {
        match self.current_stream_id() {
            Some(id) => self.ledger.balance_of(id, address),
            None => 0,
        }
    }

    /// Withdraws from the bound stream on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::Unbound`] before `start_stream`; otherwise
    /// whatever the ledger returns, unchanged.
    pub fn withdraw(&self, caller: &AccountId, amount: u64) -> Result<(), CoordinatorError> {
        let id = self.current_stream_id().ok_or(CoordinatorError::Unbound)?;
        self.ledger.withdraw(id, caller, amount)?;
        Ok(())
    }

    /// Cancels the bound stream on behalf of `caller`.
    ///
    /// # Errors
    ///
    /// [`CoordinatorError::Unbound`] before `start_stream`; otherwise
    /// whatever the ledger returns, unchanged.
    pub fn cancel(&self, caller: &AccountId) -> Result<(), CoordinatorError> {
        let id = self.current_stream_id().ok_or(CoordinatorError::Unbound)?;
        self.ledger.cancel(id, caller)?;
        Ok(())
    }
}

impl fmt::Debug for StreamCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamCoordinator")
            .field("account", &self.account)
            .field("binding", &self.current_stream_id())
            .finish_non_exhaustive()
    }
}

//! The authoritative stream table.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use super::error::StreamError;
use super::math::VestingCurve;
use super::state::{Stream, StreamId, StreamStatus};
use crate::account::AccountId;
use crate::clock::{Clock, MonotonicClock};
use crate::token::TokenLedger;

/// Configuration for a [`StreamingLedger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Whether a stream may start at exactly the current time.
    ///
    /// Treasury-style callers open streams "from now", so this defaults to
    /// `true`. When `false`, `start_time` must lie strictly in the future.
    pub allow_immediate_start: bool,

    /// Whether senders may cancel active streams.
    ///
    /// When `false`, [`StreamingLedger::cancel`] fails with
    /// [`StreamError::Unsupported`] without touching any state.
    pub cancellation_enabled: bool,

    /// Interpolation applied between start and stop time.
    pub curve: VestingCurve,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            allow_immediate_start: true,
            cancellation_enabled: true,
            curve: VestingCurve::Linear,
        }
    }
}

impl LedgerConfig {
    /// Creates a configuration builder.
    #[must_use]
    pub fn builder() -> LedgerConfigBuilder {
        LedgerConfigBuilder::default()
    }
}

/// Builder for [`LedgerConfig`].
#[derive(Debug, Default, Clone)]
pub struct LedgerConfigBuilder {
    config: LedgerConfig,
}

impl LedgerConfigBuilder {
    /// Sets whether `start_time == now` is accepted at creation.
    #[must_use]
    pub fn allow_immediate_start(mut self, allow: bool) -> Self {
        self.config.allow_immediate_start = allow;
        self
    }

    /// Sets whether senders may cancel active streams.
    #[must_use]
    pub fn cancellation_enabled(mut self, enabled: bool) -> Self {
        self.config.cancellation_enabled = enabled;
        self
    }

    /// Sets the vesting curve.
    #[must_use]
    pub fn curve(mut self, curve: VestingCurve) -> Self {
        self.config.curve = curve;
        self
    }

    /// Finalizes the configuration.
    #[must_use]
    pub fn build(self) -> LedgerConfig {
        self.config
    }
}

/// Point-in-time summary of a ledger's streams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    /// Streams ever created, terminal ones included.
    pub total_streams: usize,
    /// Streams currently vesting or awaiting withdrawal.
    pub active_streams: usize,
    /// Streams whose full deposit was withdrawn.
    pub settled_streams: usize,
    /// Streams terminated early by their sender.
    pub cancelled_streams: usize,
    /// Tokens currently held in escrow for active streams.
    pub escrowed: u64,
}

/// Single source of truth for every stream's funds-over-time accounting.
///
/// The ledger owns the stream table exclusively. Callers hold only
/// [`StreamId`] handles and ask [`balance_of`](Self::balance_of) what an
/// address can claim right now; the answer is a pure function of the stored
/// record and the shared clock, so time moving forward shifts claimable
/// balances without any write occurring.
///
/// # Escrow
///
/// Deposits are backed one-for-one by tokens held under the ledger's escrow
/// account: `create_stream` debits the sender before a record is stored,
/// `withdraw` credits the recipient, and `cancel` splits what remains by
/// vested share. Token transfers happen under the stream-table write lock,
/// after validation and before record mutation, which makes every operation
/// all-or-nothing.
///
/// # Thread safety
///
/// Mutations take the table's write lock and are therefore serialized, per
/// stream and across streams. Reads share the read lock, run concurrently
/// with each other, and observe only fully-applied states. Lock order is
/// always stream table first, token table second; no path acquires them the
/// other way around. Time is read through a monotonic decorator shared by
/// all streams, so no operation ever observes the clock running backwards.
pub struct StreamingLedger {
    streams: RwLock<HashMap<StreamId, Stream>>,
    next_id: AtomicU64,
    clock: MonotonicClock<Arc<dyn Clock>>,
    token: Arc<dyn TokenLedger>,
    escrow: AccountId,
    config: LedgerConfig,
}

impl StreamingLedger {
    /// Creates a ledger with the default configuration.
    ///
    /// `escrow` is the token account deposits are parked under; it should
    /// be an identity nothing else transfers from.
    pub fn new(clock: Arc<dyn Clock>, token: Arc<dyn TokenLedger>, escrow: AccountId) -> Self {
        Self::with_config(clock, token, escrow, LedgerConfig::default())
    }

    /// Creates a ledger with an explicit configuration.
    pub fn with_config(
        clock: Arc<dyn Clock>,
        token: Arc<dyn TokenLedger>,
        escrow: AccountId,
        config: LedgerConfig,
    ) -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            clock: MonotonicClock::new(clock),
            token,
            escrow,
            config,
        }
    }

    /// The account escrowed deposits are held under.
    #[must_use]
    pub fn escrow_account(&self) -> &AccountId {
        &self.escrow
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// The current time as observed by this ledger. Non-decreasing across
    /// calls, whatever the underlying clock does.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.clock.now()
    }

    /// Opens a stream moving `deposit` tokens from `sender` to `recipient`
    /// between `start_time` and `stop_time`.
    ///
    /// The deposit is debited from `sender` into escrow before the record
    /// is stored. Ids are allocated only after validation and escrow both
    /// succeed, so a rejected creation leaves no trace, not even a consumed
    /// id.
    ///
    /// # Errors
    ///
    /// - [`StreamError::InvalidDeposit`] if `deposit` is zero.
    /// - [`StreamError::InvalidParties`] if `sender == recipient`.
    /// - [`StreamError::InvalidDuration`] if `stop_time <= start_time`.
    /// - [`StreamError::StartTimeInPast`] if `start_time` lies before the
    ///   current time (or not strictly after it, when immediate starts are
    ///   disabled).
    /// - [`StreamError::Escrow`] if the sender cannot fund the deposit.
    pub fn create_stream(
        &self,
        sender: &AccountId,
        recipient: &AccountId,
        deposit: u64,
        start_time: u64,
        stop_time: u64,
    ) -> Result<StreamId, StreamError> {
        let now = self.clock.now();
        self.create_stream_at(sender, recipient, deposit, start_time, stop_time, now)
    }

    /// Opens a stream starting now and running for `duration` time units.
    ///
    /// Callers holding only a period never read the clock themselves: the
    /// ledger's shared clock fixes `start_time = now` and
    /// `stop_time = now + duration` in a single observation.
    ///
    /// # Errors
    ///
    /// [`StreamError::InvalidDuration`] if `duration` is zero or runs past
    /// the end of the time axis, plus every error
    /// [`create_stream`](Self::create_stream) returns.
    pub fn create_stream_with_duration(
        &self,
        sender: &AccountId,
        recipient: &AccountId,
        deposit: u64,
        duration: u64,
    ) -> Result<StreamId, StreamError> {
        let now = self.clock.now();
        let stop_time = now
            .checked_add(duration)
            .ok_or(StreamError::InvalidDuration {
                start_time: now,
                stop_time: u64::MAX,
            })?;
        self.create_stream_at(sender, recipient, deposit, now, stop_time, now)
    }

    fn create_stream_at(
        &self,
        sender: &AccountId,
        recipient: &AccountId,
        deposit: u64,
        start_time: u64,
        stop_time: u64,
        now: u64,
    ) -> Result<StreamId, StreamError> {
        if deposit == 0 {
            return Err(StreamError::InvalidDeposit);
        }
        if sender == recipient {
            return Err(StreamError::InvalidParties {
                party: sender.clone(),
            });
        }
        if stop_time <= start_time {
            return Err(StreamError::InvalidDuration {
                start_time,
                stop_time,
            });
        }
        let start_ok = if self.config.allow_immediate_start {
            start_time >= now
        } else {
            start_time > now
        };
        if !start_ok {
            return Err(StreamError::StartTimeInPast { start_time, now });
        }

        let mut streams = self
            .streams
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        // Escrow the deposit first; a failed debit must leave no record and
        // consume no id.
        self.token.transfer(sender, &self.escrow, deposit)?;

        let id = StreamId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        streams.insert(
            id,
            Stream {
                id,
                sender: sender.clone(),
                recipient: recipient.clone(),
                deposit,
                start_time,
                stop_time,
                withdrawn_by_recipient: 0,
                status: StreamStatus::Active,
            },
        );

        tracing::info!(
            stream_id = %id,
            sender = %sender,
            recipient = %recipient,
            deposit,
            start_time,
            stop_time,
            "stream created"
        );

        Ok(id)
    }

    /// Returns the amount `address` could claim from stream `id` right now.
    ///
    /// Read-only and idempotent: repeated calls at the same logical time
    /// return identical values. Absence of entitlement is a zero balance,
    /// never an error; unknown streams, uninvolved parties, and terminal
    /// streams all answer 0.
    ///
    /// The recipient's balance is the vested amount minus what was already
    /// withdrawn; the sender's is the yet-unvested remainder of the
    /// deposit. The recipient side holds the truncated floor of the vesting
    /// quotient and the sender side holds the rounding remainder.
    #[must_use]
    pub fn balance_of(&self, id: StreamId, address: &AccountId) -> u64 {
        let streams = self
            .streams
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(stream) = streams.get(&id) else {
            return 0;
        };
        if stream.status.is_terminal() {
            // Both sides were paid out in full when the stream closed; the
            // frozen final entitlement is zero for everyone.
            return 0;
        }

        let now = self.clock.now();
        let vested =
            self.config
                .curve
                .vested(stream.deposit, stream.start_time, stream.stop_time, now);

        if *address == stream.recipient {
            vested.saturating_sub(stream.withdrawn_by_recipient)
        } else if *address == stream.sender {
            stream.deposit.saturating_sub(vested)
        } else {
            0
        }
    }

    /// Pays `amount` of the vested balance out to the stream's recipient.
    ///
    /// Only the recipient may withdraw. The tokens move from escrow to the
    /// recipient's account before the record is updated; once cumulative
    /// withdrawals reach the full deposit the stream settles.
    ///
    /// # Errors
    ///
    /// - [`StreamError::UnknownStream`] if no stream has this id.
    /// - [`StreamError::StreamClosed`] if the stream already settled or was
    ///   cancelled.
    /// - [`StreamError::Unauthorized`] if `caller` is not the recipient.
    /// - [`StreamError::InsufficientBalance`] unless
    ///   `0 < amount <= balance_of(id, recipient)`.
    pub fn withdraw(
        &self,
        id: StreamId,
        caller: &AccountId,
        amount: u64,
    ) -> Result<(), StreamError> {
        self.apply_withdrawal(id, caller, Some(amount))?;
        Ok(())
    }

    /// Withdraws everything currently claimable by the recipient.
    ///
    /// Returns the amount paid out. The claimable amount is determined and
    /// withdrawn under a single lock acquisition, so no concurrent
    /// withdrawal can slip in between.
    ///
    /// # Errors
    ///
    /// [`StreamError::InsufficientBalance`] when nothing is claimable yet,
    /// plus every error [`withdraw`](Self::withdraw) returns.
    pub fn withdraw_max(&self, id: StreamId, caller: &AccountId) -> Result<u64, StreamError> {
        self.apply_withdrawal(id, caller, None)
    }

    /// Locked withdrawal path shared by `withdraw` and `withdraw_max`.
    /// `request` of `None` means "everything claimable".
    fn apply_withdrawal(
        &self,
        id: StreamId,
        caller: &AccountId,
        request: Option<u64>,
    ) -> Result<u64, StreamError> {
        let mut streams = self
            .streams
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let stream = streams
            .get_mut(&id)
            .ok_or(StreamError::UnknownStream { stream_id: id })?;

        if stream.status.is_terminal() {
            return Err(StreamError::StreamClosed {
                stream_id: id,
                status: stream.status,
            });
        }
        if *caller != stream.recipient {
            return Err(StreamError::Unauthorized {
                stream_id: id,
                caller: caller.clone(),
                operation: "withdraw from",
            });
        }

        let now = self.clock.now();
        let vested =
            self.config
                .curve
                .vested(stream.deposit, stream.start_time, stream.stop_time, now);
        let available = vested.saturating_sub(stream.withdrawn_by_recipient);
        let amount = request.unwrap_or(available);
        if amount == 0 || amount > available {
            return Err(StreamError::InsufficientBalance {
                stream_id: id,
                requested: amount,
                available,
            });
        }

        // Move the tokens first; a failed transfer must leave the record
        // untouched.
        self.token.transfer(&self.escrow, &stream.recipient, amount)?;

        stream.withdrawn_by_recipient += amount;
        if stream.withdrawn_by_recipient == stream.deposit {
            stream.status = StreamStatus::Settled;
            tracing::info!(stream_id = %id, "stream settled");
        }

        tracing::debug!(
            stream_id = %id,
            recipient = %stream.recipient,
            amount,
            withdrawn = stream.withdrawn_by_recipient,
            "withdrawal applied"
        );

        Ok(amount)
    }

    /// Terminates an active stream early, splitting the remaining escrow by
    /// vested share at the moment of cancellation.
    ///
    /// Only the sender may cancel. The recipient keeps what has vested and
    /// was not yet withdrawn; the sender reclaims the rest. The record is
    /// retained for audit, with zero claimable balance for both parties
    /// thereafter.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Unsupported`] when cancellation is disabled.
    /// - [`StreamError::UnknownStream`] if no stream has this id.
    /// - [`StreamError::StreamClosed`] if the stream already settled or was
    ///   cancelled.
    /// - [`StreamError::Unauthorized`] if `caller` is not the sender.
    pub fn cancel(&self, id: StreamId, caller: &AccountId) -> Result<(), StreamError> {
        if !self.config.cancellation_enabled {
            return Err(StreamError::Unsupported);
        }

        let mut streams = self
            .streams
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let stream = streams
            .get_mut(&id)
            .ok_or(StreamError::UnknownStream { stream_id: id })?;

        if stream.status.is_terminal() {
            return Err(StreamError::StreamClosed {
                stream_id: id,
                status: stream.status,
            });
        }
        if *caller != stream.sender {
            return Err(StreamError::Unauthorized {
                stream_id: id,
                caller: caller.clone(),
                operation: "cancel",
            });
        }

        let now = self.clock.now();
        let vested =
            self.config
                .curve
                .vested(stream.deposit, stream.start_time, stream.stop_time, now);
        let recipient_share = vested.saturating_sub(stream.withdrawn_by_recipient);
        let sender_share = stream.deposit.saturating_sub(vested);

        // Escrow holds exactly recipient_share + sender_share for this
        // stream, so neither transfer can fail once validation has passed.
        if recipient_share > 0 {
            self.token
                .transfer(&self.escrow, &stream.recipient, recipient_share)?;
        }
        if sender_share > 0 {
            self.token
                .transfer(&self.escrow, &stream.sender, sender_share)?;
        }

        stream.withdrawn_by_recipient += recipient_share;
        stream.status = StreamStatus::Cancelled;

        tracing::info!(
            stream_id = %id,
            sender = %stream.sender,
            recipient = %stream.recipient,
            recipient_share,
            sender_share,
            "stream cancelled"
        );

        Ok(())
    }

    /// Returns a snapshot of the stream record, if it exists.
    #[must_use]
    pub fn stream(&self, id: StreamId) -> Option<Stream> {
        let streams = self
            .streams
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        streams.get(&id).cloned()
    }

    /// Returns `true` if a stream with this id was ever created.
    #[must_use]
    pub fn stream_exists(&self, id: StreamId) -> bool {
        let streams = self
            .streams
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        streams.contains_key(&id)
    }

    /// Returns the lifecycle state of the stream, if it exists.
    #[must_use]
    pub fn status_of(&self, id: StreamId) -> Option<StreamStatus> {
        let streams = self
            .streams
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        streams.get(&id).map(|stream| stream.status)
    }

    /// Returns a point-in-time summary across all streams.
    #[must_use]
    pub fn stats(&self) -> LedgerStats {
        let streams = self
            .streams
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let mut stats = LedgerStats {
            total_streams: streams.len(),
            ..LedgerStats::default()
        };
        for stream in streams.values() {
            match stream.status {
                StreamStatus::Active => {
                    stats.active_streams += 1;
                    stats.escrowed = stats.escrowed.saturating_add(stream.remaining_balance());
                }
                StreamStatus::Settled => stats.settled_streams += 1,
                StreamStatus::Cancelled => stats.cancelled_streams += 1,
            }
        }
        stats
    }
}

impl fmt::Debug for StreamingLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingLedger")
            .field("escrow", &self.escrow)
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}

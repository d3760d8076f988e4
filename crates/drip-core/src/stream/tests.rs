//! Scenario tests for the streaming ledger: lifecycle, balance endpoints,
//! escrow conservation, and serialization under concurrency.

use std::sync::Arc;

use proptest::prelude::*;

use super::{LedgerConfig, StreamError, StreamId, StreamStatus, StreamingLedger};
use crate::account::AccountId;
use crate::clock::{Clock, ManualClock};
use crate::token::{InMemoryTokenLedger, TokenError, TokenLedger};

// ============================================================================
// Test Helpers
// ============================================================================

const GENESIS: u64 = 1_000;

struct Harness {
    clock: Arc<ManualClock>,
    token: Arc<InMemoryTokenLedger>,
    ledger: Arc<StreamingLedger>,
    sender: AccountId,
    recipient: AccountId,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    fn with_config(config: LedgerConfig) -> Self {
        let clock = Arc::new(ManualClock::new(GENESIS));
        let token = Arc::new(InMemoryTokenLedger::new());
        let clock_dyn: Arc<dyn Clock> = Arc::clone(&clock) as Arc<dyn Clock>;
        let token_dyn: Arc<dyn TokenLedger> = Arc::clone(&token) as Arc<dyn TokenLedger>;
        let ledger = Arc::new(StreamingLedger::with_config(
            clock_dyn,
            token_dyn,
            AccountId::from("stream-escrow"),
            config,
        ));
        Self {
            clock,
            token,
            ledger,
            sender: AccountId::from("treasury"),
            recipient: AccountId::from("beneficiary"),
        }
    }

    /// Mints `deposit` to the sender and opens a stream over `duration`
    /// starting at the current time.
    fn funded_stream(&self, deposit: u64, duration: u64) -> StreamId {
        self.token.mint(&self.sender, deposit).unwrap();
        self.ledger
            .create_stream_with_duration(&self.sender, &self.recipient, deposit, duration)
            .unwrap()
    }

    fn escrow_balance(&self) -> u64 {
        self.token.balance_of(self.ledger.escrow_account())
    }
}

// ============================================================================
// Creation
// ============================================================================

#[test]
fn test_create_stream_assigns_distinct_increasing_ids() {
    let h = Harness::new();
    let first = h.funded_stream(100, 10);
    let second = h.funded_stream(100, 10);
    assert_ne!(first, second);
    assert!(first.as_u64() >= 1);
    assert!(second > first);
}

#[test]
fn test_create_stream_rejects_zero_deposit() {
    let h = Harness::new();
    let err = h
        .ledger
        .create_stream(&h.sender, &h.recipient, 0, GENESIS, GENESIS + 10)
        .unwrap_err();
    assert_eq!(err, StreamError::InvalidDeposit);
}

#[test]
fn test_create_stream_rejects_same_party() {
    let h = Harness::new();
    let err = h
        .ledger
        .create_stream(&h.sender, &h.sender, 100, GENESIS, GENESIS + 10)
        .unwrap_err();
    assert_eq!(
        err,
        StreamError::InvalidParties {
            party: h.sender.clone(),
        }
    );
}

#[test]
fn test_create_stream_rejects_inverted_window_and_records_nothing() {
    let h = Harness::new();
    h.token.mint(&h.sender, 100).unwrap();

    let err = h
        .ledger
        .create_stream(&h.sender, &h.recipient, 100, GENESIS + 10, GENESIS + 10)
        .unwrap_err();
    assert_eq!(
        err,
        StreamError::InvalidDuration {
            start_time: GENESIS + 10,
            stop_time: GENESIS + 10,
        }
    );

    // Nothing was created: the would-be id answers zero, holds no record,
    // and the next successful creation takes it.
    let would_be = StreamId::new(1);
    assert_eq!(h.ledger.balance_of(would_be, &h.sender), 0);
    assert!(!h.ledger.stream_exists(would_be));
    assert_eq!(h.escrow_balance(), 0);

    let id = h
        .ledger
        .create_stream(&h.sender, &h.recipient, 100, GENESIS, GENESIS + 10)
        .unwrap();
    assert_eq!(id, would_be);
}

#[test]
fn test_create_stream_rejects_past_start() {
    let h = Harness::new();
    h.token.mint(&h.sender, 100).unwrap();
    let err = h
        .ledger
        .create_stream(&h.sender, &h.recipient, 100, GENESIS - 1, GENESIS + 10)
        .unwrap_err();
    assert_eq!(
        err,
        StreamError::StartTimeInPast {
            start_time: GENESIS - 1,
            now: GENESIS,
        }
    );
}

#[test]
fn test_immediate_start_accepted_by_default() {
    let h = Harness::new();
    h.token.mint(&h.sender, 100).unwrap();
    let id = h
        .ledger
        .create_stream(&h.sender, &h.recipient, 100, GENESIS, GENESIS + 10)
        .unwrap();
    assert_eq!(h.ledger.status_of(id), Some(StreamStatus::Active));
}

#[test]
fn test_immediate_start_rejected_when_disabled() {
    let config = LedgerConfig::builder().allow_immediate_start(false).build();
    let h = Harness::with_config(config);
    h.token.mint(&h.sender, 100).unwrap();

    let err = h
        .ledger
        .create_stream(&h.sender, &h.recipient, 100, GENESIS, GENESIS + 10)
        .unwrap_err();
    assert_eq!(
        err,
        StreamError::StartTimeInPast {
            start_time: GENESIS,
            now: GENESIS,
        }
    );

    h.ledger
        .create_stream(&h.sender, &h.recipient, 100, GENESIS + 1, GENESIS + 10)
        .unwrap();
}

#[test]
fn test_create_stream_requires_funded_sender() {
    let h = Harness::new();
    h.token.mint(&h.sender, 99).unwrap();

    let err = h
        .ledger
        .create_stream(&h.sender, &h.recipient, 100, GENESIS, GENESIS + 10)
        .unwrap_err();
    assert_eq!(
        err,
        StreamError::Escrow(TokenError::InsufficientFunds {
            account: h.sender.clone(),
            required: 100,
            available: 99,
        })
    );
    assert_eq!(h.ledger.stats().total_streams, 0);
}

#[test]
fn test_create_stream_escrows_the_deposit() {
    let h = Harness::new();
    h.funded_stream(5_000, 100);
    assert_eq!(h.token.balance_of(&h.sender), 0);
    assert_eq!(h.escrow_balance(), 5_000);
}

// ============================================================================
// Balances
// ============================================================================

#[test]
fn test_balance_endpoints_move_the_full_deposit() {
    let h = Harness::new();
    let deposit = 5_000_000;
    let id = h.funded_stream(deposit, 1_000);

    assert_eq!(h.ledger.balance_of(id, &h.sender), deposit);
    assert_eq!(h.ledger.balance_of(id, &h.recipient), 0);

    h.clock.advance(1_000 + 120);

    assert_eq!(h.ledger.balance_of(id, &h.sender), 0);
    assert_eq!(h.ledger.balance_of(id, &h.recipient), deposit);
}

#[test]
fn test_balance_of_unknown_stream_is_zero() {
    let h = Harness::new();
    assert_eq!(h.ledger.balance_of(StreamId::new(42), &h.sender), 0);
}

#[test]
fn test_balance_of_third_party_is_zero() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);
    h.clock.advance(50);
    assert_eq!(h.ledger.balance_of(id, &AccountId::from("bystander")), 0);
}

#[test]
fn test_balance_of_is_idempotent_at_fixed_time() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);
    h.clock.advance(37);

    let first = h.ledger.balance_of(id, &h.recipient);
    for _ in 0..10 {
        assert_eq!(h.ledger.balance_of(id, &h.recipient), first);
        assert_eq!(h.ledger.balance_of(id, &h.sender), 1_000 - first);
    }
}

#[test]
fn test_recipient_balance_is_monotonic_in_time() {
    let h = Harness::new();
    let id = h.funded_stream(9_999, 100);

    let mut previous = h.ledger.balance_of(id, &h.recipient);
    for _ in 0..120 {
        h.clock.advance(1);
        let current = h.ledger.balance_of(id, &h.recipient);
        assert!(current >= previous);
        previous = current;
    }
    assert_eq!(previous, 9_999);
}

// ============================================================================
// Withdrawals
// ============================================================================

#[test]
fn test_withdraw_pays_the_recipient() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);
    h.clock.advance(50);

    h.ledger.withdraw(id, &h.recipient, 300).unwrap();

    assert_eq!(h.token.balance_of(&h.recipient), 300);
    assert_eq!(h.escrow_balance(), 700);
    assert_eq!(h.ledger.balance_of(id, &h.recipient), 200);
    let stream = h.ledger.stream(id).unwrap();
    assert_eq!(stream.withdrawn_by_recipient, 300);
    assert_eq!(stream.remaining_balance(), 700);
}

#[test]
fn test_withdraw_rejects_overdraw_and_changes_nothing() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);
    h.clock.advance(50);

    let err = h.ledger.withdraw(id, &h.recipient, 501).unwrap_err();
    assert_eq!(
        err,
        StreamError::InsufficientBalance {
            stream_id: id,
            requested: 501,
            available: 500,
        }
    );

    assert_eq!(h.ledger.stream(id).unwrap().withdrawn_by_recipient, 0);
    assert_eq!(h.token.balance_of(&h.recipient), 0);
    assert_eq!(h.escrow_balance(), 1_000);
}

#[test]
fn test_withdraw_rejects_zero_amount() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);
    h.clock.advance(50);

    let err = h.ledger.withdraw(id, &h.recipient, 0).unwrap_err();
    assert_eq!(
        err,
        StreamError::InsufficientBalance {
            stream_id: id,
            requested: 0,
            available: 500,
        }
    );
}

#[test]
fn test_withdraw_rejects_non_recipient() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);
    h.clock.advance(50);

    let err = h.ledger.withdraw(id, &h.sender, 100).unwrap_err();
    assert_eq!(
        err,
        StreamError::Unauthorized {
            stream_id: id,
            caller: h.sender.clone(),
            operation: "withdraw from",
        }
    );
}

#[test]
fn test_withdraw_unknown_stream() {
    let h = Harness::new();
    let err = h
        .ledger
        .withdraw(StreamId::new(7), &h.recipient, 1)
        .unwrap_err();
    assert_eq!(
        err,
        StreamError::UnknownStream {
            stream_id: StreamId::new(7),
        }
    );
}

#[test]
fn test_full_withdrawal_settles_the_stream() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);
    h.clock.advance(100);

    h.ledger.withdraw(id, &h.recipient, 1_000).unwrap();
    assert_eq!(h.ledger.status_of(id), Some(StreamStatus::Settled));
    assert_eq!(h.ledger.balance_of(id, &h.recipient), 0);
    assert_eq!(h.ledger.balance_of(id, &h.sender), 0);

    let err = h.ledger.withdraw(id, &h.recipient, 1).unwrap_err();
    assert_eq!(
        err,
        StreamError::StreamClosed {
            stream_id: id,
            status: StreamStatus::Settled,
        }
    );
}

#[test]
fn test_withdraw_max_takes_everything_claimable() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);
    h.clock.advance(60);

    let paid = h.ledger.withdraw_max(id, &h.recipient).unwrap();
    assert_eq!(paid, 600);
    assert_eq!(h.token.balance_of(&h.recipient), 600);
    assert_eq!(h.ledger.balance_of(id, &h.recipient), 0);

    // Nothing claimable right after draining.
    let err = h.ledger.withdraw_max(id, &h.recipient).unwrap_err();
    assert_eq!(
        err,
        StreamError::InsufficientBalance {
            stream_id: id,
            requested: 0,
            available: 0,
        }
    );
}

// ============================================================================
// Cancellation
// ============================================================================

#[test]
fn test_cancel_splits_escrow_by_vested_share() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);
    h.clock.advance(30);

    h.ledger.cancel(id, &h.sender).unwrap();

    assert_eq!(h.ledger.status_of(id), Some(StreamStatus::Cancelled));
    assert_eq!(h.token.balance_of(&h.recipient), 300);
    assert_eq!(h.token.balance_of(&h.sender), 700);
    assert_eq!(h.escrow_balance(), 0);
    assert_eq!(h.ledger.balance_of(id, &h.sender), 0);
    assert_eq!(h.ledger.balance_of(id, &h.recipient), 0);
}

#[test]
fn test_cancel_honors_prior_withdrawals() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);
    h.clock.advance(50);
    h.ledger.withdraw(id, &h.recipient, 200).unwrap();

    h.ledger.cancel(id, &h.sender).unwrap();

    // Recipient had 500 vested, 200 already taken: 300 more on cancel.
    assert_eq!(h.token.balance_of(&h.recipient), 500);
    assert_eq!(h.token.balance_of(&h.sender), 500);
    assert_eq!(h.escrow_balance(), 0);
}

#[test]
fn test_cancel_rejects_non_sender() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);

    let err = h.ledger.cancel(id, &h.recipient).unwrap_err();
    assert_eq!(
        err,
        StreamError::Unauthorized {
            stream_id: id,
            caller: h.recipient.clone(),
            operation: "cancel",
        }
    );
}

#[test]
fn test_cancel_rejects_terminal_stream() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 100);
    h.clock.advance(100);
    h.ledger.withdraw(id, &h.recipient, 1_000).unwrap();

    let err = h.ledger.cancel(id, &h.sender).unwrap_err();
    assert_eq!(
        err,
        StreamError::StreamClosed {
            stream_id: id,
            status: StreamStatus::Settled,
        }
    );
}

#[test]
fn test_cancel_unsupported_when_disabled() {
    let config = LedgerConfig::builder().cancellation_enabled(false).build();
    let h = Harness::with_config(config);
    let id = h.funded_stream(1_000, 100);

    let err = h.ledger.cancel(id, &h.sender).unwrap_err();
    assert_eq!(err, StreamError::Unsupported);
    assert_eq!(h.ledger.status_of(id), Some(StreamStatus::Active));
}

// ============================================================================
// Conservation and Stats
// ============================================================================

#[test]
fn test_escrow_matches_remaining_balances_across_lifecycle() {
    let h = Harness::new();
    let first = h.funded_stream(1_000, 100);
    let second = h.funded_stream(600, 50);
    assert_eq!(h.escrow_balance(), h.ledger.stats().escrowed);

    h.clock.advance(50);
    h.ledger.withdraw(first, &h.recipient, 400).unwrap();
    assert_eq!(h.escrow_balance(), h.ledger.stats().escrowed);

    h.ledger.withdraw(second, &h.recipient, 600).unwrap();
    assert_eq!(h.escrow_balance(), h.ledger.stats().escrowed);

    h.ledger.cancel(first, &h.sender).unwrap();
    assert_eq!(h.escrow_balance(), 0);
    assert_eq!(h.ledger.stats().escrowed, 0);
}

#[test]
fn test_stats_counts_lifecycle_states() {
    let h = Harness::new();
    let settled = h.funded_stream(100, 10);
    let cancelled = h.funded_stream(200, 10);
    let active = h.funded_stream(300, 10);

    h.clock.advance(10);
    h.ledger.withdraw(settled, &h.recipient, 100).unwrap();
    h.ledger.cancel(cancelled, &h.sender).unwrap();

    let stats = h.ledger.stats();
    assert_eq!(stats.total_streams, 3);
    assert_eq!(stats.active_streams, 1);
    assert_eq!(stats.settled_streams, 1);
    assert_eq!(stats.cancelled_streams, 1);
    assert_eq!(stats.escrowed, h.ledger.stream(active).unwrap().deposit);
}

// ============================================================================
// Concurrency
// ============================================================================

#[test]
fn test_concurrent_withdrawals_never_overdraw() {
    let h = Harness::new();
    let id = h.funded_stream(1_000, 1_000);
    h.clock.advance(500); // 500 vested

    let mut handles = Vec::new();
    for _ in 0..4 {
        let ledger = Arc::clone(&h.ledger);
        let recipient = h.recipient.clone();
        handles.push(std::thread::spawn(move || {
            ledger.withdraw(id, &recipient, 200).is_ok()
        }));
    }
    let successes = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|succeeded| *succeeded)
        .count();

    // 500 claimable admits exactly two 200-unit withdrawals.
    assert_eq!(successes, 2);
    let stream = h.ledger.stream(id).unwrap();
    assert_eq!(stream.withdrawn_by_recipient, 400);
    assert_eq!(h.token.balance_of(&h.recipient), 400);
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// The two sides always account for the whole deposit: exactly at the
    /// window endpoints, and to within one unit of truncation in between.
    #[test]
    fn prop_balances_conserve_deposit(
        deposit in 1u64..=10_000_000,
        duration in 1u64..=100_000,
        offset in 0u64..=200_000,
    ) {
        let h = Harness::new();
        let id = h.funded_stream(deposit, duration);
        h.clock.advance(offset);

        let sender_side = h.ledger.balance_of(id, &h.sender);
        let recipient_side = h.ledger.balance_of(id, &h.recipient);
        let sum = sender_side + recipient_side;

        prop_assert!(sum <= deposit);
        prop_assert!(deposit - sum <= 1);
        if offset == 0 || offset >= duration {
            prop_assert_eq!(sum, deposit);
        }
    }
}

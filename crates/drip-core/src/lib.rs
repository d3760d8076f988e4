//! Time-based token streaming.
//!
//! A treasury locks a fixed token deposit in escrow and the claimable
//! balance shifts deterministically from sender to recipient as time
//! elapses. Balances are computed, never stored: each query is a pure
//! function of the stream record and a single shared clock, so funds move
//! with time without any write occurring.
//!
//! # Components
//!
//! - [`stream::StreamingLedger`]: single source of truth for every
//!   stream's funds-over-time accounting. Creation, balance queries,
//!   withdrawals, cancellation.
//! - [`coordinator::StreamCoordinator`]: bind-once façade a treasury uses
//!   to open exactly one outgoing stream and address it by relationship
//!   rather than raw id.
//! - [`token::TokenLedger`]: the token accounting capability backing every
//!   deposit with an escrow debit and every withdrawal with a credit.
//! - [`clock::Clock`]: the single shared time source. The ledger reads it
//!   through a monotonic decorator, so no operation ever observes time
//!   running backwards.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use drip_core::account::AccountId;
//! use drip_core::clock::{Clock, ManualClock};
//! use drip_core::coordinator::StreamCoordinator;
//! use drip_core::stream::StreamingLedger;
//! use drip_core::token::{InMemoryTokenLedger, TokenLedger};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let clock = Arc::new(ManualClock::new(0));
//! let token = Arc::new(InMemoryTokenLedger::new());
//! let ledger = Arc::new(StreamingLedger::new(
//!     Arc::clone(&clock) as Arc<dyn Clock>,
//!     Arc::clone(&token) as Arc<dyn TokenLedger>,
//!     AccountId::from("escrow"),
//! ));
//!
//! let treasury = AccountId::from("treasury");
//! let beneficiary = AccountId::from("beneficiary");
//! token.mint(&treasury, 5_000_000)?;
//!
//! let coordinator =
//!     StreamCoordinator::new(Arc::clone(&ledger), Arc::clone(&token) as Arc<dyn TokenLedger>, treasury.clone());
//! let id = coordinator.start_stream(1_000, &beneficiary)?;
//!
//! // Nothing has vested yet; the whole deposit is still the sender's.
//! assert_eq!(ledger.balance_of(id, &treasury), 5_000_000);
//! assert_eq!(ledger.balance_of(id, &beneficiary), 0);
//!
//! // Past the end of the window the deposit belongs to the recipient.
//! clock.advance(1_000 + 120);
//! assert_eq!(ledger.balance_of(id, &treasury), 0);
//! assert_eq!(ledger.balance_of(id, &beneficiary), 5_000_000);
//! # Ok(())
//! # }
//! ```

pub mod account;
pub mod clock;
pub mod coordinator;
pub mod stream;
pub mod token;

pub use account::AccountId;
pub use coordinator::{CoordinatorError, StreamCoordinator};
pub use stream::{
    LedgerConfig, LedgerConfigBuilder, LedgerStats, Stream, StreamError, StreamId, StreamStatus,
    StreamingLedger, VestingCurve,
};
pub use token::{InMemoryTokenLedger, TokenError, TokenLedger};

//! Token balance accounting.
//!
//! The streaming ledger consumes token accounting as a capability: every
//! stream deposit is backed by an escrow debit, and every withdrawal
//! triggers a credit transfer to the recipient. [`TokenLedger`] is that
//! capability; [`InMemoryTokenLedger`] is the reference implementation
//! backing the test suite and any single-process deployment.
//!
//! The token table and the stream table are independently-owned stores.
//! They interact only through explicit [`TokenLedger::transfer`] calls, so
//! each side's invariants stay locally checkable. One ledger instance
//! accounts for one token; streams in several tokens would use several
//! ledger instances.

mod error;

use std::collections::HashMap;
use std::sync::RwLock;

use crate::account::AccountId;

pub use error::TokenError;

/// Token accounting capability consumed by the streaming ledger.
///
/// Implementations must apply each operation atomically: a failed call
/// leaves every balance unchanged, and concurrent calls must not observe
/// half-applied transfers.
pub trait TokenLedger: Send + Sync {
    /// Credits `amount` freshly minted tokens to `to`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::ZeroAmount`] if `amount` is zero.
    /// - [`TokenError::BalanceOverflow`] if the credit would overflow the
    ///   receiving balance.
    fn mint(&self, to: &AccountId, amount: u64) -> Result<(), TokenError>;

    /// Moves `amount` tokens from `from` to `to`.
    ///
    /// # Errors
    ///
    /// - [`TokenError::ZeroAmount`] if `amount` is zero.
    /// - [`TokenError::InsufficientFunds`] if `from` holds less than
    ///   `amount`.
    /// - [`TokenError::BalanceOverflow`] if the credit would overflow the
    ///   receiving balance.
    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> Result<(), TokenError>;

    /// Returns the balance held by `account`. Unknown accounts hold zero.
    fn balance_of(&self, account: &AccountId) -> u64;
}

/// In-memory token ledger.
///
/// Thread-safe through an `RwLock` over the balance table: reads run
/// concurrently, writes are serialized, and each write validates fully
/// before touching either balance.
#[derive(Debug, Default)]
pub struct InMemoryTokenLedger {
    balances: RwLock<HashMap<AccountId, u64>>,
}

impl InMemoryTokenLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sum of all balances, saturating at `u64::MAX`.
    #[must_use]
    pub fn total_supply(&self) -> u64 {
        let balances = self
            .balances
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        balances
            .values()
            .fold(0u64, |total, balance| total.saturating_add(*balance))
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn mint(&self, to: &AccountId, amount: u64) -> Result<(), TokenError> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }

        let mut balances = self
            .balances
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let balance = balances.entry(to.clone()).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| TokenError::BalanceOverflow {
                account: to.clone(),
            })?;

        tracing::debug!(account = %to, amount, "tokens minted");
        Ok(())
    }

    fn transfer(&self, from: &AccountId, to: &AccountId, amount: u64) -> Result<(), TokenError> {
        if amount == 0 {
            return Err(TokenError::ZeroAmount);
        }

        let mut balances = self
            .balances
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let available = balances.get(from).copied().unwrap_or(0);
        if available < amount {
            return Err(TokenError::InsufficientFunds {
                account: from.clone(),
                required: amount,
                available,
            });
        }

        // A self-transfer is a funded no-op.
        if from == to {
            return Ok(());
        }

        // Compute both sides before writing either, so an overflowing
        // credit rejects the transfer with the debit still unapplied.
        let credited = balances
            .get(to)
            .copied()
            .unwrap_or(0)
            .checked_add(amount)
            .ok_or_else(|| TokenError::BalanceOverflow { account: to.clone() })?;

        balances.insert(from.clone(), available - amount);
        balances.insert(to.clone(), credited);

        tracing::debug!(from = %from, to = %to, amount, "tokens transferred");
        Ok(())
    }

    fn balance_of(&self, account: &AccountId) -> u64 {
        let balances = self
            .balances
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        balances.get(account).copied().unwrap_or(0)
    }
}

//! Token ledger error types.

use thiserror::Error;

use crate::account::AccountId;

/// Errors that can occur during token ledger operations.
///
/// Every failure is detected before any balance changes; a rejected
/// operation leaves the table exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum TokenError {
    /// The debited account does not hold enough tokens.
    #[error("account {account} holds {available} tokens but {required} are required")]
    InsufficientFunds {
        /// The account being debited.
        account: AccountId,
        /// The amount the operation needs.
        required: u64,
        /// The amount actually held.
        available: u64,
    },

    /// Crediting the account would overflow its balance.
    #[error("crediting account {account} would overflow its balance")]
    BalanceOverflow {
        /// The account being credited.
        account: AccountId,
    },

    /// The operation amount was zero.
    #[error("token amount must be greater than zero")]
    ZeroAmount,
}

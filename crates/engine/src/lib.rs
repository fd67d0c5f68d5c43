//! Balance-ledger engine.
//!
//! Accounts keep a cached balance that always equals the signed sum of the
//! transactions booked on them. Every mutation goes through [`Engine`],
//! which validates ownership, computes a [`DeltaPlan`], writes the rows and
//! applies the deltas to the locked accounts inside one database transaction.

pub use accounts::{Account, AccountKind};
pub use budgets::{Budget, BudgetTarget};
pub use categories::{Category, Direction};
pub use commands::{
    BudgetCmd, TransactionCmd, TransferCmd, UpdateAccountCmd, UpdateBudgetCmd, UpdateCategoryCmd,
    UpdateTransactionCmd,
};
pub use delta::{BalanceDelta, DeltaPlan, LedgerState, effect};
pub use error::EngineError;
pub use money::MoneyCents;
pub use ops::{BalanceDrift, Engine, EngineBuilder, TransactionListFilter};
pub use transactions::{
    AppliedUpdate, DeletedTransactions, Transaction, TransferCreated, TransferLink, TransferRole,
};

pub mod accounts;
pub mod budgets;
pub mod categories;
mod commands;
mod delta;
mod error;
mod money;
mod ops;
pub mod transactions;
mod transfer;
pub mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

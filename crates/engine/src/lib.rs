//! Core engine of a personal finance tracker.
//!
//! Users record income/expense/saving transactions against categories, and
//! may direct saving transactions toward named goals with a target amount.
//! The engine owns the transaction records, the goals' allocated progress,
//! and the savings log audit trail, and keeps them mutually consistent: a
//! goal's progress never exceeds its target and always equals the sum of the
//! savings logs pointing at it. Every write runs inside a single database
//! transaction so no partial state is ever observable.
//!
//! HTTP routing, authentication, and rendering live in embedding
//! applications; they call into [`Engine`] with an explicit owner
//! identifier.

pub use categories::{Category, CategoryKind};
pub use commands::{CreateGoalCmd, CreateTransactionCmd, UpdateGoalCmd, UpdateTransactionCmd};
pub use error::EngineError;
pub use goals::Goal;
pub use money::MoneyCents;
pub use ops::{Engine, EngineBuilder, GoalReconciliation, TransactionListFilter};
pub use savings_logs::SavingsLog;
pub use transactions::Transaction;

mod categories;
mod commands;
mod error;
mod goals;
mod money;
mod ops;
mod savings_logs;
mod transactions;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

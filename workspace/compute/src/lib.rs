//! Ledger core: stores, recurring payment reconciliation and the services
//! the API and CLI call into.

pub mod batch;
pub mod budgets;
pub mod clock;
pub mod error;
pub mod expenses;
pub mod guard;
pub mod locks;
pub mod month;
pub mod recurring;
pub mod reconcile;
pub mod scanner;
pub mod store;
pub mod validation;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{process_all, BatchFailure, BatchSummary};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{LedgerError, Result};
pub use locks::BudgetLocks;
pub use month::Month;
pub use reconcile::{ReconcileOutcome, Reconciler};
pub use store::{DatabaseStore, LedgerStore, MemoryStore};

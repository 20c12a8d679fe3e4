//! SeaORM entities for the expense tracker.
//!
//! Materialized expenses point back at their recurring payment through
//! `recurring_payment_id` + `occurrence_date`, without a database-level
//! relation, so removing a payment never touches its history.

pub mod budget;
pub mod expense;
pub mod recurring_payment;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::budget::Entity as Budget;
    pub use super::expense::Entity as Expense;
    pub use super::recurring_payment::Entity as RecurringPayment;
}

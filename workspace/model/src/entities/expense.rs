use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// A single dated expense.
/// Entered by the user directly or materialized from a recurring payment.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "expenses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub description: String,
    pub category: String,
    /// Always positive, two fractional digits.
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub created_at: NaiveDateTime,
    /// The recurring payment this expense was materialized from, if any.
    /// Deliberately not a foreign key: deleting the payment keeps its expenses.
    pub recurring_payment_id: Option<i32>,
    /// The occurrence of `recurring_payment_id` this expense stands for.
    pub occurrence_date: Option<NaiveDate>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Returns true if this expense materializes `occurrence` of the given payment.
    pub fn materializes(&self, recurring_payment_id: i32, occurrence: NaiveDate) -> bool {
        self.recurring_payment_id == Some(recurring_payment_id)
            && self.occurrence_date == Some(occurrence)
    }
}

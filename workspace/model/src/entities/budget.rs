use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

/// Monthly spending limit for one category.
///
/// At most one budget exists per (category, month); this is kept by the
/// upsert in the budget service, not by a unique index.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub category: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub limit: Decimal,
    /// Calendar month in `YYYY-MM` form.
    pub month: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

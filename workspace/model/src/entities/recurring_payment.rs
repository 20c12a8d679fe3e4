use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;

pub mod schedule;

pub use schedule::{occurrences, Occurrences};

/// How often a recurring payment falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(7))")]
pub enum Frequency {
    #[sea_orm(string_value = "weekly")]
    Weekly,
    #[sea_orm(string_value = "monthly")]
    Monthly,
    #[sea_orm(string_value = "yearly")]
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown frequency '{0}', expected one of: weekly, monthly, yearly")]
pub struct UnknownFrequency(pub String);

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(UnknownFrequency(s.to_string())),
        }
    }
}

/// Active flag persisted as the text `"true"` / `"false"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(5))")]
pub enum ActiveFlag {
    #[sea_orm(string_value = "true")]
    Active,
    #[sea_orm(string_value = "false")]
    Paused,
}

impl From<bool> for ActiveFlag {
    fn from(active: bool) -> Self {
        if active { ActiveFlag::Active } else { ActiveFlag::Paused }
    }
}

impl From<ActiveFlag> for bool {
    fn from(flag: ActiveFlag) -> Self {
        flag == ActiveFlag::Active
    }
}

/// A payment that repeats on a schedule (rent, subscriptions, ...).
///
/// `next_due_date` is the reconciliation cursor: every occurrence before it
/// has been materialized as an expense, the cursor itself has not.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub description: String,
    pub category: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub frequency: Frequency,
    /// The date of the first occurrence.
    pub start_date: NaiveDate,
    pub next_due_date: NaiveDate,
    pub is_active: ActiveFlag,
    pub created_at: NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_active(&self) -> bool {
        self.is_active.into()
    }

    /// All occurrences from `start_date` through `until`, inclusive.
    pub fn occurrences_until(&self, until: NaiveDate) -> Occurrences {
        occurrences(self.frequency, self.start_date, until)
    }
}

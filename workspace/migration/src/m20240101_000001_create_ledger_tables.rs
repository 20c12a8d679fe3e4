use model::entities::prelude::*;
use model::entities::{budget, expense, recurring_payment};
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Expense)
                    .if_not_exists()
                    .col(pk_auto(expense::Column::Id))
                    .col(string(expense::Column::Description).string_len(100))
                    .col(string(expense::Column::Category))
                    .col(decimal(expense::Column::Amount).decimal_len(12, 2))
                    .col(date(expense::Column::Date))
                    .col(date_time(expense::Column::CreatedAt))
                    .col(integer_null(expense::Column::RecurringPaymentId))
                    .col(date_null(expense::Column::OccurrenceDate))
                    .to_owned(),
            )
            .await?;

        // Ownership lookup used by the duplicate guard
        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_recurring_occurrence")
                    .table(Expense)
                    .col(expense::Column::RecurringPaymentId)
                    .col(expense::Column::OccurrenceDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_expenses_category_date")
                    .table(Expense)
                    .col(expense::Column::Category)
                    .col(expense::Column::Date)
                    .to_owned(),
            )
            .await?;

        // No unique (category, month) index: the upsert keeps budgets unique
        manager
            .create_table(
                Table::create()
                    .table(Budget)
                    .if_not_exists()
                    .col(pk_auto(budget::Column::Id))
                    .col(string(budget::Column::Category))
                    .col(decimal(budget::Column::Limit).decimal_len(12, 2))
                    .col(string(budget::Column::Month).string_len(7))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RecurringPayment)
                    .if_not_exists()
                    .col(pk_auto(recurring_payment::Column::Id))
                    .col(string(recurring_payment::Column::Description))
                    .col(string(recurring_payment::Column::Category))
                    .col(decimal(recurring_payment::Column::Amount).decimal_len(12, 2))
                    .col(string(recurring_payment::Column::Frequency).string_len(7))
                    .col(date(recurring_payment::Column::StartDate))
                    .col(date(recurring_payment::Column::NextDueDate))
                    .col(
                        string(recurring_payment::Column::IsActive)
                            .string_len(5)
                            .default("true"),
                    )
                    .col(date_time(recurring_payment::Column::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_recurring_payments_due")
                    .table(RecurringPayment)
                    .col(recurring_payment::Column::IsActive)
                    .col(recurring_payment::Column::NextDueDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RecurringPayment).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Budget).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Expense).to_owned())
            .await?;

        Ok(())
    }
}

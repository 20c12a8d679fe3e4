//! Background task that materializes due recurring payments on a timer.

use compute::{process_all, BatchSummary};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::schemas::AppState;

/// One processing pass at the state's current time.
pub async fn run_due_payments(state: &AppState) -> compute::Result<BatchSummary> {
    let summary = process_all(&state.reconciler, state.clock.now()).await?;
    if !summary.created_expenses.is_empty() {
        state.invalidate_overviews();
    }
    Ok(summary)
}

/// Runs [`run_due_payments`] every `every`, starting immediately.
pub fn spawn_recurring_processor(state: AppState, every: Duration) -> JoinHandle<()> {
    info!("Processing recurring payments every {}s", every.as_secs());
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            match run_due_payments(&state).await {
                Ok(summary) if summary.is_empty() => debug!("No recurring payments due"),
                Ok(summary) => info!(
                    "Processed {} recurring payments, {} expenses created, {} failures",
                    summary.processed_count,
                    summary.created_expenses.len(),
                    summary.failures.len()
                ),
                Err(e) => error!("Recurring payment processing failed: {}", e),
            }
        }
    })
}

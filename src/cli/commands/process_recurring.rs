use anyhow::Result;
use chrono::NaiveDateTime;
use common::BatchSummaryDto;
use compute::{process_all, Clock, DatabaseStore, Reconciler, SystemClock};
use std::sync::Arc;
use tracing::{info, trace, warn};

use crate::config::{connect_database, should_run_migrations};

/// One batch run against the database, summary printed to stdout as JSON.
pub async fn process_recurring(database_url: &str, now: Option<NaiveDateTime>) -> Result<()> {
    trace!("Entering process_recurring function");
    let now = now.unwrap_or_else(|| SystemClock.now());
    info!("Processing due recurring payments as of {}", now);

    let db = connect_database(database_url, should_run_migrations(database_url, false)).await?;
    let reconciler = Reconciler::new(Arc::new(DatabaseStore::new(db)));
    let summary = process_all(&reconciler, now).await?;

    if !summary.failures.is_empty() {
        warn!("{} recurring payments could not be processed", summary.failures.len());
    }
    info!(
        "Processed {} recurring payments, {} expenses created",
        summary.processed_count,
        summary.created_expenses.len()
    );

    println!("{}", serde_json::to_string_pretty(&BatchSummaryDto::from(summary))?);
    Ok(())
}

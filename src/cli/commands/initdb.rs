use anyhow::Result;
use tracing::{info, trace};

use crate::config::connect_database;

pub async fn init_database(database_url: &str) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");

    let db = connect_database(database_url, true).await?;
    db.ping().await?;

    info!("Database initialization completed successfully!");
    Ok(())
}

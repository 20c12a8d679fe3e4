use anyhow::Result;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace};

use crate::config::{initialize_app_state, StoreBackend};
use crate::processor::spawn_recurring_processor;
use crate::router::create_router;

#[derive(Debug, Clone)]
pub struct ServeOptions {
    pub database_url: String,
    pub bind_address: String,
    pub store: StoreBackend,
    pub process_interval_secs: u64,
    pub run_migrations: bool,
}

pub async fn serve(options: ServeOptions) -> Result<()> {
    trace!("Entering serve function");
    info!("Spendwise application starting up");
    debug!("Serve options: {:?}", options);

    // Initialize application state
    let state = match initialize_app_state(options.store, &options.database_url, options.run_migrations).await {
        Ok(state) => {
            debug!("Application state initialized successfully");
            state
        }
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    // Background processing of due recurring payments
    let processor = if options.process_interval_secs > 0 {
        Some(spawn_recurring_processor(
            state.clone(),
            Duration::from_secs(options.process_interval_secs),
        ))
    } else {
        info!("Periodic recurring payment processing disabled");
        None
    };

    let app = create_router(state);
    debug!("Router created successfully");

    // Start server
    info!("Starting server on {}", options.bind_address);
    let listener = match TcpListener::bind(&options.bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", options.bind_address, e);
            return Err(e.into());
        }
    };

    info!("Spendwise API server running on http://{}", options.bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", options.bind_address);

    let served = axum::serve(listener, app).await;
    if let Some(processor) = processor {
        processor.abort();
    }
    if let Err(e) = served {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}

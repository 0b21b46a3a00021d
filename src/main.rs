//! # Publisher Outreach Service
//!
//! Backend for the client-success dashboard that tracks outreach to
//! job-board publishers.
//!
//! ## Responsibilities
//!
//! 1. **Notifications**: announce new Clients, Campaigns and Job Groups
//! 2. **Reminders**: follow up on notifications left unanswered
//! 3. **Recommendations**: request and review bid/budget proposals
//! 4. **Allocations**: split entity budgets and bids across publishers
//!
//! ## Architecture
//!
//! - Axum handles HTTP routing and request/response lifecycle
//! - Records live in memory, loaded from a seed document at startup
//! - Outbound mail and publisher calls are simulated with a fixed delay
//! - The user's instance/client selection is persisted to a JSON file

use std::sync::Arc;

use tracing::info;

use publisher_outreach::config::AppConfig;
use publisher_outreach::preferences::{resolve, FilePreferenceStore, PreferenceStore};
use publisher_outreach::state::AppState;
use publisher_outreach::store::Store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "publisher_outreach=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting publisher outreach service");

    let config = AppConfig::from_env();

    let store = Store::load(&config.seed_data_path).await?;

    // Preferences are read once at startup and rewritten on every change.
    let preferences = Arc::new(FilePreferenceStore::new(config.preferences_path.clone()));
    let saved = preferences.load().await;
    let resolved = resolve(&saved, &store);
    info!(
        "Active instance: {:?} with {} selected clients",
        resolved.selected_instance_id,
        resolved.selected_client_ids.len()
    );

    let state = AppState::new(store, preferences, config.simulated_delay);
    let app = publisher_outreach::create_app(state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

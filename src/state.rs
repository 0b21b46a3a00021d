//! Shared application state handed to every route through an Axum
//! `Extension`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;

use crate::preferences::PreferenceStore;
use crate::store::Store;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<Store>>,
    pub preferences: Arc<dyn PreferenceStore>,
    pub simulated_delay: Duration,
}

impl AppState {
    pub fn new(store: Store, preferences: Arc<dyn PreferenceStore>, simulated_delay: Duration) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            preferences,
            simulated_delay,
        }
    }

    /// Stands in for the round trip to the mail and publisher APIs.
    pub async fn simulate_network(&self) {
        if !self.simulated_delay.is_zero() {
            tokio::time::sleep(self.simulated_delay).await;
        }
    }
}

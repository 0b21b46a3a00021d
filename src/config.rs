//! Runtime configuration read from the environment.
//!
//! `main` loads a `.env` file first (via `dotenvy`), so every setting can
//! live there during local development.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_SEED_DATA_PATH: &str = "data/seed.json";
const DEFAULT_PREFERENCES_PATH: &str = "user_preferences.json";
const DEFAULT_SIMULATED_DELAY_MS: u64 = 800;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub seed_data_path: PathBuf,
    pub preferences_path: PathBuf,
    /// Artificial latency applied to every simulated outbound call.
    pub simulated_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            seed_data_path: PathBuf::from(DEFAULT_SEED_DATA_PATH),
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_PATH),
            simulated_delay: Duration::from_millis(DEFAULT_SIMULATED_DELAY_MS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let simulated_delay = match lookup("SIMULATED_DELAY_MS") {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) => Duration::from_millis(ms),
                Err(_) => {
                    warn!("Ignoring invalid SIMULATED_DELAY_MS '{}'", raw);
                    defaults.simulated_delay
                }
            },
            None => defaults.simulated_delay,
        };

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            seed_data_path: lookup("SEED_DATA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.seed_data_path),
            preferences_path: lookup("PREFERENCES_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.preferences_path),
            simulated_delay,
        }
    }
}

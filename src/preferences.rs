//! # User Preferences
//!
//! The dashboard remembers which instance and which of its clients were
//! last selected. The document lives under the `userPreferences` key and is
//! rewritten on every change. A missing or unreadable document is never an
//! error: it simply means "no preferences", and [`resolve`] then falls back
//! to the first instance with all of its clients selected.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::store::Store;

pub const PREFERENCES_KEY: &str = "userPreferences";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[serde(default)]
    pub selected_instance_id: Option<String>,
    #[serde(default)]
    pub selected_client_ids: Vec<String>,
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Returns the saved preferences, or defaults when none are usable.
    async fn load(&self) -> UserPreferences;

    async fn save(&self, preferences: &UserPreferences) -> AppResult<()>;
}

/// Extracts the preferences from a stored document, treating anything
/// malformed as absent.
fn parse_document(raw: &str) -> UserPreferences {
    let document: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring malformed preferences document: {}", e);
            return UserPreferences::default();
        }
    };

    let Some(entry) = document.get(PREFERENCES_KEY) else {
        debug!("Preferences document has no '{}' entry", PREFERENCES_KEY);
        return UserPreferences::default();
    };

    serde_json::from_value(entry.clone()).unwrap_or_else(|e| {
        warn!("Ignoring malformed '{}' value: {}", PREFERENCES_KEY, e);
        UserPreferences::default()
    })
}

/// Preferences persisted as a JSON document on disk.
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PreferenceStore for FilePreferenceStore {
    async fn load(&self) -> UserPreferences {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => parse_document(&raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No preferences file at {}", self.path.display());
                UserPreferences::default()
            }
            Err(e) => {
                warn!("Failed to read preferences from {}: {}", self.path.display(), e);
                UserPreferences::default()
            }
        }
    }

    async fn save(&self, preferences: &UserPreferences) -> AppResult<()> {
        let mut document = serde_json::Map::new();
        document.insert(PREFERENCES_KEY.to_string(), serde_json::to_value(preferences)?);
        let body = serde_json::to_vec_pretty(&document)?;

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!("Saved preferences to {}", self.path.display());
        Ok(())
    }
}

/// Keeps preferences in process memory only.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    saved: Mutex<Option<UserPreferences>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preferences(preferences: UserPreferences) -> Self {
        Self {
            saved: Mutex::new(Some(preferences)),
        }
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn load(&self) -> UserPreferences {
        self.saved.lock().await.clone().unwrap_or_default()
    }

    async fn save(&self, preferences: &UserPreferences) -> AppResult<()> {
        *self.saved.lock().await = Some(preferences.clone());
        Ok(())
    }
}

/// Reconciles saved preferences with the records actually available.
///
/// An unknown or missing instance falls back to the first instance with all
/// of its clients selected. Client ids outside the chosen instance are
/// dropped.
pub fn resolve(preferences: &UserPreferences, store: &Store) -> UserPreferences {
    if let Some(instance_id) = preferences
        .selected_instance_id
        .as_deref()
        .filter(|id| store.instance_exists(id))
    {
        let selected_client_ids = preferences
            .selected_client_ids
            .iter()
            .filter(|id| store.clients_for_instance(instance_id).any(|c| &c.id == *id))
            .cloned()
            .collect();

        return UserPreferences {
            selected_instance_id: Some(instance_id.to_string()),
            selected_client_ids,
        };
    }

    match store.instances.first() {
        Some(instance) => UserPreferences {
            selected_instance_id: Some(instance.id.clone()),
            selected_client_ids: store
                .clients_for_instance(&instance.id)
                .map(|c| c.id.clone())
                .collect(),
        },
        None => UserPreferences::default(),
    }
}

/// Rejects an update naming an instance or client that does not exist.
pub fn validate(preferences: &UserPreferences, store: &Store) -> AppResult<()> {
    let Some(instance_id) = preferences.selected_instance_id.as_deref() else {
        if preferences.selected_client_ids.is_empty() {
            return Ok(());
        }
        return Err(AppError::Validation(
            "clients cannot be selected without an instance".to_string(),
        ));
    };

    if !store.instance_exists(instance_id) {
        return Err(AppError::Validation(format!("unknown instance '{}'", instance_id)));
    }

    if let Some(stray) = preferences
        .selected_client_ids
        .iter()
        .find(|id| !store.clients_for_instance(instance_id).any(|c| &c.id == *id))
    {
        return Err(AppError::Validation(format!(
            "client '{}' does not belong to instance '{}'",
            stray, instance_id
        )));
    }

    Ok(())
}

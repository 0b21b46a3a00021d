//! In-memory record store.
//!
//! Holds every record the dashboard works with, loaded once from a seed
//! document. Lookups return `AppError::NotFound` so handlers can bubble
//! them with `?`.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{
    Campaign, Client, EmailNotification, EntityMetrics, EntityType, Instance, JobGroup, Publisher,
    Recommendation,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    #[serde(default)]
    pub instances: Vec<Instance>,
    #[serde(default)]
    pub clients: Vec<Client>,
    #[serde(default)]
    pub campaigns: Vec<Campaign>,
    #[serde(default)]
    pub job_groups: Vec<JobGroup>,
    #[serde(default)]
    pub publishers: Vec<Publisher>,
    #[serde(default)]
    pub notifications: Vec<EmailNotification>,
    #[serde(default)]
    pub recommendations: Vec<Recommendation>,
}

/// Name and aggregate metrics of a Client, Campaign or JobGroup.
#[derive(Debug, Clone)]
pub struct EntityRef {
    pub entity_type: EntityType,
    pub id: String,
    pub name: String,
    pub metrics: Option<EntityMetrics>,
}

impl Store {
    pub fn from_json(raw: &str) -> AppResult<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Reads the seed document at `path`.
    pub async fn load(path: &Path) -> AppResult<Self> {
        let raw = tokio::fs::read_to_string(path).await?;
        let store = Self::from_json(&raw)?;
        info!(
            "Loaded seed data from {}: {} notifications, {} recommendations, {} publishers",
            path.display(),
            store.notifications.len(),
            store.recommendations.len(),
            store.publishers.len()
        );
        Ok(store)
    }

    pub fn notification(&self, id: &str) -> AppResult<&EmailNotification> {
        self.notifications
            .iter()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NotFound(format!("notification {}", id)))
    }

    pub fn notification_mut(&mut self, id: &str) -> AppResult<&mut EmailNotification> {
        self.notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NotFound(format!("notification {}", id)))
    }

    pub fn recommendation(&self, id: &str) -> AppResult<&Recommendation> {
        self.recommendations
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("recommendation {}", id)))
    }

    pub fn recommendation_mut(&mut self, id: &str) -> AppResult<&mut Recommendation> {
        self.recommendations
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::NotFound(format!("recommendation {}", id)))
    }

    pub fn publisher(&self, id: &str) -> AppResult<&Publisher> {
        self.publishers
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("publisher {}", id)))
    }

    pub fn entity(&self, entity_type: EntityType, id: &str) -> AppResult<EntityRef> {
        let found = match entity_type {
            EntityType::Client => self
                .clients
                .iter()
                .find(|c| c.id == id)
                .map(|c| (c.name.clone(), c.metrics)),
            EntityType::Campaign => self
                .campaigns
                .iter()
                .find(|c| c.id == id)
                .map(|c| (c.name.clone(), c.metrics)),
            EntityType::JobGroup => self
                .job_groups
                .iter()
                .find(|j| j.id == id)
                .map(|j| (j.name.clone(), j.metrics)),
        };

        let (name, metrics) = found
            .ok_or_else(|| AppError::NotFound(format!("{} {}", entity_type.as_str(), id)))?;

        Ok(EntityRef {
            entity_type,
            id: id.to_string(),
            name,
            metrics,
        })
    }

    pub fn instance_exists(&self, id: &str) -> bool {
        self.instances.iter().any(|i| i.id == id)
    }

    pub fn clients_for_instance<'a>(&'a self, instance_id: &'a str) -> impl Iterator<Item = &'a Client> + 'a {
        self.clients.iter().filter(move |c| c.instance_id == instance_id)
    }
}

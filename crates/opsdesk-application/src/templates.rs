//! Response template management and the recent-activity list.
//!
//! Both lists live behind the injected [`KeyValueStore`] capability
//! instead of global browser storage, so tests run against the in-memory
//! store and the shipped console uses the file-backed one.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use opsdesk_core::error::{OpsdeskError, Result};
use opsdesk_core::store::KeyValueStore;
use opsdesk_core::template::MessageTemplate;
use opsdesk_core::ticket::GuardedActionKind;

const TEMPLATES_KEY: &str = "response_templates";
const ACTIVITY_KEY: &str = "recent_activity";

/// Oldest entries beyond this are dropped.
const ACTIVITY_CAP: usize = 50;

/// What happened, for the recent-activity pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    TicketOpened,
    MessageSent,
    GuardedAction(GuardedActionKind),
}

/// One line in the recent-activity pane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub kind: ActivityKind,
    pub ticket_id: String,
    pub at: DateTime<Utc>,
}

/// CRUD over response templates plus activity recording.
pub struct TemplateService {
    store: Arc<dyn KeyValueStore>,
}

impl TemplateService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// All stored templates, in insertion order.
    pub async fn list(&self) -> Result<Vec<MessageTemplate>> {
        self.read(TEMPLATES_KEY).await
    }

    /// Finds a template by id.
    pub async fn get(&self, id: &str) -> Result<MessageTemplate> {
        self.list()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| OpsdeskError::not_found("template", id))
    }

    /// Inserts or updates a template. Templates saved without an id get a
    /// fresh one assigned.
    pub async fn save(&self, mut template: MessageTemplate) -> Result<MessageTemplate> {
        if template.id.is_empty() {
            template.id = Uuid::new_v4().to_string();
        }

        let mut templates = self.list().await?;
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(existing) => *existing = template.clone(),
            None => templates.push(template.clone()),
        }
        self.write(TEMPLATES_KEY, &templates).await?;
        tracing::debug!(template_id = %template.id, title = %template.title, "template saved");
        Ok(template)
    }

    /// Removes a template. Unknown ids are a no-op.
    pub async fn remove(&self, id: &str) -> Result<()> {
        let mut templates = self.list().await?;
        templates.retain(|t| t.id != id);
        self.write(TEMPLATES_KEY, &templates).await
    }

    /// Records an activity entry, trimming the list to its cap.
    pub async fn record_activity(&self, kind: ActivityKind, ticket_id: &str) -> Result<()> {
        let mut entries: Vec<ActivityEntry> = self.read(ACTIVITY_KEY).await?;
        entries.insert(
            0,
            ActivityEntry {
                id: Uuid::new_v4().to_string(),
                kind,
                ticket_id: ticket_id.to_string(),
                at: Utc::now(),
            },
        );
        entries.truncate(ACTIVITY_CAP);
        self.write(ACTIVITY_KEY, &entries).await
    }

    /// Most recent activity first.
    pub async fn recent_activity(&self) -> Result<Vec<ActivityEntry>> {
        self.read(ACTIVITY_KEY).await
    }

    async fn read<T: serde::de::DeserializeOwned + Default>(&self, key: &str) -> Result<T> {
        match self
            .store
            .get(key)
            .await
            .map_err(|e| OpsdeskError::storage(e.to_string()))?
        {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(T::default()),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.store
            .set(key, value)
            .await
            .map_err(|e| OpsdeskError::storage(e.to_string()))
    }
}

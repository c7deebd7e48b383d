use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::NotificationError;
use crate::models::AcknowledgedSet;
use crate::services::dedup;

/// Per-recipient acknowledgement storage. `acknowledge_all` is a single
/// read-modify-write, so a poll reading the set never loses an update.
#[async_trait]
pub trait AcknowledgedStore: Send + Sync {
    async fn load(&self, recipient: &str) -> Result<AcknowledgedSet, NotificationError>;

    async fn acknowledge_all(
        &self,
        recipient: &str,
        appointment_ids: &[Uuid],
    ) -> Result<AcknowledgedSet, NotificationError>;
}

#[derive(Debug, Default)]
pub struct InMemoryAcknowledgedStore {
    sets: RwLock<HashMap<String, AcknowledgedSet>>,
}

impl InMemoryAcknowledgedStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AcknowledgedStore for InMemoryAcknowledgedStore {
    async fn load(&self, recipient: &str) -> Result<AcknowledgedSet, NotificationError> {
        Ok(self
            .sets
            .read()
            .await
            .get(recipient.trim())
            .cloned()
            .unwrap_or_default())
    }

    async fn acknowledge_all(
        &self,
        recipient: &str,
        appointment_ids: &[Uuid],
    ) -> Result<AcknowledgedSet, NotificationError> {
        let mut sets = self.sets.write().await;
        let current = sets.entry(recipient.trim().to_string()).or_default();

        let next = dedup::acknowledge_all(appointment_ids.iter().copied(), current);
        debug!(
            "Recipient now has {} acknowledged appointment(s), {} new",
            next.len(),
            next.len() - current.len()
        );
        *current = next.clone();

        Ok(next)
    }
}

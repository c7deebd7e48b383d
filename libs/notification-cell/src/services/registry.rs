use std::collections::HashMap;

use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::error::NotificationError;
use crate::models::PollUpdate;
use crate::services::poller::{NotificationPoller, PollerHandle};
use crate::services::recipient::normalize_recipient;

/// Server-side pollers, at most one per patient. Entries are keyed by the
/// resolved patient key, so an id and an e-mail of the same patient share one.
pub struct PollerRegistry {
    poller: NotificationPoller,
    handles: Mutex<HashMap<String, PollerHandle>>,
}

impl PollerRegistry {
    pub fn new(poller: NotificationPoller) -> Self {
        Self {
            poller,
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn poller(&self) -> &NotificationPoller {
        &self.poller
    }

    /// Starts a poller unless one is already running. Returns whether a new
    /// one was started.
    #[instrument(skip(self))]
    pub async fn watch(&self, recipient: &str) -> Result<bool, NotificationError> {
        let key = self.poller.resolve_recipient(recipient).await?;
        let mut handles = self.handles.lock().await;

        if handles.get(&key).is_some_and(PollerHandle::is_running) {
            return Ok(false);
        }

        let handle = self.poller.start(&key)?;
        handles.insert(key, handle);
        info!("Watching recipient ({} active)", handles.len());
        Ok(true)
    }

    #[instrument(skip(self))]
    pub async fn unwatch(&self, recipient: &str) -> bool {
        let keys = self.candidate_keys(recipient).await;
        let handle = {
            let mut handles = self.handles.lock().await;
            keys.iter().find_map(|key| handles.remove(key))
        };
        match handle {
            Some(handle) => {
                handle.stop().await;
                true
            }
            None => false,
        }
    }

    pub async fn is_watching(&self, recipient: &str) -> bool {
        let keys = self.candidate_keys(recipient).await;
        let handles = self.handles.lock().await;
        keys.iter().any(|key| handles.contains_key(key))
    }

    pub async fn latest(&self, recipient: &str) -> Option<PollUpdate> {
        let keys = self.candidate_keys(recipient).await;
        let handles = self.handles.lock().await;
        keys.iter().find_map(|key| handles.get(key)).and_then(PollerHandle::latest)
    }

    pub async fn shutdown(&self) {
        let handles: Vec<PollerHandle> = self.handles.lock().await.drain().map(|(_, handle)| handle).collect();
        info!("Stopping {} notification poller(s)", handles.len());
        for handle in handles {
            handle.stop().await;
        }
    }

    /// Resolved key first, then the plain normalized form a poller started
    /// before the patient had appointments is filed under.
    async fn candidate_keys(&self, recipient: &str) -> Vec<String> {
        let normalized = normalize_recipient(recipient);
        match self.poller.resolve_recipient(recipient).await {
            Ok(key) if key != normalized => vec![key, normalized],
            Ok(key) => vec![key],
            Err(e) => {
                warn!("Could not resolve recipient, using it as given: {}", e);
                vec![normalized]
            }
        }
    }
}

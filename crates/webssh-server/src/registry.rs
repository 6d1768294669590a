//! Bookkeeping of live sessions. Sessions never talk to each other through
//! it; it only backs logging and shutdown.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use webssh_common::ChannelId;

use crate::bridge::SessionState;

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub peer: SocketAddr,
    pub state: SessionState,
    /// `host:port` once `init` has arrived.
    pub target: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Thread-safe session registry.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<ChannelId, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id is already registered.
    pub async fn register(&self, id: &ChannelId, peer: SocketAddr) -> bool {
        let mut map = self.sessions.write().await;
        if map.contains_key(id) {
            return false;
        }
        map.insert(
            id.clone(),
            SessionEntry {
                peer,
                state: SessionState::Idle,
                target: None,
                created_at: Utc::now(),
            },
        );
        true
    }

    pub async fn set_state(&self, id: &ChannelId, state: SessionState) {
        if let Some(entry) = self.sessions.write().await.get_mut(id) {
            entry.state = state;
        }
    }

    pub async fn set_target(&self, id: &ChannelId, target: String) {
        if let Some(entry) = self.sessions.write().await.get_mut(id) {
            entry.target = Some(target);
        }
    }

    /// Returns true if the session was removed.
    pub async fn unregister(&self, id: &ChannelId) -> bool {
        self.sessions.write().await.remove(id).is_some()
    }

    pub async fn get(&self, id: &ChannelId) -> Option<SessionEntry> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Number of sessions currently in `state`.
    pub async fn count_in(&self, state: SessionState) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|entry| entry.state == state)
            .count()
    }

    /// Log live and ready session counts at `debug`.
    pub async fn log_counts(&self) {
        let sessions = self.count().await;
        let ready = self.count_in(SessionState::Ready).await;
        tracing::debug!(sessions, ready, "Session count");
    }
}

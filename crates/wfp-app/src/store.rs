//! Session and contact collaborators.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::session::Session;

/// Persists one `Session` per transport session id.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError>;
    async fn save(&self, session: &Session) -> Result<(), StoreError>;
}

/// Registration status of contacts, keyed by transport address.
#[async_trait]
pub trait ContactStore: Send + Sync {
    async fn is_registered(&self, user: &str) -> Result<bool, StoreError>;
    async fn mark_registered(&self, user: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryContactStore {
    registered: RwLock<HashSet<String>>,
}

impl MemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registered<I, S>(users: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            registered: RwLock::new(users.into_iter().map(Into::into).collect()),
        }
    }
}

#[async_trait]
impl ContactStore for MemoryContactStore {
    async fn is_registered(&self, user: &str) -> Result<bool, StoreError> {
        Ok(self.registered.read().await.contains(user))
    }

    async fn mark_registered(&self, user: &str) -> Result<(), StoreError> {
        self.registered.write().await.insert(user.to_string());
        Ok(())
    }
}

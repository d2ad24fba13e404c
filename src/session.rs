//! Chat history kept per UI session.
//!
//! History lives in memory only. It disappears with the process, or earlier
//! once a session sits idle past the configured timeout.

use crate::config::ServerSettings;
use crate::error::{CurioError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }
}

/// Append-only list of chat turns.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Start over with an empty conversation.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// One UI session: its history and when it was last used.
#[derive(Debug)]
struct Session {
    history: ChatHistory,
    last_active: DateTime<Utc>,
}

impl Session {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            history: ChatHistory::new(),
            last_active: now,
        }
    }

    fn is_idle(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        (now - self.last_active)
            .to_std()
            .map_or(false, |idle| idle > timeout)
    }
}

/// In-memory store of chat histories keyed by session id.
///
/// Sessions idle for longer than the timeout are treated as gone, and the
/// least recently used session makes room when the store is full.
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    idle_timeout: Duration,
    max_sessions: usize,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::from_settings(&ServerSettings::default())
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout: settings.session_idle_timeout(),
            max_sessions: settings.max_sessions.max(1),
        }
    }

    /// Open a new, empty session.
    pub async fn create(&self) -> Uuid {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, s| !s.is_idle(now, self.idle_timeout));

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, s)| s.last_active)
                .map(|(id, _)| *id);
            match oldest {
                Some(id) => {
                    debug!("Session store full, dropping {}", id);
                    sessions.remove(&id);
                }
                None => break,
            }
        }

        let id = Uuid::new_v4();
        sessions.insert(id, Session::new(now));
        id
    }

    /// Snapshot of a session's messages, oldest first.
    pub async fn history(&self, id: &Uuid) -> Result<Vec<ChatMessage>> {
        let mut sessions = self.sessions.write().await;
        let session = self.touch(&mut sessions, id)?;
        Ok(session.history.messages().to_vec())
    }

    pub async fn append(&self, id: &Uuid, message: ChatMessage) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        self.touch(&mut sessions, id)?.history.push(message);
        Ok(())
    }

    pub async fn clear(&self, id: &Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        self.touch(&mut sessions, id)?.history.clear();
        Ok(())
    }

    /// Drop every idle session. Returns how many were dropped.
    pub async fn evict_idle(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_idle(now, self.idle_timeout));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Live session for `id`, marked as used now.
    fn touch<'a>(
        &self,
        sessions: &'a mut HashMap<Uuid, Session>,
        id: &Uuid,
    ) -> Result<&'a mut Session> {
        let now = Utc::now();
        if sessions
            .get(id)
            .is_some_and(|s| s.is_idle(now, self.idle_timeout))
        {
            debug!("Session {} expired", id);
            sessions.remove(id);
        }

        let session = sessions
            .get_mut(id)
            .ok_or(CurioError::SessionNotFound(*id))?;
        session.last_active = now;
        Ok(session)
    }

    /// Pretend a session was last used `by` ago.
    #[cfg(test)]
    pub(crate) async fn backdate(&self, id: &Uuid, by: chrono::Duration) {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.last_active = session.last_active - by;
        }
    }
}

//! Session store — per-conversation dialogue state, keyed by identity.
//!
//! Sessions are ephemeral: they exist only while a dialogue is in
//! progress and are lost on restart. Reading an unknown key yields
//! `Idle`; writing `Idle` back removes the entry.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::debug;

use crate::dialog::state::DialogState;

/// Keyed store of in-flight dialogue states.
pub struct SessionStore {
    sessions: RwLock<HashMap<i64, DialogState>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Current state for an identity. Unknown identities are `Idle`.
    pub async fn get(&self, telegram_id: i64) -> DialogState {
        self.sessions
            .read()
            .await
            .get(&telegram_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Replace an identity's state. Setting `Idle` deletes the entry,
    /// which is how completed or abandoned dialogues are cleaned up.
    pub async fn set(&self, telegram_id: i64, state: DialogState) {
        let mut sessions = self.sessions.write().await;
        let previous = if state.is_idle() {
            sessions.remove(&telegram_id)
        } else {
            sessions.insert(telegram_id, state.clone())
        };

        debug!(
            telegram_id,
            from = previous.as_ref().map_or("idle", DialogState::step_name),
            to = state.step_name(),
            "Session transition"
        );
    }

    /// Drop an identity's session outright.
    pub async fn clear(&self, telegram_id: i64) {
        self.sessions.write().await.remove(&telegram_id);
    }

    /// Number of dialogues currently in progress.
    pub async fn active_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

//! Bounded per-user conversation memory.
//!
//! Sessions are created lazily on first append and hold at most
//! [`MAX_TURNS`] turns (the last five exchanges); older turns are evicted
//! from the front. Each user's history sits behind its own async mutex so
//! append-then-truncate stays atomic under concurrent requests, while the
//! outer registry lock is only held long enough to find the entry.

use crate::models::{ConversationTurn, Role};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Maximum turns retained per user (5 exchanges).
pub const MAX_TURNS: usize = 10;

type History = Arc<Mutex<VecDeque<ConversationTurn>>>;

/// Process-wide session store, injected into the orchestrator.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, History>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn entry(&self, user_id: &str) -> History {
        if let Some(history) = self.sessions.read().await.get(user_id) {
            return Arc::clone(history);
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(user_id.to_string()).or_default())
    }

    /// Append one turn, evicting from the front to keep the bound.
    pub async fn append(&self, user_id: &str, turn: ConversationTurn) {
        let history = self.entry(user_id).await;
        let mut history = history.lock().await;
        history.push_back(turn);
        while history.len() > MAX_TURNS {
            history.pop_front();
        }
    }

    /// Append a user turn followed by the assistant reply.
    pub async fn append_exchange(&self, user_id: &str, user_text: &str, assistant_text: &str) {
        let history = self.entry(user_id).await;
        let mut history = history.lock().await;
        history.push_back(ConversationTurn::new(Role::User, user_text));
        history.push_back(ConversationTurn::new(Role::Assistant, assistant_text));
        while history.len() > MAX_TURNS {
            history.pop_front();
        }
    }

    /// The last `k` turns, oldest first. Read-only.
    pub async fn recent(&self, user_id: &str, k: usize) -> Vec<ConversationTurn> {
        let sessions = self.sessions.read().await;
        match sessions.get(user_id) {
            Some(history) => {
                let history = history.lock().await;
                let skip = history.len().saturating_sub(k);
                history.iter().skip(skip).cloned().collect()
            }
            None => Vec::new(),
        }
    }

    /// Whether the user has a non-empty session.
    pub async fn has_session(&self, user_id: &str) -> bool {
        let sessions = self.sessions.read().await;
        match sessions.get(user_id) {
            Some(history) => !history.lock().await.is_empty(),
            None => false,
        }
    }

    /// Content of the most recent assistant turn, if any.
    pub async fn last_assistant_turn(&self, user_id: &str) -> Option<String> {
        let sessions = self.sessions.read().await;
        let history = sessions.get(user_id)?;
        let history = history.lock().await;
        history
            .iter()
            .rev()
            .find(|turn| turn.role == Role::Assistant)
            .map(|turn| turn.content.clone())
    }

    /// Number of turns currently held for the user.
    pub async fn turn_count(&self, user_id: &str) -> usize {
        let sessions = self.sessions.read().await;
        match sessions.get(user_id) {
            Some(history) => history.lock().await.len(),
            None => 0,
        }
    }

    /// Drop the whole session.
    pub async fn clear(&self, user_id: &str) {
        self.sessions.write().await.remove(user_id);
    }

    /// Number of users with a session, for health reporting.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_and_recent() {
        let store = SessionStore::new();
        store.append_exchange("u1", "bonjour", "Bonjour !").await;

        let turns = store.recent("u1", 4).await;
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(turns[1].content, "Bonjour !");
    }

    #[tokio::test]
    async fn test_bound_keeps_most_recent() {
        let store = SessionStore::new();
        for i in 0..20 {
            store
                .append("u1", ConversationTurn::new(Role::User, format!("message {i}")))
                .await;
        }

        assert_eq!(store.turn_count("u1").await, MAX_TURNS);
        let turns = store.recent("u1", MAX_TURNS).await;
        assert_eq!(turns.first().unwrap().content, "message 10");
        assert_eq!(turns.last().unwrap().content, "message 19");
    }

    #[tokio::test]
    async fn test_empty_session_is_not_active() {
        let store = SessionStore::new();
        assert!(!store.has_session("ghost").await);
        assert_eq!(store.recent("ghost", 4).await.len(), 0);
    }

    #[tokio::test]
    async fn test_last_assistant_turn() {
        let store = SessionStore::new();
        store.append_exchange("u1", "q1", "r1").await;
        store.append("u1", ConversationTurn::new(Role::User, "q2")).await;

        assert_eq!(store.last_assistant_turn("u1").await.as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_clear_removes_session() {
        let store = SessionStore::new();
        store.append_exchange("u1", "q", "r").await;
        store.clear("u1").await;

        assert!(!store.has_session("u1").await);
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_appends_respect_bound() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                for j in 0..5 {
                    store
                        .append("u1", ConversationTurn::new(Role::User, format!("{i}-{j}")))
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.turn_count("u1").await, MAX_TURNS);
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::services::chat::{session::ChatSession, ChatPolicy};
use crate::services::providers::{CatalogStore, IdentityProvider, LanguageModel};

/// Shared application state
///
/// Every external dependency is an explicitly constructed, injected handle
/// with process-wide lifetime; nothing is reached through ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CatalogStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub policy: ChatPolicy,
    model: Arc<dyn LanguageModel>,
    sessions: Arc<RwLock<HashMap<Uuid, Arc<ChatSession>>>>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        identity: Arc<dyn IdentityProvider>,
        model: Arc<dyn LanguageModel>,
        policy: ChatPolicy,
    ) -> Self {
        Self {
            store,
            identity,
            policy,
            model,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns the chat session for this id, starting the model exchange
    /// exactly once per session id.
    pub async fn chat_session(&self, id: Uuid) -> Arc<ChatSession> {
        if let Some(session) = self.sessions.read().await.get(&id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(id)
            .or_insert_with(|| Arc::new(ChatSession::new(self.model.start_session())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::{MockCatalogStore, MockIdentityProvider, MockLanguageModel, MockModelSession};

    fn test_state() -> AppState {
        let mut model = MockLanguageModel::new();
        model
            .expect_start_session()
            .returning(|| Box::new(MockModelSession::new()));
        model.expect_name().return_const("mock");

        AppState::new(
            Arc::new(MockCatalogStore::new()),
            Arc::new(MockIdentityProvider::new()),
            Arc::new(model),
            ChatPolicy {
                snapshot_limit: 20,
                max_suggestions: 6,
                guest_query_limit: 5,
            },
        )
    }

    #[tokio::test]
    async fn test_chat_session_started_once_per_id() {
        let state = test_state();
        let id = Uuid::new_v4();

        let first = state.chat_session(id).await;
        let second = state.chat_session(id).await;
        assert!(Arc::ptr_eq(&first, &second));

        let other = state.chat_session(Uuid::new_v4()).await;
        assert!(!Arc::ptr_eq(&first, &other));
    }
}

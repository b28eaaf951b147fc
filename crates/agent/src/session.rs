//! Conversation sessions keyed by id.
//!
//! Each conversation sits behind its own async mutex which is held for the
//! whole turn: queries within one conversation run one at a time, while
//! different conversations proceed concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use medassist_core::conversation::{ConversationId, ConversationState, Turn};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::dialogue::{DialogueContextManager, TurnOutcome};

type SharedState = Arc<Mutex<ConversationState>>;

pub struct SessionStore {
    manager: Arc<DialogueContextManager>,
    conversations: RwLock<HashMap<ConversationId, SharedState>>,
}

impl SessionStore {
    pub fn new(manager: Arc<DialogueContextManager>) -> Self {
        Self {
            manager,
            conversations: RwLock::new(HashMap::new()),
        }
    }

    /// Start a fresh conversation and return its id.
    pub async fn open(&self) -> ConversationId {
        let id = ConversationId::new();
        self.conversations
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(ConversationState::new())));
        debug!(conversation = %id, "Opened conversation");
        id
    }

    /// Run one turn in conversation `id`, creating it if unknown.
    pub async fn handle(
        &self,
        id: &ConversationId,
        query: &str,
    ) -> medassist_core::Result<TurnOutcome> {
        let state = self.state_for(id).await;
        let mut state = state.lock().await;
        self.manager.respond(&mut state, query).await
    }

    /// Clear history and context of `id`. Returns false if unknown.
    pub async fn reset(&self, id: &ConversationId) -> bool {
        let Some(state) = self.conversations.read().await.get(id).cloned() else {
            return false;
        };
        state.lock().await.reset();
        true
    }

    /// Snapshot of the history of `id`.
    pub async fn history(&self, id: &ConversationId) -> Option<Vec<Turn>> {
        let state = self.conversations.read().await.get(id).cloned()?;
        let history = state.lock().await.history().to_vec();
        Some(history)
    }

    /// Forget conversation `id` entirely.
    pub async fn close(&self, id: &ConversationId) -> bool {
        self.conversations.write().await.remove(id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }

    async fn state_for(&self, id: &ConversationId) -> SharedState {
        if let Some(state) = self.conversations.read().await.get(id) {
            return state.clone();
        }
        self.conversations
            .write()
            .await
            .entry(id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(ConversationState::new())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use medassist_core::dialogue::Classification;
    use medassist_core::error::ProviderError;
    use medassist_core::event::EventBus;

    fn store(
        verdicts: Vec<Result<Classification, medassist_core::error::ClassifierError>>,
        answers: Vec<Result<String, ProviderError>>,
    ) -> (SessionStore, Arc<CountingRetriever>) {
        let retriever = Arc::new(CountingRetriever::new("Blood report: normal"));
        let manager = DialogueContextManager::new(
            Arc::new(ScriptedClassifier::new(verdicts)),
            retriever.clone(),
            Arc::new(ScriptedCompletor::new(answers)),
            Arc::new(EventBus::default()),
        );
        (SessionStore::new(Arc::new(manager)), retriever)
    }

    #[tokio::test]
    async fn conversations_keep_separate_histories() {
        let (store, retriever) = store(vec![], vec![Ok("a".into()), Ok("b".into())]);
        let first = store.open().await;
        let second = store.open().await;

        store.handle(&first, "What does my report show?").await.unwrap();
        store.handle(&second, "Any issues with my X-ray?").await.unwrap();

        assert_eq!(store.len().await, 2);
        assert_eq!(store.history(&first).await.unwrap().len(), 2);
        assert_eq!(
            store.history(&second).await.unwrap()[0],
            Turn::user("Any issues with my X-ray?")
        );
        // Both were first queries of their conversation.
        assert_eq!(retriever.calls(), 2);
    }

    #[tokio::test]
    async fn handle_creates_unknown_conversation() {
        let (store, _) = store(vec![], vec![Ok("a".into())]);
        let id = ConversationId::from("cli");

        assert!(store.history(&id).await.is_none());
        store.handle(&id, "hello").await.unwrap();
        assert_eq!(store.history(&id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn reset_and_close() {
        let (store, _) = store(vec![], vec![Ok("a".into())]);
        let id = store.open().await;
        store.handle(&id, "q").await.unwrap();

        assert!(store.reset(&id).await);
        assert!(store.history(&id).await.unwrap().is_empty());
        assert!(store.close(&id).await);
        assert!(store.is_empty().await);
        assert!(!store.reset(&id).await);
    }

    #[tokio::test]
    async fn failed_turn_leaves_session_history_unchanged() {
        let (store, _) = store(
            vec![Ok(Classification::NEW_QUERY)],
            vec![Ok("a".into()), Err(ProviderError::Network("down".into()))],
        );
        let id = store.open().await;
        store.handle(&id, "q1").await.unwrap();

        assert!(store.handle(&id, "q2").await.is_err());
        assert_eq!(store.history(&id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn concurrent_conversations_all_complete() {
        let answers = (0..8).map(|i| Ok(format!("answer {i}"))).collect();
        let (store, retriever) = store(vec![], answers);
        let store = Arc::new(store);

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let id = ConversationId::from(&format!("patient-{i}"));
                store.handle(&id, "What does my report show?").await.map(|_| id)
            }));
        }

        for handle in handles {
            let id = handle.await.unwrap().unwrap();
            assert_eq!(store.history(&id).await.unwrap().len(), 2);
        }
        assert_eq!(store.len().await, 8);
        assert_eq!(retriever.calls(), 8);
    }
}

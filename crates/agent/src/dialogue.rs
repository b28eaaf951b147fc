//! Dialogue context management: the per-query retrieval policy.
//!
//! For each user query the manager decides whether the context already
//! retrieved for this conversation is enough, or whether a fresh retrieval
//! is needed, then asks the completion service for an answer.
//!
//! # Flow
//!
//! 1. Empty history → new query, no classifier call
//! 2. Otherwise ask the classifier; on any failure assume a new query
//! 3. New query or new context needed → retrieve, build the RAG prompt
//! 4. Follow-up → build the follow-up prompt from the last turns only
//! 5. Complete; only on success commit both turns to the state

use std::sync::Arc;
use chrono::Utc;
use medassist_core::conversation::ConversationState;
use medassist_core::dialogue::{
    Classification, ClassificationInput, Completor, NO_CONTEXT_SENTINEL, QueryClassifier,
    Retriever,
};
use medassist_core::event::{preview, DomainEvent, EventBus};
use tracing::{info, warn};

use crate::prompt::{self, CLASSIFIER_WINDOW, FOLLOWUP_WINDOW};

/// Which policy branch a turn took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Context was (re)fetched for this query.
    Retrieval,
    /// Answered from the existing context and recent turns.
    FollowUp,
}

/// Result of one successful turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub response: String,
    pub branch: Branch,
    pub classification: Classification,
    /// True when the classifier failed and the default verdict was used.
    pub classifier_fallback: bool,
}

pub struct DialogueContextManager {
    classifier: Arc<dyn QueryClassifier>,
    retriever: Arc<dyn Retriever>,
    completor: Arc<dyn Completor>,
    event_bus: Arc<EventBus>,
}

impl DialogueContextManager {
    pub fn new(
        classifier: Arc<dyn QueryClassifier>,
        retriever: Arc<dyn Retriever>,
        completor: Arc<dyn Completor>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            classifier,
            retriever,
            completor,
            event_bus,
        }
    }

    /// Answer `query` within the conversation held in `state`.
    ///
    /// On error `state` is left exactly as it was.
    pub async fn handle_query(
        &self,
        state: &mut ConversationState,
        query: &str,
    ) -> medassist_core::Result<String> {
        self.respond(state, query).await.map(|outcome| outcome.response)
    }

    /// Like [`handle_query`](Self::handle_query), also reporting the branch taken.
    pub async fn respond(
        &self,
        state: &mut ConversationState,
        query: &str,
    ) -> medassist_core::Result<TurnOutcome> {
        let (classification, classifier_fallback) = self.classify(state, query).await;

        let (prompt, new_context, branch) = if classification.needs_retrieval() {
            info!("Fetching new context");
            let mut context = self.retriever.retrieve(query).await;
            if context.trim().is_empty() {
                context = NO_CONTEXT_SENTINEL.to_string();
            }
            self.event_bus.publish(DomainEvent::ContextRetrieved {
                query_preview: preview(query, 80),
                context_chars: context.chars().count(),
                timestamp: Utc::now(),
            });
            let prompt = prompt::rag_prompt(query, &context, state.history());
            (prompt, Some(context), Branch::Retrieval)
        } else {
            info!("Answering follow-up from existing context");
            self.event_bus.publish(DomainEvent::FollowUpAnswered {
                query_preview: preview(query, 80),
                timestamp: Utc::now(),
            });
            let prompt = prompt::followup_prompt(
                state.last_topic(),
                state.recent_turns(FOLLOWUP_WINDOW),
                query,
            );
            (prompt, None, Branch::FollowUp)
        };

        let response = match self.completor.complete(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Completion failed, conversation left unchanged");
                self.event_bus.publish(DomainEvent::ErrorOccurred {
                    context: "completion".into(),
                    error_message: e.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(e.into());
            }
        };

        state.commit(query, response.clone(), new_context);

        self.event_bus.publish(DomainEvent::ResponseGenerated {
            exchanges: state.exchanges(),
            response_chars: response.chars().count(),
            timestamp: Utc::now(),
        });

        Ok(TurnOutcome {
            response,
            branch,
            classification,
            classifier_fallback,
        })
    }

    /// Verdict for `query`, and whether it is the failure fallback.
    async fn classify(&self, state: &ConversationState, query: &str) -> (Classification, bool) {
        if state.is_empty() {
            return (Classification::NEW_QUERY, false);
        }

        let input = ClassificationInput {
            last_topic: state.last_topic(),
            last_turns: state.recent_turns(CLASSIFIER_WINDOW),
            query,
        };

        match self.classifier.classify(&input).await {
            Ok(verdict) => (verdict, false),
            Err(e) => {
                warn!(error = %e, "Query classification failed, assuming new query");
                self.event_bus.publish(DomainEvent::ClassificationFallback {
                    reason: e.to_string(),
                    timestamp: Utc::now(),
                });
                (Classification::NEW_QUERY, true)
            }
        }
    }
}

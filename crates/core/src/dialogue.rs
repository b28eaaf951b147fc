//! Collaborator contracts consumed by the dialogue manager.
//!
//! Each trait wraps one external capability:
//! - [`QueryClassifier`]: follow-up vs. new-context verdict;
//! - [`Retriever`]: relevant passages for a query, never failing;
//! - [`Completor`]: prompt in, answer text out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::conversation::Turn;
use crate::error::{ClassifierError, ProviderError};

/// Context used when the corpus has no documents at all.
pub const NO_CONTEXT_SENTINEL: &str =
    "No context yet. Please upload medical reports or prescription to get started.";

/// The classifier's verdict for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Classification {
    pub is_followup: bool,
    pub requires_new_context: bool,
}

impl Classification {
    /// Verdict used for the first query and whenever classification fails.
    pub const NEW_QUERY: Self = Self { is_followup: false, requires_new_context: true };

    /// Whether this verdict selects the retrieval branch.
    pub fn needs_retrieval(&self) -> bool {
        !self.is_followup || self.requires_new_context
    }
}

impl Default for Classification {
    fn default() -> Self {
        Self::NEW_QUERY
    }
}

/// Everything the classifier gets to see.
#[derive(Debug, Clone)]
pub struct ClassificationInput<'a> {
    /// The previous topic, if any.
    pub last_topic: Option<&'a str>,
    /// The last one or two turns, oldest first.
    pub last_turns: &'a [Turn],
    /// The incoming query.
    pub query: &'a str,
}

#[async_trait]
pub trait QueryClassifier: Send + Sync {
    async fn classify(
        &self,
        input: &ClassificationInput<'_>,
    ) -> std::result::Result<Classification, ClassifierError>;
}

/// Fetches relevant passages for a query.
///
/// Implementations must not fail: a corpus with no documents yields
/// [`NO_CONTEXT_SENTINEL`], and internal errors are logged and converted
/// to the sentinel as well.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> String;
}

/// Turns a fully assembled prompt into answer text. Attempted once, no retry.
#[async_trait]
pub trait Completor: Send + Sync {
    async fn complete(&self, prompt: &str) -> std::result::Result<String, ProviderError>;
}

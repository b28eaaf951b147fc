//! The dialogue layer of MedAssist.
//!
//! For every user query the [`DialogueContextManager`] decides between two
//! branches:
//!
//! 1. **Retrieval**: fetch fresh passages for the query and answer from
//!    them plus the full conversation history
//! 2. **Follow-up**: answer from the context already retrieved, using only
//!    the last few turns
//!
//! The decision is made by a [`QueryClassifier`](medassist_core::QueryClassifier)
//! and falls back to retrieval whenever classification fails. Conversation
//! state is owned by the caller; [`SessionStore`] offers a keyed store for
//! hosts running many conversations at once.

pub mod classifier;
pub mod dialogue;
pub mod prompt;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use classifier::LlmQueryClassifier;
pub use dialogue::{Branch, DialogueContextManager, TurnOutcome};
pub use session::SessionStore;

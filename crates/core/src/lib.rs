//! # MedAssist Core
//!
//! Domain types, collaborator traits, and error definitions for the
//! MedAssist chat worker. This crate has **no I/O**; it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external capability (LLM completion, query classification,
//! passage retrieval) is a trait here. Implementations live in their
//! respective crates, so the dialogue policy can be tested with scripted
//! stand-ins and the backends swapped via configuration.

pub mod error;
pub mod message;
pub mod conversation;
pub mod provider;
pub mod dialogue;
pub mod event;

// Re-export key types at crate root for ergonomics
pub use error::{ClassifierError, Error, ProviderError, Result, RetrievalError};
pub use message::{Message, Role};
pub use conversation::{ConversationId, ConversationState, Speaker, Turn};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ResponseFormat};
pub use dialogue::{
    Classification, ClassificationInput, Completor, QueryClassifier, Retriever,
    NO_CONTEXT_SENTINEL,
};
pub use event::{DomainEvent, EventBus};

//! LLM Provider implementations for MedAssist.
//!
//! All providers implement the `medassist_core::Provider` trait.
//! The router selects the correct provider based on configuration.

pub mod completor;
pub mod openai_compat;
pub mod router;

pub use completor::ProviderCompletor;
pub use openai_compat::OpenAiCompatProvider;
pub use router::ProviderRouter;

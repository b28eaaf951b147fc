//! Passage retrieval for MedAssist.
//!
//! Every retriever implements `medassist_core::Retriever` and never fails:
//! an empty corpus yields [`NO_CONTEXT_SENTINEL`], and any internal error
//! is logged and converted to the same sentinel.

pub mod corpus;
pub mod embedding;
pub mod keyword;
pub mod vector;

use medassist_core::dialogue::NO_CONTEXT_SENTINEL;
use medassist_core::error::RetrievalError;
use tracing::warn;

pub use corpus::{FileSource, InMemorySource, Passage, PassageSource, split_passages};
pub use embedding::EmbeddingRetriever;
pub use keyword::KeywordRetriever;
pub use vector::{cosine_similarity, rank_by_similarity};

/// Join ranked passages into one context block, best first.
pub(crate) fn join_passages(ranked: &[(f32, Passage)]) -> String {
    ranked
        .iter()
        .map(|(_, p)| p.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse a retrieval outcome into context text.
pub(crate) fn settle(source: &str, outcome: Result<Option<String>, RetrievalError>) -> String {
    match outcome {
        Ok(Some(context)) => context,
        Ok(None) => NO_CONTEXT_SENTINEL.to_string(),
        Err(e) => {
            warn!(source, error = %e, "Retrieval failed, using no-context sentinel");
            NO_CONTEXT_SENTINEL.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settle_maps_outcomes() {
        assert_eq!(settle("t", Ok(Some("ctx".into()))), "ctx");
        assert_eq!(settle("t", Ok(None)), NO_CONTEXT_SENTINEL);
        let err = RetrievalError::EmbeddingFailed("boom".into());
        assert_eq!(settle("t", Err(err)), NO_CONTEXT_SENTINEL);
    }

    #[test]
    fn join_keeps_rank_order() {
        let ranked = vec![
            (0.9, Passage { index: 3, content: "best".into() }),
            (0.1, Passage { index: 0, content: "worst".into() }),
        ];
        assert_eq!(join_passages(&ranked), "best\nworst");
    }
}

//! Keyword retriever — term-overlap ranking, no network calls.

use std::collections::HashSet;
use std::sync::Arc;
use async_trait::async_trait;
use medassist_core::dialogue::Retriever;
use medassist_core::error::RetrievalError;

use crate::corpus::PassageSource;
use crate::vector::top_k;
use crate::{join_passages, settle};

/// Lowercase alphanumeric terms of at least two characters.
fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(str::to_lowercase)
        .collect()
}

/// Fraction of query terms present in the passage.
fn overlap_score(query_terms: &HashSet<String>, passage: &str) -> f32 {
    if query_terms.is_empty() {
        return 0.0;
    }
    let passage_terms = terms(passage);
    let hits = query_terms.iter().filter(|t| passage_terms.contains(*t)).count();
    hits as f32 / query_terms.len() as f32
}

/// Ranks passages by how many query terms they contain.
///
/// Always returns up to `top_k` passages when the corpus is non-empty,
/// even when nothing overlaps, so the completion still sees the user's data.
pub struct KeywordRetriever {
    source: Arc<dyn PassageSource>,
    top_k: usize,
}

impl KeywordRetriever {
    pub fn new(source: Arc<dyn PassageSource>, top_k: usize) -> Self {
        Self { source, top_k: top_k.max(1) }
    }

    async fn try_retrieve(&self, query: &str) -> Result<Option<String>, RetrievalError> {
        let passages = self.source.load().await?;
        if passages.is_empty() {
            return Ok(None);
        }

        let query_terms = terms(query);
        let scored = passages
            .into_iter()
            .map(|p| (overlap_score(&query_terms, &p.content), p))
            .collect();

        Ok(Some(join_passages(&top_k(scored, self.top_k))))
    }
}

#[async_trait]
impl Retriever for KeywordRetriever {
    async fn retrieve(&self, query: &str) -> String {
        settle(self.source.name(), self.try_retrieve(query).await)
    }
}

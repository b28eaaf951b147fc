//! Embedding retriever — cosine similarity over provider embeddings.
//!
//! Passage vectors are cached by content so an unchanged corpus costs one
//! embedding call per query (the query itself). Passages appended by other
//! workers are embedded together with the query in the same batch, and
//! vectors of passages no longer in the corpus are dropped.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use async_trait::async_trait;
use medassist_core::dialogue::Retriever;
use medassist_core::error::RetrievalError;
use medassist_core::provider::{EmbeddingRequest, Provider};
use tokio::sync::RwLock;
use tracing::debug;

use crate::corpus::PassageSource;
use crate::vector::rank_by_similarity;
use crate::{join_passages, settle};

pub struct EmbeddingRetriever {
    provider: Arc<dyn Provider>,
    model: String,
    source: Arc<dyn PassageSource>,
    top_k: usize,
    cache: RwLock<HashMap<String, Vec<f32>>>,
}

impl EmbeddingRetriever {
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        source: Arc<dyn PassageSource>,
        top_k: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            source,
            top_k: top_k.max(1),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of passage vectors currently cached.
    pub async fn cached(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn try_retrieve(&self, query: &str) -> Result<Option<String>, RetrievalError> {
        let passages = self.source.load().await?;
        if passages.is_empty() {
            self.cache.write().await.clear();
            return Ok(None);
        }

        let missing: Vec<String> = {
            let cache = self.cache.read().await;
            let mut seen = HashSet::new();
            passages
                .iter()
                .filter(|p| !cache.contains_key(&p.content) && seen.insert(p.content.as_str()))
                .map(|p| p.content.clone())
                .collect()
        };

        let mut inputs = missing.clone();
        inputs.push(query.to_string());
        let expected = inputs.len();

        debug!(new_passages = missing.len(), total = passages.len(), "Embedding query batch");

        let response = self
            .provider
            .embed(EmbeddingRequest { model: self.model.clone(), inputs })
            .await
            .map_err(|e| RetrievalError::EmbeddingFailed(e.to_string()))?;

        let mut vectors = response.embeddings;
        if vectors.len() != expected {
            return Err(RetrievalError::EmbeddingMismatch { expected, actual: vectors.len() });
        }
        // Length checked above
        let query_vec = vectors.pop().unwrap_or_default();

        let mut cache = self.cache.write().await;
        for (content, vector) in missing.into_iter().zip(vectors) {
            cache.insert(content, vector);
        }
        let current: HashSet<&str> = passages.iter().map(|p| p.content.as_str()).collect();
        cache.retain(|content, _| current.contains(content.as_str()));

        let embeddings: Vec<Vec<f32>> = passages
            .iter()
            .map(|p| cache.get(&p.content).cloned().unwrap_or_default())
            .collect();
        drop(cache);

        let ranked = rank_by_similarity(&passages, &embeddings, &query_vec, self.top_k);
        Ok(Some(join_passages(&ranked)))
    }
}

#[async_trait]
impl Retriever for EmbeddingRetriever {
    async fn retrieve(&self, query: &str) -> String {
        settle(self.source.name(), self.try_retrieve(query).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::InMemorySource;
    use medassist_core::dialogue::NO_CONTEXT_SENTINEL;
    use medassist_core::error::ProviderError;
    use medassist_core::provider::{EmbeddingResponse, ProviderRequest, ProviderResponse};
    use std::sync::Mutex;

    /// Embeds text into a 3-d bag of topics: (imaging, blood, medicine).
    struct TopicEmbedder {
        calls: Mutex<Vec<Vec<String>>>,
        fail: bool,
    }

    impl TopicEmbedder {
        fn new() -> Self {
            Self { calls: Mutex::new(vec![]), fail: false }
        }

        fn vector(text: &str) -> Vec<f32> {
            let t = text.to_lowercase();
            let has = |words: &[&str]| if words.iter().any(|w| t.contains(w)) { 1.0 } else { 0.0 };
            vec![
                has(&["x-ray", "mri", "scan"]),
                has(&["blood", "hemoglobin", "report"]),
                has(&["medicine", "tablet", "dose"]),
            ]
        }
    }

    #[async_trait]
    impl Provider for TopicEmbedder {
        fn name(&self) -> &str {
            "topic_embedder"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            Err(ProviderError::NotConfigured("embeddings only".into()))
        }

        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            self.calls.lock().unwrap().push(request.inputs.clone());
            if self.fail {
                return Err(ProviderError::Network("connection reset".into()));
            }
            Ok(EmbeddingResponse {
                embeddings: request.inputs.iter().map(|i| Self::vector(i)).collect(),
                model: request.model,
                usage: None,
            })
        }
    }

    fn corpus() -> Arc<InMemorySource> {
        Arc::new(InMemorySource::with_passages([
            "Blood report: hemoglobin 14.2 g/dL",
            "Chest X-ray: no consolidation",
            "Medicine: Amoxicillin 500mg tablet, dose thrice daily",
        ]))
    }

    #[tokio::test]
    async fn returns_most_similar_passage() {
        let embedder = Arc::new(TopicEmbedder::new());
        let retriever = EmbeddingRetriever::new(embedder, "text-embedding-3-small", corpus(), 1);

        let ctx = retriever.retrieve("What does my x-ray show?").await;
        assert_eq!(ctx, "Chest X-ray: no consolidation");
    }

    #[tokio::test]
    async fn caches_passage_vectors_between_queries() {
        let embedder = Arc::new(TopicEmbedder::new());
        let retriever = EmbeddingRetriever::new(embedder.clone(), "m", corpus(), 2);

        retriever.retrieve("blood report").await;
        retriever.retrieve("which medicine dose?").await;

        let calls = embedder.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].len(), 4); // 3 passages + query
        assert_eq!(calls[1], vec!["which medicine dose?".to_string()]);
        drop(calls);
        assert_eq!(retriever.cached().await, 3);
    }

    #[tokio::test]
    async fn new_passages_are_embedded_incrementally() {
        let embedder = Arc::new(TopicEmbedder::new());
        let source = corpus();
        let retriever = EmbeddingRetriever::new(embedder.clone(), "m", source.clone(), 2);

        retriever.retrieve("blood").await;
        source.add("Brain MRI: no tumor detected").await;
        let ctx = retriever.retrieve("mri result").await;

        assert!(ctx.contains("Brain MRI"));
        assert_eq!(embedder.calls.lock().unwrap()[1].len(), 2);
    }

    #[tokio::test]
    async fn removed_passages_leave_the_cache() {
        let embedder = Arc::new(TopicEmbedder::new());
        let source = corpus();
        let retriever = EmbeddingRetriever::new(embedder.clone(), "m", source.clone(), 2);

        retriever.retrieve("blood").await;
        assert_eq!(retriever.cached().await, 3);

        source.clear().await;
        source.add("Blood report: hemoglobin 14.2 g/dL").await;
        source.add("Brain MRI: no tumor detected").await;
        retriever.retrieve("mri").await;

        assert_eq!(retriever.cached().await, 2);
        assert_eq!(
            embedder.calls.lock().unwrap()[1],
            vec!["Brain MRI: no tumor detected".to_string(), "mri".to_string()]
        );
    }

    #[tokio::test]
    async fn empty_corpus_skips_embedding_call() {
        let embedder = Arc::new(TopicEmbedder::new());
        let retriever =
            EmbeddingRetriever::new(embedder.clone(), "m", Arc::new(InMemorySource::new()), 2);

        assert_eq!(retriever.retrieve("anything").await, NO_CONTEXT_SENTINEL);
        assert!(embedder.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_yields_sentinel() {
        let embedder = Arc::new(TopicEmbedder { calls: Mutex::new(vec![]), fail: true });
        let retriever = EmbeddingRetriever::new(embedder, "m", corpus(), 2);

        assert_eq!(retriever.retrieve("blood").await, NO_CONTEXT_SENTINEL);
        assert_eq!(retriever.cached().await, 0);
    }
}

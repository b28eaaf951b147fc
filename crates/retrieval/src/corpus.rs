//! Passage sources — where retrievable text comes from.
//!
//! The other workers (OCR, report summarizer, image classifiers, medicine
//! scrapers) append their findings to one shared text file, separated by a
//! delimiter line. [`FileSource`] re-reads that file on every load so new
//! uploads become retrievable without restarting the chat.

use std::path::{Path, PathBuf};
use async_trait::async_trait;
use medassist_core::error::RetrievalError;
use tokio::sync::RwLock;
use tracing::debug;

/// One retrievable chunk of the corpus.
#[derive(Debug, Clone, PartialEq)]
pub struct Passage {
    /// Position in the corpus; used to break ranking ties.
    pub index: usize,
    pub content: String,
}

/// Split raw corpus text into passages, dropping blank chunks.
pub fn split_passages(raw: &str, delimiter: &str) -> Vec<Passage> {
    raw.split(delimiter)
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .enumerate()
        .map(|(index, chunk)| Passage { index, content: chunk.to_string() })
        .collect()
}

/// Anything that can produce the current set of passages.
#[async_trait]
pub trait PassageSource: Send + Sync {
    fn name(&self) -> &str;

    async fn load(&self) -> Result<Vec<Passage>, RetrievalError>;
}

/// The shared corpus file. A missing file is an empty corpus, not an error.
pub struct FileSource {
    path: PathBuf,
    delimiter: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, delimiter: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            delimiter: delimiter.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PassageSource for FileSource {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self) -> Result<Vec<Passage>, RetrievalError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Corpus file not found, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(RetrievalError::Io {
                    path: self.path.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let passages = split_passages(&raw, &self.delimiter);
        debug!(path = %self.path.display(), passages = passages.len(), "Loaded corpus");
        Ok(passages)
    }
}

/// Passages held in memory. Useful for tests and embedding the chat in
/// a process that receives documents over the message bus.
pub struct InMemorySource {
    chunks: RwLock<Vec<String>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self { chunks: RwLock::new(Vec::new()) }
    }

    pub fn with_passages<I, S>(passages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chunks: RwLock::new(passages.into_iter().map(Into::into).collect()),
        }
    }

    pub async fn add(&self, passage: impl Into<String>) {
        self.chunks.write().await.push(passage.into());
    }

    pub async fn clear(&self) {
        self.chunks.write().await.clear();
    }
}

impl Default for InMemorySource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PassageSource for InMemorySource {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self) -> Result<Vec<Passage>, RetrievalError> {
        Ok(self
            .chunks
            .read()
            .await
            .iter()
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .enumerate()
            .map(|(index, c)| Passage { index, content: c.to_string() })
            .collect())
    }
}

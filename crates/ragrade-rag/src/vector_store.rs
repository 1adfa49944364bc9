//! Local vector store with hashed text embeddings

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

use ragrade_core::{Error, Result, SearchConfig, SearchResult, VectorDocument, VectorStore};

const EMBEDDING_DIMENSION: usize = 384;

#[derive(Serialize, Deserialize)]
struct VectorStoreData {
    embedding_dimension: usize,
    documents: Vec<VectorDocument>,
}

/// In-memory vector store, optionally persisted to a JSON file
///
/// Embeddings are feature-hashed word and character-trigram counts. They
/// rank by lexical overlap only, which is enough to pull the right course
/// notes for a question without an embedding model.
pub struct LocalVectorStore {
    documents: RwLock<HashMap<String, VectorDocument>>,
    data_file: Option<PathBuf>,
    connected: bool,
}

impl LocalVectorStore {
    /// Create a new in-memory vector store
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            data_file: None,
            connected: false,
        }
    }

    /// Create a vector store persisted to `data_file`
    ///
    /// Existing contents are loaded on `connect`.
    pub fn persistent(data_file: impl Into<PathBuf>) -> Self {
        Self {
            data_file: Some(data_file.into()),
            ..Self::new()
        }
    }

    /// Path of the backing file, if any
    pub fn data_file(&self) -> Option<&Path> {
        self.data_file.as_deref()
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, HashMap<String, VectorDocument>>> {
        self.documents
            .read()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<String, VectorDocument>>> {
        self.documents
            .write()
            .map_err(|e| Error::VectorStore(format!("Lock error: {}", e)))
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(Error::VectorStore("Vector store not connected".to_string()))
        }
    }

    /// Write the current contents to the backing file
    async fn persist(&self) -> Result<()> {
        let Some(path) = &self.data_file else {
            return Ok(());
        };

        let content = {
            let docs = self.read_lock()?;
            let mut documents: Vec<VectorDocument> = docs.values().cloned().collect();
            documents.sort_by(|a, b| a.id.cmp(&b.id));
            serde_json::to_string(&VectorStoreData {
                embedding_dimension: EMBEDDING_DIMENSION,
                documents,
            })?
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, content).await?;
        debug!(path = %path.display(), "vector store persisted");
        Ok(())
    }

    fn with_embedding(mut document: VectorDocument) -> VectorDocument {
        if document.embedding.is_none() {
            document.embedding = Some(embed(&document.content));
        }
        document.score = None;
        document
    }
}

impl Default for LocalVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash words and character trigrams into a normalized feature vector
///
/// Trigrams keep retrieval useful for scripts written without spaces
/// between words, such as Thai.
pub(crate) fn embed(text: &str) -> Vec<f32> {
    let mut embedding = vec![0.0f32; EMBEDDING_DIMENSION];
    let normalized = text.to_lowercase();

    let mut bump = |feature: &str, weight: f32| {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        let idx = (hasher.finish() % EMBEDDING_DIMENSION as u64) as usize;
        embedding[idx] += weight;
    };

    for word in normalized.split_whitespace() {
        let word = word.trim_matches(|c: char| c.is_ascii_punctuation());
        if word.is_empty() {
            continue;
        }
        bump(word, 1.0);

        let chars: Vec<char> = word.chars().collect();
        for window in chars.windows(3) {
            let trigram: String = window.iter().collect();
            bump(&trigram, 0.5);
        }
    }

    let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for val in embedding.iter_mut() {
            *val /= magnitude;
        }
    }

    embedding
}

/// Cosine similarity between two vectors
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    async fn connect(&mut self) -> Result<()> {
        if let Some(path) = &self.data_file {
            if tokio::fs::try_exists(path).await? {
                let content = tokio::fs::read_to_string(path).await?;
                let data: VectorStoreData = serde_json::from_str(&content)?;
                if data.embedding_dimension != EMBEDDING_DIMENSION {
                    return Err(Error::VectorStore(format!(
                        "Store at {} uses embedding dimension {}, expected {}",
                        path.display(),
                        data.embedding_dimension,
                        EMBEDDING_DIMENSION
                    )));
                }

                let mut docs = self.write_lock()?;
                docs.clear();
                for doc in data.documents {
                    docs.insert(doc.id.clone(), doc);
                }
                info!(path = %path.display(), documents = docs.len(), "loaded vector store");
            }
        }

        self.connected = true;
        Ok(())
    }

    async fn store(&self, document: VectorDocument) -> Result<String> {
        self.ensure_connected()?;
        let id = document.id.clone();
        {
            let mut docs = self.write_lock()?;
            docs.insert(id.clone(), Self::with_embedding(document));
        }
        self.persist().await?;
        Ok(id)
    }

    async fn store_batch(&self, documents: Vec<VectorDocument>) -> Result<Vec<String>> {
        self.ensure_connected()?;
        let mut ids = Vec::with_capacity(documents.len());
        {
            let mut docs = self.write_lock()?;
            for document in documents {
                let id = document.id.clone();
                docs.insert(id.clone(), Self::with_embedding(document));
                ids.push(id);
            }
        }
        self.persist().await?;
        Ok(ids)
    }

    async fn search(&self, query: &str, config: &SearchConfig) -> Result<SearchResult> {
        self.ensure_connected()?;
        let query_embedding = embed(query);
        let docs = self.read_lock()?;

        let mut results: Vec<VectorDocument> = docs
            .values()
            .filter_map(|doc| {
                let score = doc
                    .embedding
                    .as_deref()
                    .map(|e| cosine_similarity(&query_embedding, e))
                    .unwrap_or(0.0);
                if config.score_threshold.is_some_and(|threshold| score < threshold) {
                    return None;
                }
                let mut hit = doc.clone();
                hit.embedding = None;
                hit.score = Some(score);
                Some(hit)
            })
            .collect();

        results.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .total_cmp(&a.score.unwrap_or(0.0))
                .then_with(|| a.id.cmp(&b.id))
        });
        results.truncate(config.top_k);

        let total = results.len();
        Ok(SearchResult {
            documents: results,
            total,
        })
    }

    async fn get(&self, id: &str) -> Result<Option<VectorDocument>> {
        let docs = self.read_lock()?;
        Ok(docs.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let removed = {
            let mut docs = self.write_lock()?;
            docs.remove(id).is_some()
        };
        if removed {
            self.persist().await?;
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<()> {
        {
            let mut docs = self.write_lock()?;
            docs.clear();
        }
        self.persist().await
    }

    async fn count(&self) -> Result<usize> {
        let docs = self.read_lock()?;
        Ok(docs.len())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn doc(id: &str, content: &str) -> VectorDocument {
        VectorDocument {
            id: id.to_string(),
            content: content.to_string(),
            embedding: None,
            metadata: json!({}),
            score: None,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        let vec1 = vec![1.0, 0.0, 0.0];
        let vec2 = vec![1.0, 0.0, 0.0];
        let vec3 = vec![0.0, 1.0, 0.0];

        assert!((cosine_similarity(&vec1, &vec2) - 1.0).abs() < 0.001);
        assert!((cosine_similarity(&vec1, &vec3) - 0.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&vec1, &[1.0]), 0.0);
    }

    #[test]
    fn test_embed_is_normalized() {
        let embedding = embed("Transfer function of a closed-loop system");
        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((magnitude - 1.0).abs() < 0.001);

        assert!(embed("").iter().all(|v| *v == 0.0));
    }

    #[tokio::test]
    async fn test_store_requires_connect() {
        let store = LocalVectorStore::new();
        assert!(matches!(store.store(doc("a", "text")).await, Err(Error::VectorStore(_))));
    }

    #[tokio::test]
    async fn test_search_ranks_relevant_document_first() {
        let mut store = LocalVectorStore::new();
        store.connect().await.unwrap();

        store
            .store_batch(vec![
                doc("pid", "A PID controller combines proportional, integral and derivative action"),
                doc("bode", "Bode plots show gain and phase against frequency"),
                doc("open", "An open-loop system has no feedback path"),
            ])
            .await
            .unwrap();

        let config = SearchConfig { top_k: 2, score_threshold: None };
        let result = store.search("what does a PID controller do", &config).await.unwrap();

        assert_eq!(result.total, 2);
        assert_eq!(result.documents[0].id, "pid");
        assert!(result.documents[0].embedding.is_none());
        assert!(result.documents[0].score.unwrap() > result.documents[1].score.unwrap());
    }

    #[tokio::test]
    async fn test_search_empty_store_returns_nothing() {
        let mut store = LocalVectorStore::new();
        store.connect().await.unwrap();

        let result = store.search("anything", &SearchConfig::default()).await.unwrap();
        assert!(result.documents.is_empty());
        assert_eq!(result.total, 0);
    }

    #[tokio::test]
    async fn test_persistence_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store").join("kb.json");

        let mut store = LocalVectorStore::persistent(&path);
        store.connect().await.unwrap();
        store.store(doc("root-locus", "Root locus plots pole movement as gain varies")).await.unwrap();
        assert!(path.exists());

        let mut reopened = LocalVectorStore::persistent(&path);
        reopened.connect().await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 1);
        let loaded = reopened.get("root-locus").await.unwrap().unwrap();
        assert!(loaded.embedding.is_some());

        assert!(reopened.delete("root-locus").await.unwrap());
        assert!(!reopened.delete("root-locus").await.unwrap());
        assert_eq!(reopened.count().await.unwrap(), 0);
    }
}

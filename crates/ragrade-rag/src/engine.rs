//! RAG engine implementation

use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use ragrade_core::{
    DocumentIndexer, Error, RAGEngine, RAGQuery, RAGResult, Result, SearchConfig, VectorStore,
};

/// Local RAG engine over a vector store and its indexer
pub struct LocalRAGEngine<V: VectorStore, D: DocumentIndexer> {
    vector_store: Arc<V>,
    document_indexer: Arc<D>,
    initialized: bool,
}

impl<V: VectorStore, D: DocumentIndexer> LocalRAGEngine<V, D> {
    /// Create a new local RAG engine
    pub fn new(vector_store: Arc<V>, document_indexer: Arc<D>) -> Self {
        Self {
            vector_store,
            document_indexer,
            initialized: false,
        }
    }

    /// Indexer feeding this engine's store
    pub fn indexer(&self) -> &Arc<D> {
        &self.document_indexer
    }
}

#[async_trait]
impl<V: VectorStore + 'static, D: DocumentIndexer + 'static> RAGEngine for LocalRAGEngine<V, D> {
    async fn initialize(&mut self) -> Result<()> {
        if !self.vector_store.is_connected() {
            return Err(Error::RAGEngine("Vector store not connected".to_string()));
        }

        self.initialized = true;
        Ok(())
    }

    async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult> {
        if !self.initialized {
            return Err(Error::RAGEngine("RAG engine not initialized".to_string()));
        }

        let search_config = SearchConfig {
            top_k: query.top_k,
            score_threshold: query.score_threshold,
        };

        let search_result = self.vector_store.search(&query.query, &search_config).await?;
        debug!(query = %query.query, hits = search_result.total, "retrieved context");

        Ok(RAGResult {
            documents: search_result.documents,
            metadata: Some(json!({
                "query": query.query,
                "top_k": query.top_k,
                "results_count": search_result.total,
            })),
        })
    }

    async fn stats(&self) -> Result<serde_json::Value> {
        let vector_count = self.vector_store.count().await?;
        let indexer_stats = self.document_indexer.stats().await?;

        Ok(json!({
            "initialized": self.initialized,
            "vector_store_count": vector_count,
            "indexer_stats": indexer_stats,
        }))
    }

    fn is_ready(&self) -> bool {
        self.initialized && self.vector_store.is_connected()
    }
}

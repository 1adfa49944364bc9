//! Retrieval side of ragrade
//!
//! This crate provides a file-persisted local vector store, a knowledge-base
//! indexer for course material, and the RAG engine the grader retrieves from.

mod vector_store;
mod document_indexer;
mod engine;


pub use vector_store::LocalVectorStore;
pub use document_indexer::LocalDocumentIndexer;
pub use engine::LocalRAGEngine;

// Re-export core types for convenience
pub use ragrade_core::{
    RAGEngine, RAGQuery, RAGResult,
    VectorStore, VectorDocument, SearchResult, SearchConfig,
    DocumentIndexer, Document, IndexingResult, IndexingConfig,
    Error, Result,
};

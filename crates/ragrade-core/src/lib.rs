//! Core traits and types for ragrade
//!
//! This crate defines the interfaces shared across the grading pipeline:
//! the LLM provider (generator), the RAG engine (retriever), vector stores,
//! document indexers, and the grading records exchanged between them.

pub mod llm;
pub mod rag;
pub mod vector_store;
pub mod document_indexer;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use llm::{LLMProvider, GenerationConfig, GenerationResult};
pub use rag::{RAGEngine, RAGQuery, RAGResult};
pub use vector_store::{VectorStore, VectorDocument, SearchResult, SearchConfig};
pub use document_indexer::{DocumentIndexer, Document, IndexingResult, IndexingConfig};
pub use types::*;

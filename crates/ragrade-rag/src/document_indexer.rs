//! Knowledge-base document indexer

use async_trait::async_trait;
use chrono::Utc;
use pulldown_cmark::{Event, Parser, TagEnd};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

use ragrade_core::{
    Document, DocumentIndexer, Error, IndexingConfig, IndexingResult, Result, VectorDocument,
    VectorStore,
};

/// File extensions the indexer knows how to read
const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

#[derive(Debug, Clone, Serialize)]
struct IndexedSource {
    source: String,
    chunks: usize,
    indexed_at: String,
}

/// Document indexer that chunks course material into any VectorStore
pub struct LocalDocumentIndexer<V: VectorStore> {
    vector_store: Arc<V>,
    config: IndexingConfig,
    sources: RwLock<Vec<IndexedSource>>,
}

impl<V: VectorStore> LocalDocumentIndexer<V> {
    /// Create a new local document indexer
    pub fn new(vector_store: Arc<V>) -> Self {
        Self::with_config(vector_store, IndexingConfig::default())
    }

    /// Create with custom configuration
    pub fn with_config(vector_store: Arc<V>, config: IndexingConfig) -> Self {
        Self {
            vector_store,
            config,
            sources: RwLock::new(Vec::new()),
        }
    }

    /// Split text into overlapping character windows
    fn chunk_document(&self, content: &str) -> Vec<String> {
        let chars: Vec<char> = content.chars().collect();
        let size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap.min(size - 1);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let end = (start + size).min(chars.len());
            let chunk: String = chars[start..end].iter().collect();
            if !chunk.trim().is_empty() {
                chunks.push(chunk.trim().to_string());
            }

            if end >= chars.len() {
                break;
            }

            start = end - overlap;
        }

        chunks
    }

    fn record_source(&self, source: &str, chunks: usize) {
        match self.sources.write() {
            Ok(mut sources) => {
                sources.retain(|s| s.source != source);
                sources.push(IndexedSource {
                    source: source.to_string(),
                    chunks,
                    indexed_at: Utc::now().to_rfc3339(),
                });
            }
            Err(e) => warn!("could not record indexed source {}: {}", source, e),
        }
    }
}

/// Reduce markdown to its text content, one block per line
fn markdown_to_text(markdown: &str) -> String {
    let mut text = String::new();

    for event in Parser::new(markdown) {
        match event {
            Event::Text(t) | Event::Code(t) => text.push_str(&t),
            Event::SoftBreak | Event::HardBreak => text.push(' '),
            Event::End(TagEnd::Paragraph | TagEnd::Heading(_) | TagEnd::Item | TagEnd::CodeBlock) => {
                text.push('\n')
            }
            _ => {}
        }
    }

    text
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Collect supported files under `dir`, sorted for a stable indexing order
fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .collect();
    entries.sort();

    for path in entries {
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if is_supported(&path) {
            files.push(path);
        }
    }

    Ok(())
}

#[async_trait]
impl<V: VectorStore + 'static> DocumentIndexer for LocalDocumentIndexer<V> {
    async fn index_document(&self, document: Document) -> Result<IndexingResult> {
        let chunks = self.chunk_document(&document.content);
        let source = document.source.clone().unwrap_or_else(|| document.id.clone());

        let vector_docs: Vec<VectorDocument> = chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let mut metadata = if document.metadata.is_object() {
                    document.metadata.clone()
                } else {
                    json!({})
                };
                metadata["chunk_index"] = json!(i);
                metadata["total_chunks"] = json!(chunks.len());
                metadata["title"] = json!(document.title);
                metadata["source"] = json!(source);

                VectorDocument {
                    id: format!("{:x}-{}", md5::compute(document.id.as_bytes()), i),
                    content: chunk.clone(),
                    embedding: None,
                    metadata,
                    score: None,
                }
            })
            .collect();

        let chunk_count = vector_docs.len();
        if chunk_count == 0 {
            return Ok(IndexingResult {
                documents_indexed: 0,
                chunks_indexed: 0,
                documents_failed: 1,
                errors: vec![format!("{}: no text content", source)],
            });
        }

        self.vector_store.store_batch(vector_docs).await?;
        self.record_source(&source, chunk_count);

        Ok(IndexingResult {
            documents_indexed: 1,
            chunks_indexed: chunk_count,
            documents_failed: 0,
            errors: Vec::new(),
        })
    }

    async fn index_documents(&self, documents: Vec<Document>) -> Result<IndexingResult> {
        let mut total = IndexingResult::default();

        for document in documents {
            let id = document.id.clone();
            match self.index_document(document).await {
                Ok(result) => total.merge(result),
                Err(e) => {
                    total.documents_failed += 1;
                    total.errors.push(format!("Failed to index document {}: {}", id, e));
                }
            }
        }

        Ok(total)
    }

    async fn index_from_file(&self, path: &Path) -> Result<IndexingResult> {
        if !is_supported(path) {
            return Err(Error::DocumentIndexer(format!(
                "Unsupported file type: {} (expected one of {})",
                path.display(),
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        let raw = tokio::fs::read_to_string(path).await?;
        let is_markdown = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown"));
        let content = if is_markdown { markdown_to_text(&raw) } else { raw };

        let source = path.display().to_string();
        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();

        info!(source = %source, "indexing file");
        self.index_document(Document {
            id: source.clone(),
            title,
            content,
            source: Some(source),
            metadata: json!({"type": "course_material"}),
        })
        .await
    }

    async fn index_directory(&self, dir: &Path) -> Result<IndexingResult> {
        if !dir.is_dir() {
            return Err(Error::DocumentIndexer(format!("Not a directory: {}", dir.display())));
        }

        let mut files = Vec::new();
        collect_files(dir, &mut files)?;
        if files.is_empty() {
            warn!(dir = %dir.display(), "no supported documents found in knowledge base directory");
        }

        let mut total = IndexingResult::default();
        for file in files {
            match self.index_from_file(&file).await {
                Ok(result) => total.merge(result),
                Err(e) => {
                    total.documents_failed += 1;
                    total.errors.push(format!("{}: {}", file.display(), e));
                }
            }
        }

        Ok(total)
    }

    async fn stats(&self) -> Result<serde_json::Value> {
        let sources = self
            .sources
            .read()
            .map_err(|e| Error::DocumentIndexer(format!("Lock error: {}", e)))?
            .clone();

        Ok(json!({
            "chunk_size": self.config.chunk_size,
            "chunk_overlap": self.config.chunk_overlap,
            "sources_indexed": sources.len(),
            "sources": sources,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LocalVectorStore;
    use tempfile::TempDir;

    async fn connected_store() -> Arc<LocalVectorStore> {
        let mut store = LocalVectorStore::new();
        store.connect().await.unwrap();
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_chunking_overlaps() {
        let store = connected_store().await;
        let indexer = LocalDocumentIndexer::with_config(
            store,
            IndexingConfig { chunk_size: 10, chunk_overlap: 3 },
        );

        let chunks = indexer.chunk_document("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(chunks, vec!["abcdefghij", "hijklmnopq", "opqrstuvwx", "vwxyz"]);
    }

    #[tokio::test]
    async fn test_chunking_counts_characters_not_bytes() {
        let store = connected_store().await;
        let indexer = LocalDocumentIndexer::with_config(
            store,
            IndexingConfig { chunk_size: 4, chunk_overlap: 0 },
        );

        let chunks = indexer.chunk_document("ระบบควบคุม");
        assert_eq!(chunks, vec!["ระบบ", "ควบค", "ุม"]);
    }

    #[tokio::test]
    async fn test_chunking_survives_overlap_not_smaller_than_size() {
        let store = connected_store().await;
        let indexer = LocalDocumentIndexer::with_config(
            store,
            IndexingConfig { chunk_size: 3, chunk_overlap: 5 },
        );

        let chunks = indexer.chunk_document("abcdef");
        assert_eq!(chunks.first().map(String::as_str), Some("abc"));
        assert_eq!(chunks.last().map(String::as_str), Some("def"));
    }

    #[test]
    fn test_markdown_to_text() {
        let text = markdown_to_text("# Stability\n\nA system is **stable** if poles are in the `LHP`.\n\n- one\n- two\n");
        assert_eq!(text, "Stability\nA system is stable if poles are in the LHP.\none\ntwo\n");
    }

    #[tokio::test]
    async fn test_index_document_stores_chunks() {
        let store = connected_store().await;
        let indexer = LocalDocumentIndexer::new(store.clone());

        let result = indexer
            .index_document(Document {
                id: "notes-1".to_string(),
                title: "Feedback".to_string(),
                content: "Closed-loop control uses feedback to reduce error.".to_string(),
                source: None,
                metadata: json!({"course": "control"}),
            })
            .await
            .unwrap();

        assert_eq!(result.documents_indexed, 1);
        assert_eq!(result.chunks_indexed, 1);
        assert_eq!(store.count().await.unwrap(), 1);

        let id = format!("{:x}-0", md5::compute("notes-1".as_bytes()));
        let stored = store.get(&id).await.unwrap().unwrap();
        assert_eq!(stored.metadata["course"], "control");
        assert_eq!(stored.metadata["title"], "Feedback");
        assert_eq!(stored.metadata["source"], "notes-1");
    }

    #[tokio::test]
    async fn test_index_empty_document_is_reported() {
        let store = connected_store().await;
        let indexer = LocalDocumentIndexer::new(store);

        let result = indexer
            .index_document(Document {
                id: "blank".to_string(),
                title: "Blank".to_string(),
                content: "   \n".to_string(),
                source: None,
                metadata: json!({}),
            })
            .await
            .unwrap();

        assert_eq!(result.documents_failed, 1);
        assert_eq!(result.chunks_indexed, 0);
    }

    #[tokio::test]
    async fn test_index_directory_skips_unsupported_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("open_loop.txt"), "Open-loop systems have no feedback.").unwrap();
        std::fs::create_dir(dir.path().join("week2")).unwrap();
        std::fs::write(
            dir.path().join("week2").join("pid.md"),
            "# PID\n\nProportional, integral, derivative.",
        )
        .unwrap();
        std::fs::write(dir.path().join("slides.pdf"), [0u8, 1, 2]).unwrap();

        let store = connected_store().await;
        let indexer = LocalDocumentIndexer::new(store.clone());
        let result = indexer.index_directory(dir.path()).await.unwrap();

        assert_eq!(result.documents_indexed, 2);
        assert_eq!(result.documents_failed, 0);
        assert_eq!(store.count().await.unwrap(), 2);

        let stats = indexer.stats().await.unwrap();
        assert_eq!(stats["sources_indexed"], 2);
    }

    #[tokio::test]
    async fn test_index_from_file_rejects_unsupported_extension() {
        let store = connected_store().await;
        let indexer = LocalDocumentIndexer::new(store);

        let err = indexer.index_from_file(Path::new("lecture.docx")).await.unwrap_err();
        assert!(matches!(err, Error::DocumentIndexer(_)));
    }
}

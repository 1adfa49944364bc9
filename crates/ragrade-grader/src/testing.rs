//! Test doubles for the generator and retriever

use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use ragrade_core::{
    Error, GenerationConfig, GenerationResult, LLMProvider, RAGEngine, RAGQuery, RAGResult,
    Result, VectorDocument,
};

mock! {
    pub Rag {}

    #[async_trait]
    impl RAGEngine for Rag {
        async fn initialize(&mut self) -> Result<()>;
        async fn retrieve(&self, query: &RAGQuery) -> Result<RAGResult>;
        async fn stats(&self) -> Result<serde_json::Value>;
        fn is_ready(&self) -> bool;
    }
}

/// Retriever that always returns the given snippets
pub fn rag_returning(contents: &[&str]) -> MockRag {
    let documents: Vec<VectorDocument> = contents
        .iter()
        .enumerate()
        .map(|(i, content)| VectorDocument {
            id: format!("chunk-{}", i),
            content: content.to_string(),
            embedding: None,
            metadata: json!({}),
            score: Some(0.9),
        })
        .collect();

    let mut rag = MockRag::new();
    rag.expect_retrieve().returning(move |_| {
        Ok(RAGResult {
            documents: documents.clone(),
            metadata: None,
        })
    });
    rag.expect_is_ready().return_const(true);
    rag
}

/// Generator that replays scripted replies in order
///
/// Records every prompt and the generation settings it was called with.
/// Its own settings differ from `GenerationConfig::default()`.
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Result<String>>>,
    prompts: Mutex<Vec<String>>,
    configs: Mutex<Vec<GenerationConfig>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<Result<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            prompts: Mutex::new(Vec::new()),
            configs: Mutex::new(Vec::new()),
        }
    }

    /// Settings used when the caller does not supply any
    pub fn own_settings() -> GenerationConfig {
        GenerationConfig {
            model_id: "scripted".to_string(),
            temperature: Some(0.1),
            timeout: Duration::from_secs(600),
            ..Default::default()
        }
    }

    pub fn configs(&self) -> Vec<GenerationConfig> {
        self.configs.lock().unwrap().clone()
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedLlm {
    async fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    async fn generate(&self, prompt: &str) -> Result<GenerationResult> {
        self.generate_with_config(prompt, &Self::own_settings()).await
    }

    async fn generate_with_config(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<GenerationResult> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.configs.lock().unwrap().push(config.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(Error::LLMProvider("script exhausted".to_string())))?;

        Ok(GenerationResult {
            text: reply,
            model_id: "scripted".to_string(),
            tokens_used: None,
        })
    }

    fn model_id(&self) -> &str {
        "scripted"
    }
}

//! Question answering over the indexed course material

use tracing::{error, warn};

use ragrade_core::{LLMProvider, QueryAnswer, RAGEngine, RAGQuery, VectorDocument};

use crate::context::format_context;
use crate::prompt::build_query_prompt;

/// Answers free-form questions from retrieved context
pub struct QaAssistant<L: LLMProvider, R: RAGEngine> {
    llm: L,
    rag: R,
    top_k: usize,
}

impl<L: LLMProvider, R: RAGEngine> QaAssistant<L, R> {
    pub fn new(llm: L, rag: R, top_k: usize) -> Self {
        Self { llm, rag, top_k }
    }

    pub fn rag(&self) -> &R {
        &self.rag
    }

    /// Answer a question; generator failures become an error answer
    pub async fn answer(&self, question: &str) -> QueryAnswer {
        let documents = self.retrieve(question).await;
        let prompt = build_query_prompt(&format_context(&documents), question);

        match self.llm.generate(&prompt).await {
            Ok(result) => QueryAnswer {
                question: question.to_string(),
                answer: result.text.trim().to_string(),
                num_sources: documents.len(),
                error: false,
            },
            Err(e) => {
                error!(error = %e, "error generating answer");
                QueryAnswer {
                    question: question.to_string(),
                    answer: format!("An error occurred: {}", e),
                    num_sources: documents.len(),
                    error: true,
                }
            }
        }
    }

    async fn retrieve(&self, question: &str) -> Vec<VectorDocument> {
        match self.rag.retrieve(&RAGQuery::new(question, self.top_k)).await {
            Ok(result) => result.documents,
            Err(e) => {
                warn!(error = %e, "context retrieval failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{rag_returning, ScriptedLlm};
    use insta::assert_yaml_snapshot;
    use ragrade_core::Error;

    #[tokio::test]
    async fn test_answer_counts_sources() {
        let assistant = QaAssistant::new(
            ScriptedLlm::replying(&["  ระบบวงปิดใช้สัญญาณป้อนกลับ\n"]),
            rag_returning(&["Closed-loop notes", "Feedback notes"]),
            5,
        );

        let answer = assistant.answer("ระบบวงปิดคืออะไร").await;

        assert_yaml_snapshot!(answer, @r###"
        question: ระบบวงปิดคืออะไร
        answer: ระบบวงปิดใช้สัญญาณป้อนกลับ
        num_sources: 2
        error: false
        "###);

        let prompt = &assistant.llm.prompts()[0];
        assert!(prompt.contains("[เอกสาร 2]\nFeedback notes"));
    }

    #[tokio::test]
    async fn test_generator_failure_becomes_error_answer() {
        let assistant = QaAssistant::new(
            ScriptedLlm::new(vec![Err(Error::Timeout("no reply".to_string()))]),
            rag_returning(&[]),
            5,
        );

        let answer = assistant.answer("What is a Nyquist plot?").await;

        assert!(answer.error);
        assert_eq!(answer.num_sources, 0);
        assert!(answer.answer.contains("no reply"));
    }

    #[tokio::test]
    async fn test_answer_uses_generator_settings() {
        let assistant = QaAssistant::new(ScriptedLlm::replying(&["answer"]), rag_returning(&[]), 5);

        assistant.answer("What is a pole?").await;

        let configs = assistant.llm.configs();
        let expected = ScriptedLlm::own_settings();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].timeout, expected.timeout);
        assert_eq!(configs[0].temperature, expected.temperature);
    }
}

//! Exam grader: retrieval, prompting, generation and parsing per answer

use tracing::{error, info, warn};

use ragrade_core::{
    ExamItem, ExamReport, GradedQuestion, GradingResult, LLMProvider, RAGEngine,
    RAGQuery, Result, VectorDocument,
};

use crate::aggregate::build_report;
use crate::config::GraderConfig;
use crate::context::format_context;
use crate::parser::{parse_grading_response, ParsedGrading, ScorePolicy};
use crate::prompt::build_grading_prompt;

/// Grades exam answers against reference answers using retrieved course material
pub struct ExamGrader<L: LLMProvider, R: RAGEngine> {
    llm: L,
    rag: R,
    config: GraderConfig,
}

impl<L: LLMProvider, R: RAGEngine> ExamGrader<L, R> {
    pub fn new(llm: L, rag: R, config: GraderConfig) -> Self {
        Self { llm, rag, config }
    }

    pub fn config(&self) -> &GraderConfig {
        &self.config
    }

    /// Grade a single answer out of `max_score`
    ///
    /// Never fails. A generator failure yields a zero-score record with
    /// `error` set and the failure described in `feedback`.
    pub async fn grade_answer(
        &self,
        question: &str,
        student_answer: &str,
        reference_answer: &str,
        max_score: u32,
    ) -> GradingResult {
        let documents = self.retrieve_context(question).await;
        let context = format_context(&documents);
        let prompt = build_grading_prompt(&context, question, student_answer, reference_answer);

        let (parsed, failed) = match self.generate(&prompt).await {
            Ok(response) => {
                let policy = ScorePolicy {
                    max_score,
                    ..self.config.score_policy()
                };
                let parsed = parse_grading_response(&response, &policy);
                info!(score = parsed.score, max_score, "graded question");
                (parsed, false)
            }
            Err(e) => {
                error!(error = %e, "error grading answer");
                let parsed = ParsedGrading {
                    score: 0,
                    is_correct: false,
                    feedback: format!("Grading failed: {}", e),
                    ..Default::default()
                };
                (parsed, true)
            }
        };

        GradingResult {
            question: question.to_string(),
            student_answer: student_answer.to_string(),
            reference_answer: reference_answer.to_string(),
            score: parsed.score,
            is_correct: parsed.is_correct,
            feedback: parsed.feedback,
            key_points_covered: parsed.key_points_covered,
            missing_points: parsed.missing_points,
            error: failed,
        }
    }

    /// Grade every item in order and aggregate the results
    ///
    /// Each question is scored out of the configured `max_score_per_question`.
    /// Questions are graded one at a time; a failed question never stops
    /// the rest of the exam.
    pub async fn grade_exam(&self, items: &[ExamItem]) -> ExamReport {
        let max_score_per_question = self.config.max_score_per_question;
        info!(questions = items.len(), max_score_per_question, "grading exam");

        let mut results = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            info!("Grading question {}/{}", index + 1, items.len());
            let result = self
                .grade_answer(
                    &item.question,
                    &item.student_answer,
                    &item.reference_answer,
                    max_score_per_question,
                )
                .await;

            results.push(GradedQuestion {
                question_number: index + 1,
                result,
            });
        }

        build_report(results, max_score_per_question, self.config.pass_threshold)
    }

    async fn retrieve_context(&self, question: &str) -> Vec<VectorDocument> {
        let query = RAGQuery::new(question, self.config.top_k);
        match self.rag.retrieve(&query).await {
            Ok(result) => result.documents,
            Err(e) => {
                warn!(error = %e, "context retrieval failed, grading without context");
                Vec::new()
            }
        }
    }

    /// Call the generator with its own settings, retrying with backoff
    async fn generate(&self, prompt: &str) -> Result<String> {
        let retry = &self.config.retry;
        let max_attempts = retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.llm.generate(prompt).await {
                Ok(result) => return Ok(result.text),
                Err(e) if attempt < max_attempts => {
                    let backoff = retry.backoff_for(attempt);
                    warn!(attempt, max_attempts, error = %e, "generator call failed, retrying in {:?}", backoff);
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

//! Grading pipeline for ragrade
//!
//! Retrieval, prompt construction, and the interpretation of free-form model
//! output into bounded grading records, plus exam-level aggregation and
//! report rendering.

mod aggregate;
mod assistant;
mod config;
mod context;
mod exam_file;
mod grader;
mod parser;
mod prompt;
mod report;

#[cfg(test)]
mod testing;

pub use aggregate::{build_report, summarize};
pub use assistant::QaAssistant;
pub use config::GraderConfig;
pub use context::{format_context, NO_CONTEXT_MARKER};
pub use exam_file::{companion_report_path, load_exam, save_report};
pub use grader::ExamGrader;
pub use parser::{parse_grading_response, ParsedGrading, ScorePolicy, FEEDBACK_PLACEHOLDER};
pub use prompt::{build_grading_prompt, build_query_prompt};
pub use report::render_report;

// Re-export core types for convenience
pub use ragrade_core::{
    Error, ExamItem, ExamReport, ExamSummary, GradedQuestion, GradingResult, QueryAnswer,
    Result, RetryConfig, ScoreScaling,
};

//! Common types used across the grading pipeline

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for retrying a failed generator call
///
/// `max_attempts` counts the first call, so the default of 1 means no retry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_secs(2),
            backoff_multiplier: 2,
        }
    }
}

impl RetryConfig {
    /// Retry up to `max_attempts` total calls with the default backoff
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Default::default()
        }
    }

    /// Delay to wait after the given failed attempt (1-based)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff.saturating_mul(factor)
    }
}

/// How a raw 0-100 score from the model is mapped onto `max_score`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreScaling {
    /// Bound the raw score to `[0, max_score]` without rescaling
    #[default]
    Clamp,
    /// Multiply by `max_score / 100`, then bound
    Rescale,
}

impl std::str::FromStr for ScoreScaling {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clamp" => Ok(ScoreScaling::Clamp),
            "rescale" => Ok(ScoreScaling::Rescale),
            other => Err(crate::Error::Configuration(format!(
                "Unknown score scaling '{}', expected 'clamp' or 'rescale'",
                other
            ))),
        }
    }
}

/// One question of an exam as read from the exam file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExamItem {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub student_answer: String,
    #[serde(default, rename = "correct_answer", alias = "reference_answer")]
    pub reference_answer: String,
}

impl ExamItem {
    pub fn new(
        question: impl Into<String>,
        student_answer: impl Into<String>,
        reference_answer: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            student_answer: student_answer.into(),
            reference_answer: reference_answer.into(),
        }
    }
}

/// Graded outcome for a single answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingResult {
    pub question: String,
    pub student_answer: String,
    pub reference_answer: String,
    pub score: u32,
    pub is_correct: bool,
    pub feedback: String,
    pub key_points_covered: Vec<String>,
    pub missing_points: Vec<String>,
    /// Set only when the generator call itself failed
    pub error: bool,
}

/// A grading result with its 1-based position in the exam
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradedQuestion {
    pub question_number: usize,
    #[serde(flatten)]
    pub result: GradingResult,
}

/// Pass/fail summary of an exam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamSummary {
    pub num_correct: usize,
    pub num_incorrect: usize,
    pub average_score: f64,
    pub pass: bool,
}

/// Aggregate result of grading a whole exam
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExamReport {
    pub results: Vec<GradedQuestion>,
    pub total_score: u64,
    pub max_score: u64,
    pub percentage: f64,
    pub num_questions: usize,
    pub summary: ExamSummary,
}

/// Answer produced by the question-answering assistant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub question: String,
    pub answer: String,
    pub num_sources: usize,
    pub error: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_yaml_snapshot;

    #[test]
    fn test_exam_item_reads_correct_answer_field() {
        let item: ExamItem = serde_json::from_str(
            r#"{"question": "What is a PID controller?", "student_answer": "A feedback controller", "correct_answer": "P, I and D terms"}"#,
        )
        .unwrap();

        assert_eq!(item.reference_answer, "P, I and D terms");
    }

    #[test]
    fn test_exam_item_accepts_reference_answer_alias() {
        let item: ExamItem = serde_json::from_str(
            r#"{"question": "q", "student_answer": "a", "reference_answer": "r"}"#,
        )
        .unwrap();

        assert_eq!(item.reference_answer, "r");
    }

    #[test]
    fn test_exam_item_missing_fields_default_to_empty() {
        let item: ExamItem = serde_json::from_str(r#"{"question": "q"}"#).unwrap();
        assert_eq!(item.student_answer, "");
        assert_eq!(item.reference_answer, "");
    }

    #[test]
    fn test_graded_question_is_flattened() {
        let graded = GradedQuestion {
            question_number: 2,
            result: GradingResult {
                question: "q".to_string(),
                student_answer: "a".to_string(),
                reference_answer: "r".to_string(),
                score: 40,
                is_correct: false,
                feedback: "Incomplete".to_string(),
                key_points_covered: vec![],
                missing_points: vec!["steady-state error".to_string()],
                error: false,
            },
        };

        assert_yaml_snapshot!(graded, @r###"
        question_number: 2
        question: q
        student_answer: a
        reference_answer: r
        score: 40
        is_correct: false
        feedback: Incomplete
        key_points_covered: []
        missing_points:
          - steady-state error
        error: false
        "###);
    }

    #[test]
    fn test_retry_backoff_grows() {
        let retry = RetryConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            backoff_multiplier: 2,
        };

        assert_eq!(retry.backoff_for(1), Duration::from_millis(100));
        assert_eq!(retry.backoff_for(2), Duration::from_millis(200));
        assert_eq!(retry.backoff_for(3), Duration::from_millis(400));
    }

    #[test]
    fn test_score_scaling_from_str() {
        assert_eq!("clamp".parse::<ScoreScaling>().unwrap(), ScoreScaling::Clamp);
        assert_eq!(" Rescale ".parse::<ScoreScaling>().unwrap(), ScoreScaling::Rescale);
        assert!("halve".parse::<ScoreScaling>().is_err());
    }

    #[test]
    fn test_retry_with_attempts_never_zero() {
        assert_eq!(RetryConfig::with_attempts(0).max_attempts, 1);
        assert_eq!(RetryConfig::default().max_attempts, 1);
    }
}

//! Exam-level totals and pass/fail summary

use ragrade_core::{ExamReport, ExamSummary, GradedQuestion};

/// Round to two decimal places, exact halves to even
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

/// Summarize graded questions against a pass threshold
///
/// The pass decision uses the unrounded average; only the reported
/// `average_score` is rounded.
pub fn summarize(results: &[GradedQuestion], pass_threshold: f64) -> ExamSummary {
    let num_questions = results.len();
    let num_correct = results.iter().filter(|r| r.result.is_correct).count();

    let average = if num_questions == 0 {
        0.0
    } else {
        let total: u64 = results.iter().map(|r| u64::from(r.result.score)).sum();
        total as f64 / num_questions as f64
    };

    ExamSummary {
        num_correct,
        num_incorrect: num_questions - num_correct,
        average_score: round2(average),
        pass: average >= pass_threshold,
    }
}

/// Build the exam report from results already in question order
pub fn build_report(
    results: Vec<GradedQuestion>,
    max_score_per_question: u32,
    pass_threshold: f64,
) -> ExamReport {
    let num_questions = results.len();
    let total_score: u64 = results.iter().map(|r| u64::from(r.result.score)).sum();
    let max_score = num_questions as u64 * u64::from(max_score_per_question);

    let percentage = if max_score == 0 {
        0.0
    } else {
        round2(total_score as f64 / max_score as f64 * 100.0)
    };

    let summary = summarize(&results, pass_threshold);

    ExamReport {
        results,
        total_score,
        max_score,
        percentage,
        num_questions,
        summary,
    }
}

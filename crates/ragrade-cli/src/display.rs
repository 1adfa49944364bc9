//! Coloured terminal summaries of grading output

use colored::*;
use ragrade_core::{ExamReport, GradingResult, QueryAnswer};

fn status_label(result: &GradingResult) -> ColoredString {
    if result.error {
        "ERROR".red().bold()
    } else if result.is_correct {
        "CORRECT".green().bold()
    } else {
        "INCORRECT".yellow().bold()
    }
}

/// One-question summary with feedback and points
pub fn format_grading_result(result: &GradingResult, max_score: u32) -> String {
    let mut lines = vec![
        format!("{} {}", "Question:".bold(), result.question),
        format!(
            "{} {}/{}  {}",
            "Score:".bold(),
            result.score,
            max_score,
            status_label(result)
        ),
        format!("{} {}", "Feedback:".bold(), result.feedback),
    ];

    for point in &result.key_points_covered {
        lines.push(format!("  {} {}", "+".green(), point));
    }
    for point in &result.missing_points {
        lines.push(format!("  {} {}", "-".red(), point));
    }

    lines.join("\n")
}

/// Per-question score table followed by exam totals
pub fn format_exam_summary(report: &ExamReport) -> String {
    let mut lines = Vec::with_capacity(report.results.len() + 4);

    for graded in &report.results {
        lines.push(format!(
            "Q{:<3} {:>3}  {}",
            graded.question_number,
            graded.result.score,
            status_label(&graded.result)
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "{} {}/{} ({:.2}%)",
        "Total:".bold(),
        report.total_score,
        report.max_score,
        report.percentage
    ));
    lines.push(format!(
        "{} {}/{} correct, average {:.2}",
        "Answers:".bold(),
        report.summary.num_correct,
        report.num_questions,
        report.summary.average_score
    ));

    let verdict = if report.summary.pass {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    lines.push(format!("{} {}", "Result:".bold(), verdict));

    lines.join("\n")
}

pub fn format_query_answer(answer: &QueryAnswer) -> String {
    if answer.error {
        return format!("{} {}", "Error:".red().bold(), answer.answer);
    }

    format!(
        "{}\n{}",
        answer.answer,
        format!("({} sources)", answer.num_sources).dimmed()
    )
}

pub fn print_grading_result(result: &GradingResult, max_score: u32) {
    println!("{}", format_grading_result(result, max_score));
}

pub fn print_exam_summary(report: &ExamReport) {
    println!("{}", format_exam_summary(report));
}

pub fn print_query_answer(answer: &QueryAnswer) {
    println!("{}", format_query_answer(answer));
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;
    use ragrade_core::{ExamSummary, GradedQuestion};

    fn result(score: u32, is_correct: bool, error: bool) -> GradingResult {
        GradingResult {
            question: "Why is feedback used?".to_string(),
            student_answer: "To correct errors".to_string(),
            reference_answer: "To reduce error and sensitivity".to_string(),
            score,
            is_correct,
            feedback: "Mostly right.".to_string(),
            key_points_covered: vec!["error correction".to_string()],
            missing_points: vec!["sensitivity".to_string()],
            error,
        }
    }

    #[test]
    fn test_format_grading_result() {
        colored::control::set_override(false);

        assert_snapshot!(format_grading_result(&result(70, true, false), 100), @r###"
        Question: Why is feedback used?
        Score: 70/100  CORRECT
        Feedback: Mostly right.
          + error correction
          - sensitivity
        "###);
    }

    #[test]
    fn test_format_exam_summary() {
        colored::control::set_override(false);

        let report = ExamReport {
            results: vec![
                GradedQuestion { question_number: 1, result: result(70, true, false) },
                GradedQuestion { question_number: 2, result: result(0, false, true) },
            ],
            total_score: 70,
            max_score: 200,
            percentage: 35.0,
            num_questions: 2,
            summary: ExamSummary {
                num_correct: 1,
                num_incorrect: 1,
                average_score: 35.0,
                pass: false,
            },
        };

        assert_snapshot!(format_exam_summary(&report), @r###"
        Q1    70  CORRECT
        Q2     0  ERROR

        Total: 70/200 (35.00%)
        Answers: 1/2 correct, average 35.00
        Result: FAIL
        "###);
    }

    #[test]
    fn test_format_query_answer_error() {
        colored::control::set_override(false);

        let answer = QueryAnswer {
            question: "q".to_string(),
            answer: "An error occurred: timeout".to_string(),
            num_sources: 0,
            error: true,
        };
        assert_eq!(format_query_answer(&answer), "Error: An error occurred: timeout");
    }
}

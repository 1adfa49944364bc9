//! Plain-text feedback report

use ragrade_core::ExamReport;

const HEAVY_RULE: &str = "============================================================";
const LIGHT_RULE: &str = "------------------------------------------------------------";

/// Render a graded exam as a human-readable report
///
/// Output depends only on the report, so the same report always renders
/// to the same text.
pub fn render_report(report: &ExamReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(HEAVY_RULE.to_string());
    lines.push("Exam Grading Report".to_string());
    lines.push(HEAVY_RULE.to_string());
    lines.push(String::new());
    lines.push(format!("Total score: {}/{}", report.total_score, report.max_score));
    lines.push(format!("Percentage: {:.2}%", report.percentage));
    lines.push(format!(
        "Correct answers: {}/{}",
        report.summary.num_correct, report.num_questions
    ));
    lines.push(format!("Average score: {:.2}", report.summary.average_score));
    lines.push(format!(
        "Result: {}",
        if report.summary.pass { "PASS" } else { "FAIL" }
    ));
    lines.push(String::new());
    lines.push(HEAVY_RULE.to_string());
    lines.push("Question Details".to_string());
    lines.push(HEAVY_RULE.to_string());
    lines.push(String::new());

    for graded in &report.results {
        let result = &graded.result;

        lines.push(format!("Question {}", graded.question_number));
        lines.push(format!("Question: {}", result.question));
        lines.push(format!("Score: {}", result.score));
        lines.push(format!(
            "Status: {}",
            if result.is_correct { "Correct" } else { "Incorrect" }
        ));
        lines.push(format!("\nStudent answer:\n{}", result.student_answer));
        lines.push(format!("\nReference answer:\n{}", result.reference_answer));
        lines.push(format!("\nFeedback:\n{}", result.feedback));

        if !result.key_points_covered.is_empty() {
            lines.push("\nKey points covered:".to_string());
            lines.extend(result.key_points_covered.iter().map(|p| format!("  - {}", p)));
        }

        if !result.missing_points.is_empty() {
            lines.push("\nMissing points:".to_string());
            lines.extend(result.missing_points.iter().map(|p| format!("  - {}", p)));
        }

        lines.push(format!("\n{}\n", LIGHT_RULE));
    }

    lines.join("\n")
}

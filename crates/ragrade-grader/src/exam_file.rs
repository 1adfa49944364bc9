//! Exam input and report output files

use std::path::{Path, PathBuf};
use tracing::info;

use ragrade_core::{Error, ExamItem, ExamReport, Result};

use crate::report::render_report;

/// Read an exam file: a JSON array of question records
pub async fn load_exam(path: &Path) -> Result<Vec<ExamItem>> {
    let content = tokio::fs::read_to_string(path).await?;
    let items: Vec<ExamItem> = serde_json::from_str(&content).map_err(|e| {
        Error::Serialization(format!("Invalid exam file {}: {}", path.display(), e))
    })?;

    info!(path = %path.display(), questions = items.len(), "loaded exam");
    Ok(items)
}

/// Path of the text report written next to a JSON report
pub fn companion_report_path(output: &Path) -> PathBuf {
    let companion = output.with_extension("txt");
    if companion == output {
        output.with_extension("report.txt")
    } else {
        companion
    }
}

/// Write the report as pretty JSON plus its rendered text companion
///
/// Returns the path of the text report.
pub async fn save_report(report: &ExamReport, output: &Path) -> Result<PathBuf> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let json = serde_json::to_string_pretty(report)?;
    tokio::fs::write(output, json).await?;

    let companion = companion_report_path(output);
    tokio::fs::write(&companion, render_report(report)).await?;

    info!(json = %output.display(), text = %companion.display(), "saved grading report");
    Ok(companion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::build_report;
    use ragrade_core::{GradedQuestion, GradingResult};
    use tempfile::TempDir;

    fn thai_report() -> ExamReport {
        build_report(
            vec![GradedQuestion {
                question_number: 1,
                result: GradingResult {
                    question: "ระบบควบคุมแบบวงปิดคืออะไร".to_string(),
                    student_answer: "ระบบที่มีการป้อนกลับ".to_string(),
                    reference_answer: "ระบบที่ใช้สัญญาณป้อนกลับ".to_string(),
                    score: 80,
                    is_correct: true,
                    feedback: "ดีมาก".to_string(),
                    key_points_covered: vec![],
                    missing_points: vec![],
                    error: false,
                },
            }],
            100,
            50.0,
        )
    }

    #[tokio::test]
    async fn test_load_exam() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exam.json");
        tokio::fs::write(
            &path,
            r#"[
                {"question": "What is a transfer function?", "student_answer": "Output over input", "correct_answer": "Laplace ratio of output to input"},
                {"question": "What is overshoot?", "student_answer": "Peak above setpoint"}
            ]"#,
        )
        .await
        .unwrap();

        let items = load_exam(&path).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].reference_answer, "Laplace ratio of output to input");
        assert_eq!(items[1].reference_answer, "");
    }

    #[tokio::test]
    async fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = load_exam(&dir.path().join("missing.json")).await.unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("exam.json");
        tokio::fs::write(&path, r#"{"question": "not an array"}"#).await.unwrap();

        let err = load_exam(&path).await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[tokio::test]
    async fn test_save_report_preserves_non_ascii() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("results").join("graded.json");

        let companion = save_report(&thai_report(), &output).await.unwrap();

        assert_eq!(companion, dir.path().join("results").join("graded.txt"));

        let json = tokio::fs::read_to_string(&output).await.unwrap();
        assert!(json.contains("ระบบควบคุมแบบวงปิดคืออะไร"));
        assert!(json.contains("\n  \"results\": ["));
        assert!(json.contains("\"reference_answer\""));

        let reloaded: ExamReport = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, thai_report());

        let text = tokio::fs::read_to_string(&companion).await.unwrap();
        assert!(text.contains("Total score: 80/100"));
        assert!(text.contains("ดีมาก"));
    }

    #[test]
    fn test_companion_report_path() {
        assert_eq!(companion_report_path(Path::new("out/graded.json")), PathBuf::from("out/graded.txt"));
        assert_eq!(companion_report_path(Path::new("graded")), PathBuf::from("graded.txt"));
        assert_eq!(companion_report_path(Path::new("graded.txt")), PathBuf::from("graded.report.txt"));
    }
}

//! Interpretation of raw model output as a grading record
//!
//! Model output is untrusted text. It may be clean JSON, JSON wrapped in a
//! markdown fence, JSON buried in prose, or prose with no JSON at all.
//! [`parse_grading_response`] runs an ordered list of strategies and falls
//! back to text mining, so every input yields a complete record whose score
//! lies in `[0, max_score]`.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, warn};

use ragrade_core::ScoreScaling;

/// Feedback used when the model gave none
pub const FEEDBACK_PLACEHOLDER: &str = "Could not analyze the answer.";

/// Words that mark an answer as correct in free text, matched case-insensitively
const AFFIRMATIVE_TOKENS: &[&str] = &["true", "ถูกต้อง", "correct"];

/// First brace-delimited span allowing one level of nested objects
static JSON_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").expect("JSON object pattern is valid")
});

/// Score patterns in priority order; the first that matches wins
static SCORE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#""score"\s*:\s*([0-9]+)"#,
        r#"score["\s:]+([0-9]+)"#,
        r"คะแนน[:\s]*([0-9]+)",
        r"([0-9]+)\s*/\s*100\b",
        r"([0-9]+)\s*%",
    ]
    .iter()
    .map(|p| {
        RegexBuilder::new(p)
            .case_insensitive(true)
            .build()
            .expect("score pattern is valid")
    })
    .collect()
});

/// Maps raw scores onto `[0, max_score]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScorePolicy {
    pub max_score: u32,
    pub scaling: ScoreScaling,
}

impl ScorePolicy {
    pub fn new(max_score: u32, scaling: ScoreScaling) -> Self {
        Self { max_score, scaling }
    }

    /// Clamping policy for `max_score`
    pub fn clamp(max_score: u32) -> Self {
        Self::new(max_score, ScoreScaling::Clamp)
    }

    /// Convert a raw model score into a bounded integer score
    ///
    /// Fractions are truncated toward zero after any rescaling.
    pub fn normalize(&self, raw: f64) -> u32 {
        if raw.is_nan() {
            return 0;
        }

        let max = f64::from(self.max_score);
        let scaled = match self.scaling {
            ScoreScaling::Clamp => raw,
            ScoreScaling::Rescale => raw * max / 100.0,
        };

        scaled.trunc().clamp(0.0, max) as u32
    }
}

/// A schema-complete grading record, before the question is attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedGrading {
    pub score: u32,
    pub is_correct: bool,
    pub feedback: String,
    pub key_points_covered: Vec<String>,
    pub missing_points: Vec<String>,
}

impl Default for ParsedGrading {
    fn default() -> Self {
        Self {
            score: 0,
            is_correct: false,
            feedback: FEEDBACK_PLACEHOLDER.to_string(),
            key_points_covered: Vec::new(),
            missing_points: Vec::new(),
        }
    }
}

/// A parsing attempt that may decline the input
type Strategy = fn(&str, &ScorePolicy) -> Option<ParsedGrading>;

/// Structured strategies, tried in order before text mining
const STRATEGIES: &[(&str, Strategy)] = &[("json", parse_json_payload)];

/// Interpret raw model output as a grading record
///
/// Never fails: if no structured strategy accepts the text, the score and
/// correctness are mined from it and the whole text becomes the feedback.
pub fn parse_grading_response(raw: &str, policy: &ScorePolicy) -> ParsedGrading {
    for (name, strategy) in STRATEGIES {
        if let Some(parsed) = strategy(raw, policy) {
            debug!(strategy = name, score = parsed.score, "parsed grading response");
            return parsed;
        }
    }

    warn!("could not parse grading response as JSON, falling back to text mining");
    mine_text(raw, policy)
}

/// Fence stripping, object location and strict JSON parsing
fn parse_json_payload(raw: &str, policy: &ScorePolicy) -> Option<ParsedGrading> {
    let candidate = strip_code_fence(raw.trim());

    let object = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => map,
        _ => {
            let located = JSON_OBJECT.find(candidate)?.as_str();
            match serde_json::from_str::<Value>(located) {
                Ok(Value::Object(map)) => map,
                _ => return None,
            }
        }
    };

    Some(from_json_object(&object, policy))
}

/// Return the interior of a leading triple-backtick fence, minus its language tag
fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };

    let body = match rest.find("```") {
        Some(end) => &rest[..end],
        None => rest,
    };

    match body.split_once('\n') {
        Some((tag, interior)) if is_language_tag(tag) => interior.trim(),
        _ => body.trim(),
    }
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '+')
}

/// Overlay validated fields onto a default record
///
/// Missing and wrongly typed fields both keep their defaults.
fn from_json_object(object: &Map<String, Value>, policy: &ScorePolicy) -> ParsedGrading {
    let mut parsed = ParsedGrading::default();

    if let Some(raw) = object.get("score").and_then(score_value) {
        parsed.score = policy.normalize(raw);
    }

    if let Some(is_correct) = object.get("is_correct").and_then(Value::as_bool) {
        parsed.is_correct = is_correct;
    }

    if let Some(feedback) = object.get("feedback").and_then(Value::as_str) {
        if !feedback.trim().is_empty() {
            parsed.feedback = feedback.to_string();
        }
    }

    if let Some(points) = object.get("key_points_covered").and_then(string_list) {
        parsed.key_points_covered = points;
    }

    if let Some(points) = object.get("missing_points").and_then(string_list) {
        parsed.missing_points = points;
    }

    parsed
}

fn score_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn string_list(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

/// Last-resort extraction from free text; always produces a record
fn mine_text(raw: &str, policy: &ScorePolicy) -> ParsedGrading {
    let score = SCORE_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(raw))
        .and_then(|caps| caps.get(1))
        .map(|digits| {
            // Digit runs too long for u64 saturate, then clamp like any other score
            let value = digits.as_str().parse::<u64>().unwrap_or(u64::MAX);
            policy.normalize(value as f64)
        })
        .unwrap_or(0);

    let lowered = raw.to_lowercase();
    let is_correct = AFFIRMATIVE_TOKENS.iter().any(|token| lowered.contains(token));

    let feedback = if raw.trim().is_empty() {
        FEEDBACK_PLACEHOLDER.to_string()
    } else {
        raw.to_string()
    };

    ParsedGrading {
        score,
        is_correct,
        feedback,
        key_points_covered: Vec::new(),
        missing_points: Vec::new(),
    }
}

//! Grader configuration

use ragrade_core::{Error, Result, RetryConfig, ScoreScaling};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::parser::ScorePolicy;

pub const DEFAULT_MAX_SCORE: u32 = 100;
pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_PASS_THRESHOLD: f64 = 50.0;

/// Settings for grading an exam
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraderConfig {
    pub max_score_per_question: u32,
    pub top_k: usize,
    /// Minimum unrounded average score for a pass
    pub pass_threshold: f64,
    pub score_scaling: ScoreScaling,
    pub retry: RetryConfig,
}

impl Default for GraderConfig {
    fn default() -> Self {
        Self {
            max_score_per_question: DEFAULT_MAX_SCORE,
            top_k: DEFAULT_TOP_K,
            pass_threshold: DEFAULT_PASS_THRESHOLD,
            score_scaling: ScoreScaling::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl GraderConfig {
    /// Create configuration from environment variables
    ///
    /// Reads `RAGRADE_MAX_SCORE`, `RAGRADE_TOP_K`, `RAGRADE_PASS_THRESHOLD`,
    /// `RAGRADE_SCORE_SCALING` and `RAGRADE_RETRIES`; unset variables keep
    /// their defaults.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup("RAGRADE_MAX_SCORE") {
            config.max_score_per_question = parse_var("RAGRADE_MAX_SCORE", &raw)?;
        }
        if let Some(raw) = lookup("RAGRADE_TOP_K") {
            config.top_k = parse_var("RAGRADE_TOP_K", &raw)?;
        }
        if let Some(raw) = lookup("RAGRADE_PASS_THRESHOLD") {
            config.pass_threshold = parse_var("RAGRADE_PASS_THRESHOLD", &raw)?;
        }
        if let Some(raw) = lookup("RAGRADE_SCORE_SCALING") {
            config.score_scaling = raw.parse()?;
        }
        if let Some(raw) = lookup("RAGRADE_RETRIES") {
            config.retry = RetryConfig::with_attempts(parse_var("RAGRADE_RETRIES", &raw)?);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_max_score(mut self, max_score: u32) -> Self {
        self.max_score_per_question = max_score;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_score_scaling(mut self, scaling: ScoreScaling) -> Self {
        self.score_scaling = scaling;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Score policy for the configured maximum and scaling
    pub fn score_policy(&self) -> ScorePolicy {
        ScorePolicy::new(self.max_score_per_question, self.score_scaling)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::Configuration("top_k must be at least 1".to_string()));
        }
        if !self.pass_threshold.is_finite() || self.pass_threshold < 0.0 {
            return Err(Error::Configuration(format!(
                "pass_threshold must be a non-negative number, got {}",
                self.pass_threshold
            )));
        }
        Ok(())
    }
}

fn parse_var<T: FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Configuration(format!("{} has an invalid value '{}'", name, raw)))
}

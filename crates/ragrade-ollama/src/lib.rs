//! Ollama integration for ragrade
//!
//! This crate provides the Ollama implementation of the LLMProvider trait.

mod client;
mod config;


pub use client::OllamaClient;
pub use config::OllamaConfig;

// Re-export core types for convenience
pub use ragrade_core::{LLMProvider, GenerationConfig, GenerationResult, Error, Result};

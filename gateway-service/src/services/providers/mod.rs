//! Generative AI provider abstraction.
//!
//! The gateway never talks to the model API directly from a handler;
//! everything goes through this trait so tests can inject a fake.

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::dtos::{ChatMessage, DiagnosisResult};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Knobs forwarded to the model, all optional.
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

pub struct GeneratedText {
    pub text: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
}

#[async_trait]
pub trait GenerativeProvider: Send + Sync {
    /// Single-shot text generation.
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GeneratedText, ProviderError>;

    /// Structured crop-disease diagnosis from an image.
    async fn analyze_image(
        &self,
        image_b64: &str,
        mime_type: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<DiagnosisResult, ProviderError>;

    /// Multi-turn conversation; `messages` is the full history, oldest first.
    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, ProviderError>;

    async fn health_check(&self) -> Result<(), ProviderError>;
}

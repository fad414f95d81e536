//! Handlers for the generative proxy operations.

use axum::{Json, extract::State};
use base64::Engine as _;
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::{
    ChatRequest, ChatResponse, DiagnosisResult, GenerationRequest, GenerationResponse,
    ImageAnalysisRequest, TokenUsage,
};
use crate::services::providers::GenerationOptions;
use crate::startup::AppState;

/// Reply when a chat starts with no history.
const CHAT_GREETING: &str = "I can help you with farming advice, weather, market prices, and \
     crop diseases. What would you like to know?";

pub async fn generate_text(
    State(state): State<AppState>,
    Json(req): Json<GenerationRequest>,
) -> Result<Json<GenerationResponse>, AppError> {
    req.validate()?;

    let options = GenerationOptions {
        system_instruction: req.system_instruction,
        temperature: req.temperature,
        max_tokens: req.max_tokens,
    };

    let generated = state
        .generative
        .generate(&req.prompt, &options)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Text generation upstream failed");
            AppError::Upstream("Failed to generate text".to_string())
        })?;

    Ok(Json(GenerationResponse {
        text: generated.text,
        usage: TokenUsage {
            input_tokens: generated.input_tokens,
            output_tokens: generated.output_tokens,
        },
    }))
}

pub async fn analyze_image(
    State(state): State<AppState>,
    Json(req): Json<ImageAnalysisRequest>,
) -> Result<Json<DiagnosisResult>, AppError> {
    req.validate()?;

    if !req.mime_type.starts_with("image/") {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "mimeType must be an image type"
        )));
    }
    base64::engine::general_purpose::STANDARD
        .decode(&req.image)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("image must be base64-encoded")))?;

    let options = GenerationOptions {
        system_instruction: req.system_instruction,
        ..Default::default()
    };

    let mut diagnosis = state
        .generative
        .analyze_image(&req.image, &req.mime_type, &req.prompt, &options)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, mime_type = %req.mime_type, "Image diagnosis upstream failed");
            AppError::Upstream("Failed to analyze image".to_string())
        })?;

    // The provider already clamps; enforce the contract here regardless of
    // which implementation produced the result.
    diagnosis.confidence = diagnosis.confidence.clamp(0.0, 1.0);

    Ok(Json(diagnosis))
}

pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    if req.messages.is_empty() {
        return Ok(Json(ChatResponse {
            response: CHAT_GREETING.to_string(),
        }));
    }

    let options = GenerationOptions {
        system_instruction: req.system_instruction,
        temperature: req.temperature,
        ..Default::default()
    };

    let response = state
        .generative
        .chat(&req.messages, &options)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, turns = req.messages.len(), "Chat upstream failed");
            AppError::Upstream("Chat request failed".to_string())
        })?;

    Ok(Json(ChatResponse { response }))
}

//! Wire payloads for the generative proxy operations.
//!
//! Field names are camelCase on the wire to match the client contract.

use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub text: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenUsage {
    pub input_tokens: i32,
    pub output_tokens: i32,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ImageAnalysisRequest {
    /// Base64-encoded image bytes
    #[validate(length(min = 1, message = "image must not be empty"))]
    pub image: String,
    #[validate(length(min = 1, message = "mimeType must not be empty"))]
    pub mime_type: String,
    #[validate(length(min = 1, message = "prompt must not be empty"))]
    pub prompt: String,
    pub system_instruction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub is_healthy: bool,
    pub disease_name: String,
    pub confidence: f64,
    pub severity: Severity,
    pub symptoms: Vec<String>,
    pub treatment: Treatment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub chemical: ChemicalTreatment,
    pub organic: OrganicTreatment,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChemicalTreatment {
    pub product_name: String,
    pub dosage: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganicTreatment {
    pub name: String,
    pub preparation: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub system_instruction: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
}

//! Gemini AI provider implementation.
//!
//! Proxies generation, vision diagnosis, and chat through Google's Gemini
//! REST API. The API key stays server-side; clients never see it.

use super::{GeneratedText, GenerationOptions, GenerativeProvider, ProviderError};
use crate::dtos::{ChatMessage, DiagnosisResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Gemini API base URL.
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub text_model: String,
    pub vision_model: String,
    pub timeout: std::time::Duration,
}

pub struct GeminiProvider {
    config: GeminiConfig,
    client: Client,
}

impl GeminiProvider {
    pub fn new(config: GeminiConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn api_url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            GEMINI_API_BASE, model, method, self.config.api_key
        )
    }

    fn generation_config(&self, options: &GenerationOptions) -> GenerationConfig {
        GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_tokens,
            response_mime_type: None,
            response_schema: None,
        }
    }

    fn system_content(options: &GenerationOptions) -> Option<Content> {
        options.system_instruction.as_ref().map(|text| Content {
            role: None,
            parts: vec![ContentPart::Text { text: text.clone() }],
        })
    }

    async fn call_generate(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ProviderError> {
        let url = self.api_url(model, "generateContent");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }

            return Err(ProviderError::ApiError(format!(
                "Gemini API error {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))
    }

    fn extract_text(response: &GenerateContentResponse) -> Result<String, ProviderError> {
        let candidate = response
            .candidates
            .first()
            .ok_or_else(|| ProviderError::ApiError("Response contained no candidates".into()))?;

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(ProviderError::ContentFiltered);
        }

        candidate
            .content
            .parts
            .iter()
            .find_map(|p| match p {
                ContentPart::Text { text } => Some(text.clone()),
                _ => None,
            })
            .ok_or_else(|| ProviderError::ApiError("Response contained no text part".into()))
    }

    fn usage(response: &GenerateContentResponse) -> (i32, i32) {
        let usage = response.usage_metadata.clone().unwrap_or_default();
        (
            usage.prompt_token_count.unwrap_or(0),
            usage.candidates_token_count.unwrap_or(0),
        )
    }
}

#[async_trait]
impl GenerativeProvider for GeminiProvider {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<GeneratedText, ProviderError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![ContentPart::Text {
                    text: prompt.to_string(),
                }],
            }],
            system_instruction: Self::system_content(options),
            generation_config: Some(self.generation_config(options)),
        };

        tracing::debug!(
            model = %self.config.text_model,
            prompt_len = prompt.len(),
            "Sending generation request to Gemini"
        );

        let response = self.call_generate(&self.config.text_model, &request).await?;
        let text = Self::extract_text(&response)?;
        let (input_tokens, output_tokens) = Self::usage(&response);

        Ok(GeneratedText {
            text,
            input_tokens,
            output_tokens,
        })
    }

    async fn analyze_image(
        &self,
        image_b64: &str,
        mime_type: &str,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<DiagnosisResult, ProviderError> {
        let mut generation_config = self.generation_config(options);
        generation_config.response_mime_type = Some("application/json".to_string());
        generation_config.response_schema = Some(diagnosis_schema());

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::InlineData {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: image_b64.to_string(),
                        },
                    },
                ],
            }],
            system_instruction: Self::system_content(options),
            generation_config: Some(generation_config),
        };

        tracing::debug!(
            model = %self.config.vision_model,
            mime_type = %mime_type,
            image_len = image_b64.len(),
            "Sending diagnosis request to Gemini"
        );

        let response = self
            .call_generate(&self.config.vision_model, &request)
            .await?;
        let text = Self::extract_text(&response)?;

        let mut diagnosis: DiagnosisResult = serde_json::from_str(&text).map_err(|e| {
            ProviderError::ApiError(format!("Diagnosis output did not match schema: {}", e))
        })?;
        diagnosis.confidence = diagnosis.confidence.clamp(0.0, 1.0);
        Ok(diagnosis)
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let contents: Vec<Content> = messages
            .iter()
            .map(|m| Content {
                // Gemini calls the assistant role "model"
                role: Some(if m.role == "assistant" {
                    "model".to_string()
                } else {
                    "user".to_string()
                }),
                parts: vec![ContentPart::Text {
                    text: m.content.clone(),
                }],
            })
            .collect();

        let request = GenerateContentRequest {
            contents,
            system_instruction: Self::system_content(options),
            generation_config: Some(self.generation_config(options)),
        };

        tracing::debug!(
            model = %self.config.text_model,
            turns = messages.len(),
            "Sending chat request to Gemini"
        );

        let response = self.call_generate(&self.config.text_model, &request).await?;
        Self::extract_text(&response)
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        if self.config.api_key.is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key not configured".to_string(),
            ));
        }

        let url = format!("{}/models?key={}", GEMINI_API_BASE, self.config.api_key);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(ProviderError::ApiError(format!(
                "Health check failed: {}",
                response.status()
            )))
        }
    }
}

/// Response schema constraining the diagnosis output to the client shape.
fn diagnosis_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "isHealthy": { "type": "BOOLEAN" },
            "diseaseName": { "type": "STRING" },
            "confidence": { "type": "NUMBER" },
            "severity": { "type": "STRING", "enum": ["low", "medium", "high"] },
            "symptoms": { "type": "ARRAY", "items": { "type": "STRING" } },
            "treatment": {
                "type": "OBJECT",
                "properties": {
                    "chemical": {
                        "type": "OBJECT",
                        "properties": {
                            "productName": { "type": "STRING" },
                            "dosage": { "type": "STRING" }
                        },
                        "required": ["productName", "dosage"]
                    },
                    "organic": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING" },
                            "preparation": { "type": "STRING" }
                        },
                        "required": ["name", "preparation"]
                    }
                },
                "required": ["chemical", "organic"]
            }
        },
        "required": ["isHealthy", "diseaseName", "confidence", "severity", "symptoms", "treatment"]
    })
}

// ============================================================================
// Gemini API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum ContentPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Content,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<i32>,
    candidates_token_count: Option<i32>,
}

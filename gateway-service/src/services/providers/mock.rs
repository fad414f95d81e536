//! Mock provider implementation for testing.

use super::{GeneratedText, GenerationOptions, GenerativeProvider, ProviderError};
use crate::dtos::{
    ChatMessage, ChemicalTreatment, DiagnosisResult, OrganicTreatment, Severity, Treatment,
};
use async_trait::async_trait;

/// Deterministic stand-in for the Gemini provider. Mirrors the keyword
/// branching of the real assistant prompts closely enough for endpoint
/// tests to make meaningful assertions.
pub struct MockGenerativeProvider {
    /// Confidence reported by diagnoses; deliberately settable out of
    /// [0, 1] to exercise the gateway's clamping.
    confidence: f64,
}

impl MockGenerativeProvider {
    pub fn new() -> Self {
        Self { confidence: 0.87 }
    }

    pub fn with_confidence(confidence: f64) -> Self {
        Self { confidence }
    }
}

impl Default for MockGenerativeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerativeProvider for MockGenerativeProvider {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<GeneratedText, ProviderError> {
        Ok(GeneratedText {
            text: format!("Mock response for: {}", prompt),
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 10,
        })
    }

    async fn analyze_image(
        &self,
        _image_b64: &str,
        _mime_type: &str,
        _prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<DiagnosisResult, ProviderError> {
        Ok(DiagnosisResult {
            is_healthy: false,
            disease_name: "Late Blight".to_string(),
            confidence: self.confidence,
            severity: Severity::Medium,
            symptoms: vec![
                "Water-soaked lesions".to_string(),
                "White fungal growth".to_string(),
            ],
            treatment: Treatment {
                chemical: ChemicalTreatment {
                    product_name: "Mancozeb 75% WP".to_string(),
                    dosage: "2.5g/L".to_string(),
                },
                organic: OrganicTreatment {
                    name: "Copper Hydroxide".to_string(),
                    preparation: "Mix 3g/L".to_string(),
                },
            },
        })
    }

    async fn chat(
        &self,
        messages: &[ChatMessage],
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let last = messages
            .last()
            .map(|m| m.content.to_lowercase())
            .unwrap_or_default();

        let response = if last.contains("price") {
            "Based on current market data, wheat is trading at Rs 2,450 per quintal. \
             Prices have been stable this week."
        } else if last.contains("weather") {
            "Current weather shows partly cloudy skies with temperature around 28°C. \
             Good conditions for field work."
        } else {
            "I can help you with farming advice, weather, market prices, and crop \
             diseases. What would you like to know?"
        };

        Ok(response.to_string())
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}

// src/services/vision.rs
use crate::errors::CropDoctorError;
use crate::models::{AnalysisResult, EncodedImage};
use crate::prompts::DIAGNOSIS_PROMPT;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

pub const MODEL: &str = "gpt-4o";
pub const MAX_TOKENS: u32 = 1000;
pub const DEFAULT_API_BASE: &str = "https://models.inference.ai.azure.com";

/// Seam between the gateway and whatever answers diagnosis requests.
/// Production uses [`VisionService`]; tests substitute a scripted mock.
#[async_trait]
pub trait DiagnosisProvider: Send + Sync {
    async fn diagnose(&self, image: &EncodedImage) -> Result<AnalysisResult, CropDoctorError>;
}

/// Talks the OpenAI-compatible chat-completions protocol. One blocking
/// round trip per request; no retries, no streaming.
pub struct VisionService {
    api_key: String,
    api_base: String,
    client: Client,
}

impl VisionService {
    pub fn new(api_key: String, api_base: Option<String>) -> Self {
        Self {
            api_key,
            api_base: api_base.unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl DiagnosisProvider for VisionService {
    async fn diagnose(&self, image: &EncodedImage) -> Result<AnalysisResult, CropDoctorError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": MODEL,
                "messages": [{
                    "role": "user",
                    "content": [
                        {
                            "type": "text",
                            "text": DIAGNOSIS_PROMPT
                        },
                        {
                            "type": "image_url",
                            "image_url": {
                                "url": image.as_data_uri()
                            }
                        }
                    ]
                }],
                "max_tokens": MAX_TOKENS
            }))
            .send()
            .await
            .map_err(|e| CropDoctorError::AnalysisFailed(format!("provider request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CropDoctorError::AnalysisFailed(format!(
                "provider returned {}: {}",
                status, error_text
            )));
        }

        let result: serde_json::Value = response.json().await.map_err(|e| {
            CropDoctorError::AnalysisFailed(format!("failed to parse provider response: {}", e))
        })?;

        let content = result["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                CropDoctorError::AnalysisFailed("no content in provider response".to_string())
            })?;

        // Relayed verbatim; nothing downstream depends on its shape.
        Ok(AnalysisResult(content.to_string()))
    }
}

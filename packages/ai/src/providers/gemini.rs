//! Google Gemini provider implementation.
//!
//! Uses the `generateContent` endpoint with a JSON response schema so
//! the model returns structured `{lat, lon, reasoning}` directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use store_map_models::{BoundingBox, GeoPoint, Hotspot};

use crate::prompt::{build_prompt, parse_hotspot, response_schema};
use crate::{PredictionError, PredictionService};

/// Gemini API provider.
pub struct GeminiPredictor {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiPredictor {
    /// Creates a new Gemini provider.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(
            api_key,
            model,
            "https://generativelanguage.googleapis.com/v1beta".to_string(),
        )
    }

    /// Creates a provider against a custom API base URL.
    #[must_use]
    pub fn with_base_url(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            model,
            base_url,
            client: reqwest::Client::new(),
        }
    }
}

/// Gemini API request body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: serde_json::Value,
}

/// Gemini API response body.
#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiResponseContent,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    parts: Vec<GeminiResponsePart>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: String,
}

/// Gemini API error response.
#[derive(Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: String,
}

#[async_trait]
impl PredictionService for GeminiPredictor {
    async fn predict(
        &self,
        region_name: &str,
        points: &[GeoPoint],
        bbox: &BoundingBox,
    ) -> Result<Hotspot, PredictionError> {
        let prompt = build_prompt(region_name, points, bbox);

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: &prompt }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: response_schema(),
            },
        };

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        );
        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err: GeminiError = serde_json::from_str(&body).unwrap_or_else(|_| GeminiError {
                error: GeminiErrorDetail {
                    message: format!("HTTP {status}: {body}"),
                },
            });
            return Err(PredictionError::InvalidResponse {
                message: err.error.message,
            });
        }

        let response: GeminiResponse = serde_json::from_str(&body)?;
        let text = response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim())
            .ok_or_else(|| PredictionError::InvalidResponse {
                message: "Gemini response contained no candidates".to_string(),
            })?;

        let payload: serde_json::Value = serde_json::from_str(text).map_err(|e| {
            PredictionError::InvalidResponse {
                message: format!("Gemini returned non-JSON payload: {e}"),
            }
        })?;

        parse_hotspot(&payload)
    }
}

//! `OpenAI` provider implementation.
//!
//! Uses the chat completions endpoint with `response_format:
//! json_object` to get a structured `{lat, lon, reasoning}` payload.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use store_map_models::{BoundingBox, GeoPoint, Hotspot};

use crate::prompt::{build_prompt, parse_hotspot};
use crate::{PredictionError, PredictionService};

const SYSTEM_PROMPT: &str = "You are a professional geospatial analyst. \
    Respond with a single JSON object containing the numeric keys \"lat\" \
    and \"lon\" and a string key \"reasoning\".";

/// `OpenAI` API provider.
pub struct OpenAiPredictor {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAiPredictor {
    /// Creates a new `OpenAI` provider.
    #[must_use]
    pub fn new(api_key: String, model: String) -> Self {
        Self::with_base_url(api_key, model, "https://api.openai.com/v1".to_string())
    }

    /// Creates a provider against an `OpenAI`-compatible base URL
    /// (Ollama, vLLM, LM Studio, ...).
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

/// `OpenAI` chat completion request body.
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAiMessage<'a>>,
    response_format: ResponseFormat,
    max_tokens: u32,
}

#[derive(Serialize)]
struct OpenAiMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// `OpenAI` chat completion response body.
#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

/// `OpenAI` API error response.
#[derive(Deserialize)]
struct OpenAiError {
    error: OpenAiErrorDetail,
}

#[derive(Deserialize)]
struct OpenAiErrorDetail {
    message: String,
}

#[async_trait]
impl PredictionService for OpenAiPredictor {
    async fn predict(
        &self,
        region_name: &str,
        points: &[GeoPoint],
        bbox: &BoundingBox,
    ) -> Result<Hotspot, PredictionError> {
        let prompt = build_prompt(region_name, points, bbox);

        let request = OpenAiRequest {
            model: &self.model,
            messages: vec![
                OpenAiMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                OpenAiMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
            max_tokens: 1024,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let err: OpenAiError = serde_json::from_str(&body).unwrap_or_else(|_| OpenAiError {
                error: OpenAiErrorDetail {
                    message: format!("HTTP {status}: {body}"),
                },
            });
            return Err(PredictionError::InvalidResponse {
                message: err.error.message,
            });
        }

        let response: OpenAiResponse = serde_json::from_str(&body)?;
        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .map(str::trim)
            .ok_or_else(|| PredictionError::InvalidResponse {
                message: "OpenAI response contained no choices".to_string(),
            })?;

        let payload: serde_json::Value = serde_json::from_str(text).map_err(|e| {
            PredictionError::InvalidResponse {
                message: format!("OpenAI returned non-JSON payload: {e}"),
            }
        })?;

        parse_hotspot(&payload)
    }
}

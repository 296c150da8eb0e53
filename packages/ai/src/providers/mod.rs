//! Prediction provider implementations and environment-based selection.
//!
//! Supports Google Gemini and `OpenAI` via the common
//! [`PredictionService`](crate::PredictionService) trait.

pub mod gemini;
pub mod openai;

use crate::{PredictionError, PredictionService};

/// Creates a prediction provider based on environment variables.
///
/// If `PREDICTOR` is explicitly set (`gemini` or `openai`), uses that
/// provider. Otherwise auto-detects from available credentials:
///
/// 1. `GEMINI_API_KEY` set -> Gemini
/// 2. `OPENAI_API_KEY` set -> `OpenAI`
///
/// The model can be overridden with `PREDICTOR_MODEL`.
///
/// # Errors
///
/// Returns [`PredictionError::Unavailable`] if no credentials are found
/// or the explicitly requested provider is not configured.
pub fn create_predictor_from_env() -> Result<Box<dyn PredictionService>, PredictionError> {
    let provider = match std::env::var("PREDICTOR") {
        Ok(explicit) => explicit,
        Err(_) => detect_provider()?,
    };

    match provider.to_lowercase().as_str() {
        "gemini" | "google" => {
            let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
                PredictionError::Unavailable {
                    message: "GEMINI_API_KEY environment variable not set".to_string(),
                }
            })?;
            let model = std::env::var("PREDICTOR_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string());
            Ok(Box::new(gemini::GeminiPredictor::new(api_key, model)))
        }
        "openai" | "gpt" => {
            let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
                PredictionError::Unavailable {
                    message: "OPENAI_API_KEY environment variable not set".to_string(),
                }
            })?;
            let model =
                std::env::var("PREDICTOR_MODEL").unwrap_or_else(|_| "gpt-4o".to_string());
            Ok(Box::new(openai::OpenAiPredictor::new(api_key, model)))
        }
        other => Err(PredictionError::Unavailable {
            message: format!("Unknown predictor: {other}. Use 'gemini' or 'openai'."),
        }),
    }
}

/// Auto-detects which provider to use based on available credentials.
fn detect_provider() -> Result<String, PredictionError> {
    if std::env::var("GEMINI_API_KEY").is_ok() {
        log::info!("Auto-detected predictor: Gemini (GEMINI_API_KEY found)");
        return Ok("gemini".to_string());
    }
    if std::env::var("OPENAI_API_KEY").is_ok() {
        log::info!("Auto-detected predictor: OpenAI (OPENAI_API_KEY found)");
        return Ok("openai".to_string());
    }
    Err(PredictionError::Unavailable {
        message: "No predictor credentials found. Set GEMINI_API_KEY or OPENAI_API_KEY, \
                  or set PREDICTOR explicitly."
            .to_string(),
    })
}

use std::sync::Once;
use async_trait::async_trait;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::GeminiSettings;
use crate::error::{DrawError, DrawResult};
use crate::models::{DrawConfig, DrawResponse};
use crate::services::draw_service::DrawService;
use crate::utils::join_numbers;

pub const CONNECTION_ERROR: &str = "Could not reach the AI draw machine. Please check and try again.";

/// Draw machine backed by the Gemini `generateContent` API
pub struct GeminiDrawService {
    settings: GeminiSettings,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Shape the model is asked to answer with. Numbers come back as JSON numbers,
/// which may carry a fractional part.
#[derive(Deserialize)]
struct ModelReply {
    #[serde(default)]
    results: Vec<f64>,
    error: Option<String>,
}

pub fn build_prompt(config: &DrawConfig, locked: &[i64]) -> String {
    format!(
        "You are a professional lottery draw system.\n\
         Draw {count} unique random numbers between {min} and {max} inclusive.\n\
         \n\
         ALREADY DRAWN (LOCKED) NUMBERS: {locked}.\n\
         \n\
         RULES:\n\
         1. NEVER pick any number from the locked list above.\n\
         2. New numbers must lie in [{min}, {max}].\n\
         3. If there are not enough numbers left (requested count > remaining numbers), \
         explain the problem in the 'error' field.\n\
         4. Return the newly drawn numbers in the 'results' array.",
        count = config.count,
        min = config.min,
        max = config.max,
        locked = join_numbers(locked),
    )
}

pub fn request_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "results": {
                        "type": "ARRAY",
                        "items": { "type": "NUMBER" },
                        "description": "The newly drawn random numbers."
                    },
                    "error": {
                        "type": "STRING",
                        "description": "Error message if the draw cannot be performed."
                    }
                },
                "required": ["results"]
            }
        }
    })
}

/// Parse the model's text as `{results, error?}`. Blank text reads as `{}`.
pub fn parse_reply(text: &str) -> Result<DrawResponse, String> {
    let text = if text.trim().is_empty() { "{}" } else { text };
    let reply: ModelReply = serde_json::from_str(text).map_err(|e| e.to_string())?;

    let mut results = Vec::with_capacity(reply.results.len());
    for n in reply.results {
        if n.fract() != 0.0 || !n.is_finite() {
            return Err(format!("non-integral number {}", n));
        }
        results.push(n as i64);
    }

    Ok(DrawResponse { results, error: reply.error })
}

fn response_text(response: GenerateContentResponse) -> Option<String> {
    let content = response.candidates.into_iter().next()?.content?;
    Some(content.parts.into_iter().filter_map(|p| p.text).collect())
}

static CRYPTO_PROVIDER: Once = Once::new();

/// awc's rustls connector needs a process-wide crypto provider before the
/// first client is built.
fn install_crypto_provider() {
    CRYPTO_PROVIDER.call_once(|| {
        if rustls::crypto::ring::default_provider().install_default().is_err() {
            debug!("A rustls crypto provider was already installed");
        }
    });
}

impl GeminiDrawService {
    pub fn new(settings: GeminiSettings) -> Self {
        install_crypto_provider();
        if settings.api_key.is_empty() {
            warn!("No API key configured; draws will fail until one is provided");
        }
        GeminiDrawService { settings }
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.settings.endpoint.trim_end_matches('/'),
            self.settings.model
        )
    }

    async fn generate(&self, prompt: &str) -> Result<String, String> {
        let client = awc::Client::builder().timeout(self.settings.timeout).finish();

        let mut response = client
            .post(self.url())
            .insert_header(("x-goog-api-key", self.settings.api_key.as_str()))
            .send_json(&request_body(prompt))
            .await
            .map_err(|e| format!("request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.body().await.unwrap_or_default();
            return Err(format!("endpoint answered {}: {}", status, String::from_utf8_lossy(&body)));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| format!("unreadable response: {}", e))?;

        response_text(parsed).ok_or_else(|| "response has no candidates".to_string())
    }
}

#[async_trait(?Send)]
impl DrawService for GeminiDrawService {
    async fn draw(&self, config: &DrawConfig, locked: &[i64]) -> DrawResult<DrawResponse> {
        info!(
            "Requesting {} numbers in [{}, {}] from {} ({} locked)",
            config.count, config.min, config.max, self.settings.model, locked.len()
        );
        let prompt = build_prompt(config, locked);
        debug!("Prompt: {}", prompt);

        let text = self.generate(&prompt).await.map_err(|cause| {
            warn!("Draw machine error: {}", cause);
            DrawError::Service(CONNECTION_ERROR.to_string())
        })?;
        debug!("Draw machine replied: {}", text);

        parse_reply(&text).map_err(|cause| {
            warn!("Could not parse draw machine reply {:?}: {}", text, cause);
            DrawError::Service(CONNECTION_ERROR.to_string())
        })
    }
}

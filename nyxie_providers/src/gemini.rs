use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use nyxie_core::{ChatMessage, CompletionError, CompletionRequest, LLMProvider, MediaAttachment};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Sampling parameters sent with every request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(default = "GenerationConfig::default_temperature")]
    pub temperature: f32,
    #[serde(default = "GenerationConfig::default_top_p")]
    pub top_p: f32,
    #[serde(default = "GenerationConfig::default_top_k")]
    pub top_k: u32,
    #[serde(default = "GenerationConfig::default_max_output_tokens")]
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: Self::default_temperature(),
            top_p: Self::default_top_p(),
            top_k: Self::default_top_k(),
            max_output_tokens: Self::default_max_output_tokens(),
        }
    }
}

impl GenerationConfig {
    const fn default_temperature() -> f32 {
        0.9
    }

    const fn default_top_p() -> f32 {
        0.95
    }

    const fn default_top_k() -> u32 {
        40
    }

    const fn default_max_output_tokens() -> u32 {
        2048
    }
}

pub struct GeminiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    generation: GenerationConfig,
}

impl GeminiProvider {
    #[must_use]
    pub fn new(api_key: String) -> Self {
        info!("Creating GeminiProvider");
        Self {
            client: Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            generation: GenerationConfig::default(),
        }
    }

    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_generation(mut self, generation: GenerationConfig) -> Self {
        self.generation = generation;
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_body(&self, request: &CompletionRequest) -> Value {
        let mut contents: Vec<Value> = request.history.iter().map(history_turn).collect();

        let mut parts = vec![json!({ "text": request.prompt })];
        if let Some(media) = &request.media {
            parts.push(inline_part(media));
        }
        contents.push(json!({ "role": "user", "parts": parts }));

        json!({
            "contents": contents,
            "generationConfig": {
                "temperature": self.generation.temperature,
                "topP": self.generation.top_p,
                "topK": self.generation.top_k,
                "maxOutputTokens": self.generation.max_output_tokens,
            },
        })
    }

    async fn try_send(&self, body: &Value) -> Result<String, CompletionError> {
        let response = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| CompletionError::Service(e.into()))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| CompletionError::Service(e.into()))?;
        let payload: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = payload["error"]["message"]
                .as_str()
                .map_or_else(|| raw.trim().to_string(), str::to_string);
            return Err(classify_error(status, &message));
        }

        extract_text(&payload)
    }
}

fn history_turn(message: &ChatMessage) -> Value {
    json!({
        "role": message.role.as_str(),
        "parts": [{ "text": message.content }],
    })
}

fn inline_part(media: &MediaAttachment) -> Value {
    json!({
        "inline_data": {
            "mime_type": media.mime_type(),
            "data": STANDARD.encode(&media.data),
        }
    })
}

/// Map a failed response onto the error the conversation layer branches on.
///
/// Only a rejected request (400) about its token count is a token-limit
/// failure. Quota and rate errors mention tokens and limits too, but shrinking
/// history does nothing for them.
fn classify_error(status: StatusCode, message: &str) -> CompletionError {
    let lowered = message.to_lowercase();
    let quota = status == StatusCode::TOO_MANY_REQUESTS
        || lowered.contains("quota")
        || lowered.contains("resource_exhausted")
        || lowered.contains("resource has been exhausted");
    let oversized = lowered.contains("token")
        && (lowered.contains("exceed") || lowered.contains("limit"));

    if status == StatusCode::BAD_REQUEST && oversized && !quota {
        return CompletionError::TokenLimitExceeded(message.to_string());
    }
    CompletionError::Service(anyhow::anyhow!("Gemini API returned {status}: {message}"))
}

fn extract_text(payload: &Value) -> Result<String, CompletionError> {
    let text: String = payload["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|part| part["text"].as_str())
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(CompletionError::EmptyResponse);
    }
    Ok(text)
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = self.build_body(request);

        info!(
            "Sending request to Gemini API: model={}, history={}, media={}",
            self.model,
            request.history.len(),
            request.media.is_some()
        );

        let text = self.try_send(&body).await?;

        debug!("Received {} bytes from Gemini API", text.len());
        Ok(text)
    }

    fn get_default_model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nyxie_core::{MediaKind, Role};

    fn request(media: Option<MediaAttachment>) -> CompletionRequest {
        CompletionRequest {
            history: vec![
                ChatMessage {
                    role: Role::User,
                    content: "hi".to_string(),
                },
                ChatMessage {
                    role: Role::Model,
                    content: "hello!".to_string(),
                },
            ],
            prompt: "persona\n\nUser message: what now".to_string(),
            media,
        }
    }

    #[test]
    fn test_body_layout() {
        let provider = GeminiProvider::new("key".to_string());
        let body = provider.build_body(&request(None));

        let contents = body["contents"].as_array().map(Vec::len);
        assert_eq!(contents, Some(3));
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["text"], "hello!");
        assert_eq!(body["contents"][2]["role"], "user");
        assert_eq!(
            body["contents"][2]["parts"][0]["text"],
            "persona\n\nUser message: what now"
        );
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_model_override() {
        let provider = GeminiProvider::new("key".to_string());
        assert_eq!(provider.get_default_model(), "gemini-2.0-flash-exp");

        let provider = provider.with_model("gemini-1.5-pro".to_string());
        assert_eq!(provider.get_default_model(), "gemini-1.5-pro");
        assert_eq!(provider.model(), "gemini-1.5-pro");
    }

    #[test]
    fn test_body_with_media() {
        let provider = GeminiProvider::new("key".to_string());
        let media = MediaAttachment::new(MediaKind::Image, vec![1, 2, 3]);
        let body = provider.build_body(&request(Some(media)));

        let inline = &body["contents"][2]["parts"][1]["inline_data"];
        assert_eq!(inline["mime_type"], "image/jpeg");
        assert_eq!(inline["data"], "AQID");
    }

    #[test]
    fn test_classify_token_limit() {
        let err = classify_error(
            StatusCode::BAD_REQUEST,
            "The input token count (1048577) exceeds the maximum number of tokens allowed (1048576).",
        );
        assert!(matches!(err, CompletionError::TokenLimitExceeded(_)));

        let err = classify_error(StatusCode::BAD_REQUEST, "Token limit exceeded");
        assert!(matches!(err, CompletionError::TokenLimitExceeded(_)));
    }

    #[test]
    fn test_classify_other_errors() {
        let err = classify_error(StatusCode::FORBIDDEN, "API key not valid");
        assert!(matches!(err, CompletionError::Service(_)));

        let err = classify_error(StatusCode::TOO_MANY_REQUESTS, "Resource has been exhausted");
        assert!(matches!(err, CompletionError::Service(_)));
    }

    #[test]
    fn test_quota_errors_are_not_token_limits() {
        let quota = "You exceeded your current quota, please check your plan and billing details. \
Quota exceeded for metric: generativelanguage.googleapis.com/generate_content_free_tier_input_token_count, limit: 250000";

        let err = classify_error(StatusCode::TOO_MANY_REQUESTS, quota);
        assert!(matches!(err, CompletionError::Service(_)));

        // Same wording under a different status is still a quota problem.
        let err = classify_error(StatusCode::BAD_REQUEST, quota);
        assert!(matches!(err, CompletionError::Service(_)));

        let err = classify_error(
            StatusCode::BAD_REQUEST,
            "RESOURCE_EXHAUSTED: input token limit reached",
        );
        assert!(matches!(err, CompletionError::Service(_)));
    }

    #[test]
    fn test_token_wording_needs_bad_request() {
        let err = classify_error(StatusCode::INTERNAL_SERVER_ERROR, "Token limit exceeded");
        assert!(matches!(err, CompletionError::Service(_)));
    }

    #[test]
    fn test_extract_text() {
        let payload = json!({
            "candidates": [{ "content": { "parts": [{ "text": "Hello " }, { "text": "there" }] } }]
        });
        assert_eq!(extract_text(&payload).ok().as_deref(), Some("Hello there"));

        let empty = json!({ "candidates": [] });
        assert!(matches!(
            extract_text(&empty),
            Err(CompletionError::EmptyResponse)
        ));
    }
}

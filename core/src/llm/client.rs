//! LLM Client implementation
//!
//! Supports multiple LLM providers:
//! - OpenAI-compatible API (OpenAI, Ollama, LM Studio, local models)
//! - Google Generative AI (Gemini)

use super::{
    chat::{ChatMessage, ChatRequest, ChatResponse, MessageRole},
    Completion, CompletionBackend, LlmConfig, TokenUsage,
};
use crate::error::{CleanError, Result};
use crate::util::{sanitize_base_url, validate_api_key};
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER},
    Client as HttpClient, Response, StatusCode,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// LLM Provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    /// OpenAI-compatible API (works with OpenAI, Ollama, LM Studio, local models)
    OpenAiCompatible,
    /// Google Generative AI (Gemini)
    GoogleGenerativeAi,
}

impl std::str::FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" | "ollama" | "lmstudio" | "local" | "openrouter" | "custom" => {
                Ok(LlmProvider::OpenAiCompatible)
            }
            "google" | "gemini" | "google-ai" => Ok(LlmProvider::GoogleGenerativeAi),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmProvider::OpenAiCompatible => write!(f, "OpenAI Compatible"),
            LlmProvider::GoogleGenerativeAi => write!(f, "Google Generative AI"),
        }
    }
}

/// Main LLM Client
pub struct LlmClient {
    config: LlmConfig,
    api_key: Option<String>,
    http_client: HttpClient,
}

impl LlmClient {
    /// Create a new LLM client, validating the endpoint and key up front
    pub fn new(mut config: LlmConfig) -> Result<Self> {
        config.base_url = sanitize_base_url(&config.base_url, "base_url")?;

        let api_key = match config.api_key.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(key) if key.eq_ignore_ascii_case("none") => None,
            Some(key) => Some(validate_api_key(key)?),
        };

        let http_client = HttpClient::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CleanError::invalid_config(format!("failed to build HTTP client: {}", e)))?;

        Ok(LlmClient {
            config,
            api_key,
            http_client,
        })
    }

    /// Send a chat request and get a response
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        log::debug!(
            "Sending {} messages to {} ({})",
            request.messages.len(),
            self.config.model,
            self.config.provider
        );
        let response = match self.config.provider {
            LlmProvider::OpenAiCompatible => self.chat_openai(request).await,
            LlmProvider::GoogleGenerativeAi => self.chat_gemini(request).await,
        };
        if let Err(e) = &response {
            log::warn!("LLM request to {} failed: {}", self.config.model, e);
        }
        response
    }

    /// OpenAI-compatible API chat
    async fn chat_openai(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/chat/completions", self.config.base_url);

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if request.system_prompt().is_none() {
            if let Some(system) = &self.config.system_prompt {
                messages.push(ChatMessage::system(system.clone()));
            }
        }
        messages.extend(request.messages.iter().cloned());

        let body = OpenAiRequest {
            model: &self.config.model,
            messages: &messages,
            max_tokens: request.max_tokens.or(self.config.max_tokens),
            temperature: request.temperature.or(self.config.temperature),
            stream: false,
        };

        let response = self
            .http_client
            .post(&url)
            .headers(self.build_headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = check_status(response).await?;
        let parsed: OpenAiResponse = response.json().await.map_err(|e| {
            CleanError::MalformedResponse {
                message: format!("OpenAI response: {}", e),
            }
        })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            CleanError::MalformedResponse {
                message: "response contained no choices".to_string(),
            }
        })?;

        Ok(ChatResponse {
            content: choice.message.content.unwrap_or_default(),
            usage: parsed.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason,
        })
    }

    /// Google Gemini API chat
    async fn chat_gemini(&self, request: &ChatRequest) -> Result<ChatResponse> {
        // Gemini has no system role; the system prompt travels separately.
        let system = request
            .system_prompt()
            .map(str::to_string)
            .or_else(|| self.config.system_prompt.clone());

        let contents: Vec<GeminiContent> = request
            .messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        MessageRole::Assistant => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: m.content.clone(),
                }],
            })
            .collect();

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, self.config.model
        );

        let body = GeminiRequest {
            contents,
            system_instruction: system.map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text }],
            }),
            generation_config: GeminiGenerationConfig {
                max_output_tokens: request.max_tokens.or(self.config.max_tokens),
                temperature: request.temperature.or(self.config.temperature),
            },
        };

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_deref().unwrap_or_default())])
            .header(CONTENT_TYPE, "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = check_status(response).await?;
        let parsed: GeminiResponse = response.json().await.map_err(|e| {
            CleanError::MalformedResponse {
                message: format!("Gemini response: {}", e),
            }
        })?;

        let candidate = parsed.candidates.into_iter().next().ok_or_else(|| {
            CleanError::MalformedResponse {
                message: "response contained no candidates".to_string(),
            }
        })?;

        Ok(ChatResponse {
            content: candidate
                .content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join(""),
            usage: parsed.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
            finish_reason: candidate.finish_reason,
        })
    }

    /// Build headers for OpenAI-compatible requests
    fn build_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &self.api_key {
            let value = HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|_| CleanError::invalid_config("API key is not a valid header value"))?;
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    fn transport_error(&self, err: reqwest::Error) -> CleanError {
        if err.is_timeout() {
            CleanError::Timeout {
                duration: self.config.timeout,
            }
        } else {
            CleanError::from(err)
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn provider(&self) -> LlmProvider {
        self.config.provider
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, prompt: &str, system: Option<&str>) -> Result<Completion> {
        let mut request = ChatRequest::new(vec![ChatMessage::user(prompt)]);
        if let Some(system) = system {
            request = request.with_system_prompt(system);
        }
        let response = self.chat(&request).await?;
        if response.is_truncated() {
            log::warn!(
                "Reply from {} hit the token limit and may be incomplete",
                self.config.model
            );
        }
        Ok(Completion {
            text: response.content,
            usage: response.usage.unwrap_or_default(),
        })
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}

/// Map non-success statuses to typed errors
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs);

    let error_body: Option<serde_json::Value> = response.json().await.ok();
    let message = error_body
        .as_ref()
        .and_then(|v| v.get("error"))
        .and_then(|e| e.get("message").or(Some(e)))
        .and_then(|v| v.as_str())
        .unwrap_or("Unknown error")
        .to_string();

    Err(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => CleanError::Unauthorized { message },
        StatusCode::TOO_MANY_REQUESTS => CleanError::RateLimitExceeded {
            message,
            retry_after,
        },
        status => CleanError::ProviderError {
            status: status.as_u16(),
            message,
        },
    })
}

// OpenAI-compatible API types
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    stream: bool,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// Gemini API types
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: GeminiContent,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn openai_client(server: &MockServer) -> LlmClient {
        LlmClient::new(LlmConfig::new(
            LlmProvider::OpenAiCompatible,
            format!("{}/v1", server.uri()),
            "gpt-test",
            Some("sk-test".to_string()),
        ))
        .unwrap()
    }

    #[test]
    fn test_provider_parsing() {
        assert_eq!(
            "Ollama".parse::<LlmProvider>().unwrap(),
            LlmProvider::OpenAiCompatible
        );
        assert_eq!(
            "gemini".parse::<LlmProvider>().unwrap(),
            LlmProvider::GoogleGenerativeAi
        );
        assert!("carrier-pigeon".parse::<LlmProvider>().is_err());
    }

    #[test]
    fn test_rejects_bad_base_url() {
        let result = LlmClient::new(LlmConfig::new(
            LlmProvider::OpenAiCompatible,
            "api.openai.com",
            "gpt",
            None,
        ));
        assert!(matches!(result, Err(CleanError::InvalidConfig { .. })));
    }

    #[tokio::test]
    async fn test_openai_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-test",
                "temperature": 0.0,
                "messages": [
                    {"role": "system", "content": "be tidy"},
                    {"role": "user", "content": "clean"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cmpl-1",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": "cleaned rows"},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = openai_client(&server);
        let completion = client.complete("clean", Some("be tidy")).await.unwrap();
        assert_eq!(completion.text, "cleaned rows");
        assert_eq!(completion.usage.total_tokens, 15);
    }

    #[tokio::test]
    async fn test_openai_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(429)
                    .insert_header("retry-after", "3")
                    .set_body_json(serde_json::json!({"error": {"message": "slow down"}})),
            )
            .mount(&server)
            .await;

        let err = openai_client(&server).complete("x", None).await.unwrap_err();
        match err {
            CleanError::RateLimitExceeded {
                message,
                retry_after,
            } => {
                assert_eq!(message, "slow down");
                assert_eq!(retry_after, Some(Duration::from_secs(3)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = openai_client(&server).complete("x", None).await.unwrap_err();
        assert!(matches!(err, CleanError::Unauthorized { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_gemini_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-test:generateContent"))
            .and(query_param("key", "g-key"))
            .and(body_partial_json(serde_json::json!({
                "systemInstruction": {"parts": [{"text": "be tidy"}]},
                "contents": [{"role": "user", "parts": [{"text": "clean"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "done"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 1, "totalTokenCount": 5}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = LlmClient::new(LlmConfig::new(
            LlmProvider::GoogleGenerativeAi,
            server.uri(),
            "gemini-test",
            Some("g-key".to_string()),
        ))
        .unwrap();

        let completion = client.complete("clean", Some("be tidy")).await.unwrap();
        assert_eq!(completion.text, "done");
        assert_eq!(completion.usage.prompt_tokens, 4);
    }
}

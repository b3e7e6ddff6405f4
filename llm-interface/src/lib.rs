pub mod prompt;

pub use prompt::{PromptBuilder, SYSTEM_PROMPT};

use persona_core::{AppConfig, CoreError, LlmConfig, LlmError, ModelName, Secret};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};

const PROVIDER: &str = "Groq";

/// A remote text-completion service. One request, one response; callers
/// decide whether to retry.
pub trait LlmProvider {
    async fn complete(&self, prompt: &str, model_name: &str) -> Result<String, CoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Groq's OpenAI-compatible chat completion endpoint.
pub struct GroqProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: Secret,
    max_tokens: u32,
    temperature: f32,
}

impl GroqProvider {
    pub fn new(config: &LlmConfig, api_key: Secret) -> Result<Self, CoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let api_key = config.llm_api_key()?.clone();
        Self::new(&config.llm, api_key)
    }

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        }
    }

    fn map_status(
        status: StatusCode,
        retry_after: Option<u64>,
        body: &str,
        model: ModelName,
    ) -> LlmError {
        let detail = serde_json::from_str::<ApiErrorBody>(body)
            .unwrap_or_default()
            .error;

        match status {
            StatusCode::TOO_MANY_REQUESTS => LlmError::RateLimitExceeded {
                provider: PROVIDER.to_string(),
                retry_after,
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmError::AuthenticationFailed {
                provider: PROVIDER.to_string(),
            },
            _ if matches!(
                detail.code.as_deref(),
                Some("model_not_found") | Some("model_decommissioned")
            ) =>
            {
                warn!("{} rejected model {}: {}", PROVIDER, model, detail.message);
                LlmError::InvalidModel {
                    model: model.to_string(),
                }
            }
            s => LlmError::ServiceUnavailable {
                provider: PROVIDER.to_string(),
                details: if detail.message.is_empty() {
                    format!("status {}", s)
                } else {
                    format!("status {}: {}", s, detail.message)
                },
            },
        }
    }
}

impl LlmProvider for GroqProvider {
    async fn complete(&self, prompt: &str, model_name: &str) -> Result<String, CoreError> {
        let model: ModelName = model_name.parse()?;

        let request = ChatRequest {
            model: model.as_str(),
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(prompt)],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };

        info!(model = %model, prompt_chars = prompt.len(), "Requesting completion");
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("LLM request failed: {}", e);
                if e.is_timeout() {
                    LlmError::RequestTimeout {
                        provider: PROVIDER.to_string(),
                    }
                } else {
                    LlmError::ServiceUnavailable {
                        provider: PROVIDER.to_string(),
                        details: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<f64>().ok())
                .map(|secs| secs.ceil() as u64);
            let body = response.text().await.unwrap_or_default();
            let err = Self::map_status(status, retry_after, &body, model);
            warn!("Completion rejected with {}: {}", status, err);
            return Err(err.into());
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse completion: {}", e);
            LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
                details: e.to_string(),
            }
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponseFormat {
                provider: PROVIDER.to_string(),
                details: "response has no choices[0].message.content".to_string(),
            })?;

        debug!(response_chars = content.len(), "Completion received");
        Ok(content)
    }
}

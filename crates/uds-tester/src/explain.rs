//! Plain-language explanations of UDS responses via a chat-completion API
//!
//! Works with any OpenAI-compatible `/chat/completions` endpoint (Groq by
//! default). Failures never abort a command: the caller always gets text
//! back, either the explanation or a short "unavailable" notice.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-r1-distill-llama-70b";

const SYSTEM_PROMPT: &str = "You are an automotive diagnostics expert specializing in UDS \
(ISO 14229). Explain UDS responses in a concise, user-friendly format:
1. First line: response code meaning (max 5 words)
2. Bullet points: top 3 causes (emoji + 3-5 words each)
3. Action steps (numbered)
4. Standard reference
5. Keep the entire response under 100 words
6. Format in Markdown";

#[derive(Debug, Error)]
pub enum ExplainError {
    #[error("no API key configured")]
    MissingApiKey,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("API returned no explanation")]
    EmptyReply,
}

#[derive(Debug, Clone)]
pub struct ExplainConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

pub struct ResponseExplainer {
    http: Client,
    config: ExplainConfig,
}

impl ResponseExplainer {
    pub fn new(config: ExplainConfig) -> Result<Self, ExplainError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Explain a response; on any failure returns a notice instead
    pub async fn explain(&self, raw_response: &str, context: &str) -> String {
        match self.try_explain(raw_response, context).await {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "Explanation failed");
                format!("AI explanation unavailable: {}", e)
            }
        }
    }

    async fn try_explain(
        &self,
        raw_response: &str,
        context: &str,
    ) -> Result<String, ExplainError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(ExplainError::MissingApiKey)?;

        let body = json!({
            "model": self.config.model,
            "temperature": 0.4,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": format!(
                        "Explain this UDS response: {}. Context: {}",
                        raw_response, context
                    ),
                },
            ],
        });

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExplainError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletion = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(ExplainError::EmptyReply)
    }
}

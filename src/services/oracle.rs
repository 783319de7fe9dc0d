/// Completion oracle abstraction
///
/// The engine only ever needs "prompt in, raw text out"; everything about
/// models, chat message framing and auth stays behind this trait.
use crate::error::{AppError, AppResult};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PromptOracle: Send + Sync {
    /// Sends one prompt and returns the raw completion text.
    async fn complete(&self, prompt: &str) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenRouter-backed oracle speaking the OpenAI chat-completions dialect
#[derive(Clone)]
pub struct OpenRouterOracle {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenRouterOracle {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }
}

#[async_trait::async_trait]
impl PromptOracle for OpenRouterOracle {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/v1/chat/completions", self.api_url);
        let payload = json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
        });

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Oracle returned status {}: {}",
                status, body
            )));
        }

        let completion: CompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Upstream("Oracle completion carried no content".to_string()))?;

        tracing::debug!(
            model = %self.model,
            chars = content.len(),
            "Completion received"
        );

        Ok(content)
    }
}

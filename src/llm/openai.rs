use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::llm::{
    models::{CompletionRequest, CompletionResponse},
    LlmError, LlmProvider,
};
use crate::store::ChatSession;

/// Client for the engine-scoped `/v1/engines/{model}/chat` endpoint.
pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    pub fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/v1/engines/{}/chat",
            self.base_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(
        &self,
        session: &ChatSession,
        text: &str,
        model: &str,
    ) -> Result<CompletionResponse, LlmError> {
        let body = CompletionRequest {
            session,
            chat_text: text,
        };
        let url = self.endpoint(model);
        debug!(
            "POST {} (session {}, {} prior messages)",
            url,
            session.id,
            session.messages.len()
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| LlmError::Decode(e.to_string()))
    }
}

pub mod models;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

use crate::store::ChatSession;
use models::CompletionResponse;

pub use openai::OpenAiProvider;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Network Error: {0}")]
    Network(String),
    #[error("API Error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("Invalid response body: {0}")]
    Decode(String),
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Sends `text` together with the whole of `session` and returns the reply.
    async fn complete(
        &self,
        session: &ChatSession,
        text: &str,
        model: &str,
    ) -> Result<CompletionResponse, LlmError>;
}

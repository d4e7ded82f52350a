use serde::{Deserialize, Serialize};

use crate::store::{ChatSession, Message};

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest<'a> {
    pub session: &'a ChatSession,
    pub chat_text: &'a str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
}

impl From<CompletionResponse> for Message {
    fn from(response: CompletionResponse) -> Self {
        Message {
            id: response.id,
            text: response.text,
        }
    }
}

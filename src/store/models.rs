use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Every known session keyed by its ID. Ordered keys keep the file stable.
pub type SessionMap = BTreeMap<String, ChatSession>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl ChatSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            messages: Vec::new(),
        }
    }
}

use std::collections::VecDeque;
use std::fs;
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use chatline::cli::{run_repl, AppError};
use chatline::config::Settings;
use chatline::llm::models::CompletionResponse;
use chatline::llm::{LlmError, LlmProvider};
use chatline::store::{ChatSession, SessionStore, StoreError};
use tempfile::TempDir;

/// What the loop handed to the provider on one call.
#[derive(Debug, Clone)]
struct Call {
    session: ChatSession,
    text: String,
    model: String,
}

/// Provider that replays canned results and remembers every request.
struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedProvider {
    fn new(replies: Vec<Result<CompletionResponse, LlmError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        session: &ChatSession,
        text: &str,
        model: &str,
    ) -> Result<CompletionResponse, LlmError> {
        self.calls.lock().unwrap().push(Call {
            session: session.clone(),
            text: text.to_string(),
            model: model.to_string(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Network("no scripted reply".into())))
    }
}

fn reply(id: &str, text: &str) -> Result<CompletionResponse, LlmError> {
    Ok(CompletionResponse {
        id: id.to_string(),
        text: text.to_string(),
    })
}

fn settings(dir: &TempDir, session_id: &str) -> Settings {
    Settings {
        api_base: "http://unused.invalid".into(),
        api_key: "test-key".into(),
        model: "davinci-codex".into(),
        session_id: session_id.into(),
        store_path: dir.path().join("chat_sessions.json"),
    }
}

async fn run(
    settings: &Settings,
    provider: &ScriptedProvider,
    input: &str,
) -> (Result<(), AppError>, String) {
    let store = SessionStore::new(&settings.store_path);
    let mut output = Vec::new();
    let result = run_repl(settings, &store, provider, Cursor::new(input.to_string()), &mut output).await;
    (result, String::from_utf8(output).unwrap())
}

#[tokio::test]
async fn fresh_store_records_one_reply_under_generated_session() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir, "");
    let provider = ScriptedProvider::new(vec![reply("cmpl-1", "Hi there")]);

    let (result, output) = run(&settings, &provider, "hello\n").await;
    result.unwrap();

    let sessions = SessionStore::new(&settings.store_path).load().unwrap();
    assert_eq!(sessions.len(), 1);
    let (id, session) = sessions.iter().next().unwrap();
    assert!(!id.is_empty());
    assert_eq!(session.id, *id);
    assert_eq!(session.messages.len(), 1);
    assert_eq!(session.messages[0].id, "cmpl-1");
    assert_eq!(session.messages[0].text, "Hi there");

    assert!(output.starts_with(&format!("Session: {}\n>", id)));
    assert!(output.contains("Hi there"));
}

#[tokio::test]
async fn named_session_is_resumed_and_history_is_sent() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir, "abc");
    fs::write(
        &settings.store_path,
        r#"{"abc": {"id":"abc","messages":[{"id":"old","text":"earlier reply"}]}}"#,
    )
    .unwrap();
    let provider = ScriptedProvider::new(vec![reply("cmpl-2", "second"), reply("cmpl-3", "third")]);

    let (result, _) = run(&settings, &provider, "  first question  \nsecond question\n").await;
    result.unwrap();

    let calls = provider.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].text, "first question");
    assert_eq!(calls[0].model, "davinci-codex");
    assert_eq!(calls[0].session.id, "abc");
    assert_eq!(calls[0].session.messages.len(), 1);
    // The second request carries the reply recorded by the first turn.
    assert_eq!(calls[1].session.messages.len(), 2);
    assert_eq!(calls[1].session.messages[1].id, "cmpl-2");

    let sessions = SessionStore::new(&settings.store_path).load().unwrap();
    assert_eq!(sessions.len(), 1);
    let ids: Vec<_> = sessions["abc"].messages.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, ["old", "cmpl-2", "cmpl-3"]);
}

#[tokio::test]
async fn user_text_is_not_recorded() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir, "abc");
    let provider = ScriptedProvider::new(vec![reply("cmpl-1", "answer")]);

    let (result, _) = run(&settings, &provider, "what is rust?\n").await;
    result.unwrap();

    let sessions = SessionStore::new(&settings.store_path).load().unwrap();
    let texts: Vec<_> = sessions["abc"].messages.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, ["answer"]);
}

#[tokio::test]
async fn failed_completion_skips_turn_and_loop_continues() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir, "abc");
    let provider = ScriptedProvider::new(vec![
        Err(LlmError::Api {
            status: 500,
            body: "boom".into(),
        }),
        Err(LlmError::Decode("expected value".into())),
        reply("cmpl-3", "finally"),
    ]);

    let (result, output) = run(&settings, &provider, "one\ntwo\nthree\n").await;
    result.unwrap();

    assert_eq!(provider.calls().len(), 3);
    assert_eq!(output.matches('>').count(), 4);

    let sessions = SessionStore::new(&settings.store_path).load().unwrap();
    assert_eq!(sessions["abc"].messages.len(), 1);
    assert_eq!(sessions["abc"].messages[0].id, "cmpl-3");
}

#[tokio::test]
async fn failed_only_turn_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir, "");
    let provider = ScriptedProvider::new(vec![Err(LlmError::Network("refused".into()))]);

    let (result, _) = run(&settings, &provider, "hello\n").await;
    result.unwrap();

    assert!(!settings.store_path.exists());
}

#[tokio::test]
async fn blank_lines_are_not_sent() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir, "abc");
    let provider = ScriptedProvider::new(vec![reply("cmpl-1", "ok")]);

    let (result, _) = run(&settings, &provider, "\n   \nhello\n\n").await;
    result.unwrap();

    let calls = provider.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].text, "hello");
}

#[tokio::test]
async fn save_failure_ends_the_loop() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings(&dir, "abc");
    settings.store_path = dir.path().join("missing").join("chat_sessions.json");
    let provider = ScriptedProvider::new(vec![reply("cmpl-1", "ok"), reply("cmpl-2", "never")]);

    let (result, _) = run(&settings, &provider, "one\ntwo\n").await;

    assert!(matches!(result, Err(AppError::Store(StoreError::Io { .. }))));
    assert_eq!(provider.calls().len(), 1);
}

#[tokio::test]
async fn malformed_store_fails_before_prompting() {
    let dir = TempDir::new().unwrap();
    let settings = settings(&dir, "abc");
    fs::write(&settings.store_path, "not json").unwrap();
    let provider = ScriptedProvider::new(vec![]);

    let (result, output) = run(&settings, &provider, "hello\n").await;

    assert!(matches!(result, Err(AppError::Store(StoreError::Decode { .. }))));
    assert!(output.is_empty());
    assert!(provider.calls().is_empty());
}

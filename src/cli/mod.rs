pub mod commands;

use std::io::{self, BufRead, Write};

use thiserror::Error;
use tracing::{debug, info};

use crate::cli::commands::{Cli, Commands, SessionAction};
use crate::config::{AppConfig, Settings, SettingsError};
use crate::llm::{LlmProvider, OpenAiProvider};
use crate::store::{SessionStore, StoreError};

pub const PROMPT: &str = ">";

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Session {0} not found.")]
    SessionNotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub async fn run_cli(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Some(Commands::Sessions { action }) => {
            let store = SessionStore::new(&config.store.path);
            run_sessions(action, &store, &mut io::stdout().lock())
        }
        None => {
            let settings = config.into_settings(cli.chat.model(), cli.chat.session_id())?;
            let store = SessionStore::new(&settings.store_path);
            let llm = OpenAiProvider::new(settings.api_key.clone(), settings.api_base.clone());

            run_repl(&settings, &store, &llm, io::stdin().lock(), io::stdout().lock()).await
        }
    }
}

/// The chat loop: one line in, one reply recorded, the whole store saved.
///
/// Returns on end of input. Failed completions skip the turn; failed saves
/// end the loop with an error.
pub async fn run_repl<R, W>(
    settings: &Settings,
    store: &SessionStore,
    llm: &dyn LlmProvider,
    mut input: R,
    mut output: W,
) -> Result<(), AppError>
where
    R: BufRead,
    W: Write,
{
    let mut sessions = store.load()?;
    let mut session = SessionStore::resolve(&mut sessions, &settings.session_id);

    info!("Chatting with {} model {}", llm.name(), settings.model);
    writeln!(output, "Session: {}", session.id)?;

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let reply = match llm.complete(&session, text, &settings.model).await {
            Ok(reply) => reply,
            Err(e) => {
                debug!("Turn skipped: {}", e);
                eprintln!("Error sending message: {}", e);
                continue;
            }
        };

        writeln!(output, "{}", reply.text)?;

        // Only the reply is kept; the user's own text is not recorded.
        SessionStore::record(&mut sessions, &mut session, reply.into());
        store.save(&sessions)?;
    }

    info!("Input closed, {} messages in session {}", session.messages.len(), session.id);
    Ok(())
}

pub fn run_sessions<W: Write>(
    action: SessionAction,
    store: &SessionStore,
    output: &mut W,
) -> Result<(), AppError> {
    let sessions = store.load()?;

    match action {
        SessionAction::List => {
            if sessions.is_empty() {
                writeln!(output, "No sessions found.")?;
                return Ok(());
            }

            writeln!(output, "{:<38} | {}", "ID", "Messages")?;
            writeln!(output, "{:-<38}-+-{:-<8}", "", "")?;
            for (id, session) in &sessions {
                writeln!(output, "{:<38} | {}", id, session.messages.len())?;
            }
        }
        SessionAction::Export { id, path } => {
            let session = sessions
                .get(&id)
                .ok_or_else(|| AppError::SessionNotFound(id.clone()))?;

            let export_path = path.unwrap_or_else(|| format!("session_{}.txt", id));
            let mut file = io::BufWriter::new(std::fs::File::create(&export_path)?);

            writeln!(file, "Session: {}", session.id)?;
            writeln!(file, "Messages: {}", session.messages.len())?;
            writeln!(file, "---")?;
            for m in &session.messages {
                writeln!(file, "[{}]: {}", m.id, m.text)?;
                writeln!(file, "---")?;
            }
            file.flush()?;

            writeln!(output, "Session exported successfully to: {}", export_path)?;
        }
    }

    Ok(())
}

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chatline", version, about = "Terminal chat with resumable sessions", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub chat: ChatArgs,

    /// Override the config file path globally
    #[arg(short, long, global = true, default_value = "config.yaml")]
    pub config: String,
}

#[derive(Args, Debug, Default, Clone)]
pub struct ChatArgs {
    /// The AI model to use (e.g. 'davinci-codex', 'curie-codex')
    #[arg(long = "model", value_name = "MODEL")]
    pub model: Option<String>,

    /// Same as --model; takes precedence when non-empty
    #[arg(short = 'm', value_name = "MODEL")]
    pub model_short: Option<String>,

    /// The chat session ID to use or resume
    #[arg(long = "session", value_name = "ID")]
    pub session: Option<String>,

    /// Same as --session; takes precedence when non-empty
    #[arg(short = 's', value_name = "ID")]
    pub session_short: Option<String>,
}

impl ChatArgs {
    /// Model requested on the command line, if any.
    pub fn model(&self) -> Option<&str> {
        prefer_short(self.model_short.as_deref(), self.model.as_deref())
            .filter(|m| !m.is_empty())
    }

    /// Session requested on the command line; empty means "start a new one".
    pub fn session_id(&self) -> &str {
        prefer_short(self.session_short.as_deref(), self.session.as_deref()).unwrap_or("")
    }
}

fn prefer_short<'a>(short: Option<&'a str>, long: Option<&'a str>) -> Option<&'a str> {
    short.filter(|s| !s.is_empty()).or(long)
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect stored chat sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
    /// List all sessions
    List,

    /// Export a session to a .txt file
    Export {
        /// The ID of the session to export
        id: String,
        /// The path to the output file (optional)
        #[arg(short, long)]
        path: Option<String>,
    },
}

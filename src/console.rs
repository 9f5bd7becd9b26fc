//! Console front end
//!
//! Reads typed lines as chat messages or slash commands and prints the transcript,
//! state, and emotion changes as they happen.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::face::EmotionState;
use crate::session::{ConversationState, SessionController};

/// A line typed at the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Send text to Neo
    Say(String),
    /// Check the chat service
    Health,
    /// Change the child's name
    Name(String),
    /// Start listening without a wake word
    Listen,
    /// Cancel listening or stop Neo talking
    Stop,
    /// Print the commands
    Help,
    /// Exit
    Quit,
    /// Unknown slash command
    Unknown(String),
}

impl ConsoleCommand {
    /// Parse one input line; blank lines yield `None`
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let Some(command) = line.strip_prefix('/') else {
            return Some(Self::Say(line.to_string()));
        };

        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(n, a)| (n, a.trim()));

        Some(match name.to_lowercase().as_str() {
            "health" => Self::Health,
            "listen" => Self::Listen,
            "stop" => Self::Stop,
            "name" if !arg.is_empty() => Self::Name(arg.to_string()),
            "help" | "name" => Self::Help,
            "quit" | "exit" => Self::Quit,
            _ => Self::Unknown(name.to_string()),
        })
    }
}

/// Help text for the console commands
pub const HELP: &str = "\
Type a message and press enter to talk to Neo.
  /listen        talk to Neo without the wake word
  /stop          stop listening, or stop Neo talking
  /health        check the chat server
  /name <name>   change your name
  /quit          exit";

/// Forward stdin lines until EOF or the receiver goes away
pub async fn read_stdin<T>(events: mpsc::UnboundedSender<T>)
where
    T: From<ConsoleCommand>,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if let Some(command) = ConsoleCommand::parse(&line)
                    && events.send(command.into()).is_err()
                {
                    return;
                }
            }
            Ok(None) => {
                tracing::debug!("stdin closed");
                let _ = events.send(ConsoleCommand::Quit.into());
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read stdin");
                return;
            }
        }
    }
}

/// Prints what changed in the session since the last render
#[derive(Debug, Default)]
pub struct ConsoleView {
    printed: usize,
    state: Option<ConversationState>,
    emotion: Option<EmotionState>,
}

impl ConsoleView {
    /// Create a view that has printed nothing yet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines describing every change since the previous call
    pub fn changes(&mut self, session: &SessionController) -> Vec<String> {
        let mut lines: Vec<String> = session
            .transcript()
            .since(self.printed)
            .iter()
            .map(crate::session::Utterance::display_line)
            .collect();
        self.printed = session.transcript().len();

        let emotion = session.face().emotion();
        if self.emotion != Some(emotion) {
            self.emotion = Some(emotion);
            lines.push(format!("  ({})", emotion.label()));
        }

        let state = session.state();
        if self.state != Some(state) {
            self.state = Some(state);
            lines.push(format!("  [{state}]"));
        }

        lines
    }

    /// Print every change since the previous call
    pub fn render(&mut self, session: &SessionController) {
        for line in self.changes(session) {
            println!("{line}");
        }
    }
}

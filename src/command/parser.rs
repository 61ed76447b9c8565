//! Operator command parser.

use crate::feed::is_feed_url;
use crate::telegram::markup::escape;

/// Literal for adding a feed.
pub const ADD_COMMAND: &str = "/add";
/// Literal for removing a feed.
pub const REMOVE_COMMAND: &str = "/remove";
/// Literal for listing feeds.
pub const LIST_COMMAND: &str = "/list";

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Start watching a feed.
    Add(String),
    /// Stop watching a feed.
    Remove(String),
    /// List watched feeds.
    List,
    /// Anything else.
    Unrecognized,
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Add(url) => write!(f, "{ADD_COMMAND} {url}"),
            Command::Remove(url) => write!(f, "{REMOVE_COMMAND} {url}"),
            Command::List => write!(f, "{LIST_COMMAND}"),
            Command::Unrecognized => write!(f, "(unrecognized)"),
        }
    }
}

/// Parse a message text into a command.
///
/// A bare feed URL is shorthand for `/add <url>`.
pub fn parse_command(text: &str) -> Command {
    let tokens: Vec<&str> = text.split_whitespace().collect();

    match tokens.as_slice() {
        [url] if is_feed_url(url) => Command::Add(url.to_string()),
        [cmd] if *cmd == LIST_COMMAND => Command::List,
        [cmd, url] if *cmd == ADD_COMMAND && is_feed_url(url) => Command::Add(url.to_string()),
        [cmd, url] if *cmd == REMOVE_COMMAND && is_feed_url(url) => {
            Command::Remove(url.to_string())
        }
        _ => Command::Unrecognized,
    }
}

/// Format the watched feeds as a numbered list inside brackets.
pub fn format_feed_list(feeds: &[String]) -> String {
    let mut lines = Vec::with_capacity(feeds.len() + 2);
    lines.push("[".to_string());
    for (i, url) in feeds.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, escape(url)));
    }
    lines.push("]".to_string());
    lines.join("\n")
}

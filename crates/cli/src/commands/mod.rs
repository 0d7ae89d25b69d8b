//! Command implementations.
//!
//! - `auth` - Login, logout, and identity
//! - `products` - One-shot product list, create, and delete
//! - `categories` - Category listing
//! - `browse` - Interactive product browser

pub mod auth;
pub mod browse;
pub mod categories;
pub mod products;

use catalog_admin::AppError;
use catalog_admin::config::ConfigError;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Input ended before a required answer was read.
    #[error("No input")]
    NoInput,
}

impl CliError {
    /// The message shown to the user.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::App(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

/// Write a line to stdout.
#[allow(clippy::print_stdout)]
pub fn say(text: impl std::fmt::Display) {
    println!("{text}");
}

/// Write text to stdout without a trailing newline.
#[allow(clippy::print_stdout)]
pub fn say_raw(text: impl std::fmt::Display) {
    print!("{text}");
}

/// Print `question` and read one line from stdin, without the line ending.
///
/// # Errors
///
/// Returns `CliError::NoInput` at end of input.
pub async fn prompt(question: &str) -> Result<String, CliError> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(question.as_bytes()).await?;
    stdout.flush().await?;

    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    if read == 0 {
        return Err(CliError::NoInput);
    }
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

/// Whether an answer to a yes/no prompt means yes.
#[must_use]
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("no"));
    }
}

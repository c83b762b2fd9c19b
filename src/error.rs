//! Error types for the Cloud Connect panel
//!
//! Centralized error handling using snafu for ergonomic error definitions.

use snafu::Snafu;

/// Main error type for the panel
#[derive(Debug, Snafu)]
pub enum Error {
    /// Network failure, timeout or undecodable response
    #[snafu(display("Transport error: {source}"))]
    Transport { source: reqwest::Error },

    /// Remote side rejected a create/update (validation or conflict)
    #[snafu(display("Rejected ({status}): {message}"))]
    Rejected { status: u16, message: String },

    /// Stale id on update/delete/toggle
    #[snafu(display("Not found: {message}"))]
    NotFound { message: String },

    /// Any other non-success status from the remote side
    #[snafu(display("Server error ({status}): {message}"))]
    Server { status: u16, message: String },

    /// Invalid input or configuration
    #[snafu(display("Invalid: {message}"))]
    Invalid { message: String },

    /// IO error (config files, console)
    #[snafu(display("IO error: {source}"))]
    Io { source: std::io::Error },

    /// JSON serialization/deserialization error
    #[snafu(display("JSON error: {source}"))]
    Json { source: serde_json::Error },

    /// TOML deserialization error
    #[snafu(display("TOML parse error: {source}"))]
    TomlDe { source: toml::de::Error },

    /// TOML serialization error
    #[snafu(display("TOML serialize error: {source}"))]
    TomlSe { source: toml::ser::Error },
}

/// Coarse classification used when reporting failures to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Rejected,
    NotFound,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport { .. } | Error::Server { .. } => ErrorKind::Transport,
            Error::Rejected { .. } => ErrorKind::Rejected,
            Error::NotFound { .. } => ErrorKind::NotFound,
            _ => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Text shown to the user in a notification.
    pub fn user_message(&self) -> String {
        match self {
            Error::Rejected { message, .. }
            | Error::NotFound { message }
            | Error::Server { message, .. } => message.clone(),
            Error::Transport { source } if source.is_timeout() => {
                "The server did not respond in time".to_string()
            }
            Error::Transport { .. } => "Could not reach the server".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(source: reqwest::Error) -> Self {
        Error::Transport { source }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io { source }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Error::Json { source }
    }
}

impl From<toml::de::Error> for Error {
    fn from(source: toml::de::Error) -> Self {
        Error::TomlDe { source }
    }
}

impl From<toml::ser::Error> for Error {
    fn from(source: toml::ser::Error) -> Self {
        Error::TomlSe { source }
    }
}

/// Result type alias for convenience
pub type Result<T, E = Error> = std::result::Result<T, E>;

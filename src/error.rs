use thiserror::Error;

use crate::classifier::ClassificationLabel;

// Enum for handling application-level errors surfaced by the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError), // Errors raised by the completion transport.

    #[error("Storage error: {0}")]
    Store(#[from] StoreError), // Errors from the game database.

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error), // Input/output errors.

    #[error("Logger error: {0}")]
    Logger(#[from] log::SetLoggerError),
}

// Errors related to the chat-completion transport.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("OpenRouter API key is not configured")]
    MissingApiKey,

    #[error("Request timed out after {attempts} attempt(s)")]
    Timeout { attempts: u32 }, // The only kind the retry loop recovers from.

    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error), // DNS, refused connections, broken streams.

    #[error("Unexpected response format: {0}")]
    MalformedResponse(String),

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl LlmError {
    /// Classifies a transport failure coming out of `reqwest`.
    pub fn from_reqwest(err: reqwest::Error, attempt: u32) -> Self {
        if err.is_timeout() {
            LlmError::Timeout { attempts: attempt }
        } else if err.is_decode() {
            LlmError::MalformedResponse(err.to_string())
        } else {
            LlmError::Network(err)
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, LlmError::Timeout { .. })
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::MalformedResponse(err.to_string())
    }
}

// Errors raised by the persistence collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("Invalid synonyms column: {0}")]
    Synonyms(#[from] serde_json::Error),

    #[error("Invalid timestamp '{value}': {reason}")]
    Timestamp { value: String, reason: String },
}

// Raised when a label that cannot drive a briefing reaches the analyzer factory.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalyzerError {
    #[error("Unsupported message type: {0}")]
    UnsupportedLabel(ClassificationLabel),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

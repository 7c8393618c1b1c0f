//! Error types for the mail summarizer.

use std::time::Duration;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("{0}")]
    Pipeline(#[from] PipelineError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },
}

/// Raw message parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Email parsing failed: input is empty")]
    EmptyInput,

    #[error("Email parsing failed: {0}")]
    Malformed(String),
}

/// Mail retrieval errors. Every variant names the operation that failed.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    #[error("IMAP connection failed: {0}")]
    Connect(String),

    #[error("Failed to list mailboxes: {0}")]
    List(String),

    #[error("Failed to select mailbox {mailbox}: {reason}")]
    Select { mailbox: String, reason: String },

    #[error("Failed to search emails: {0}")]
    Search(String),

    #[error("Failed to fetch email with UID {uid}: {reason}")]
    Fetch { uid: u32, reason: String },

    #[error("Failed to close IMAP connection: {0}")]
    Close(String),

    #[error("IMAP session is not connected")]
    NotConnected,
}

/// OCR engine errors.
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR engine failed to initialize: {0}")]
    InitFailed(String),

    #[error("OCR engine is not initialized")]
    NotInitialized,

    #[error("Image recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Summarization errors. Every failure, whatever stage it came from, is
/// reported as one of these.
#[derive(Debug, thiserror::Error)]
pub enum SummarizeError {
    #[error("Summarization failed: input text is empty")]
    EmptyInput,

    #[error("Summarization failed: {reason}")]
    Generation { reason: String },
}

impl SummarizeError {
    /// True when the failure was caused by empty input rather than the model.
    pub fn is_empty_input(&self) -> bool {
        matches!(self, Self::EmptyInput)
    }
}

impl From<LlmError> for SummarizeError {
    fn from(err: LlmError) -> Self {
        Self::Generation {
            reason: err.to_string(),
        }
    }
}

/// Pipeline-related errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Failed to read input {path}: {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Summarize(#[from] SummarizeError),

    #[error(transparent)]
    Mailbox(#[from] MailboxError),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn llm_error_becomes_generation_failure_with_message() {
        let err: SummarizeError = LlmError::AuthFailed {
            provider: "anthropic".into(),
        }
        .into();
        assert!(!err.is_empty_input());
        assert_eq!(
            err.to_string(),
            "Summarization failed: Authentication failed for provider anthropic"
        );
    }

    #[test]
    fn empty_input_is_inspectable() {
        let err = SummarizeError::EmptyInput;
        assert!(err.is_empty_input());
        assert!(err.to_string().starts_with("Summarization failed"));
    }

    #[test]
    fn pipeline_error_is_transparent_over_stage_errors() {
        let err: PipelineError = ParseError::EmptyInput.into();
        assert_eq!(err.to_string(), "Email parsing failed: input is empty");
    }

    #[test]
    fn stage_errors_reach_top_level_unprefixed() {
        fn fetch() -> Result<()> {
            Err(PipelineError::from(MailboxError::NotConnected))?
        }
        let err = fetch().unwrap_err();
        assert!(matches!(
            err,
            Error::Pipeline(PipelineError::Mailbox(MailboxError::NotConnected))
        ));
        assert_eq!(err.to_string(), "IMAP session is not connected");

        let err: Error = ConfigError::MissingEnvVar("IMAP_HOST".into()).into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Missing required environment variable: IMAP_HOST"
        );
    }
}

//! Shared types for the extraction and summarization pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mail::StructuredMail;

/// Separator placed between the body text and appended image text.
pub const IMAGE_SECTION_SEPARATOR: &str = "\n\n--- image content ---\n";

/// Value of `detected_language` until real detection exists.
pub const LANGUAGE_UNDETECTED: &str = "undetected";

/// Facts about the source message recorded during extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Where the content came from. Always `"email"` today.
    pub source: String,
    pub has_attachments: bool,
    pub attachment_count: usize,
}

impl ExtractionMetadata {
    pub fn for_mail(mail: &StructuredMail) -> Self {
        Self {
            source: "email".to_string(),
            has_attachments: mail.has_attachments(),
            attachment_count: mail.attachments.len(),
        }
    }
}

/// Text pulled out of one message, ready for summarization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Best plain-text body, with image text appended when requested.
    pub main_text: String,
    /// One entry per image, `Some` only when image recognition was requested.
    pub image_texts: Option<Vec<String>>,
    pub detected_language: String,
    pub metadata: ExtractionMetadata,
}

/// Output of the summarizer. `outline` is empty when no outline was asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizationResult {
    pub summary: String,
    pub outline: String,
}

/// The final, printable result for one message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessReport {
    pub sender: String,
    pub recipients: Vec<String>,
    pub subject: String,
    pub date: DateTime<Utc>,
    pub summary: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub outline: String,
    pub metadata: ExtractionMetadata,
}

/// Result for one message of a mailbox batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MessageOutcome {
    Processed { uid: u32, report: ProcessReport },
    Failed { uid: u32, error: String },
}

impl MessageOutcome {
    pub fn uid(&self) -> u32 {
        match self {
            Self::Processed { uid, .. } | Self::Failed { uid, .. } => *uid,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Result of processing a mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub mailbox: String,
    /// Identifiers the search returned, in server order.
    pub found: usize,
    pub outcomes: Vec<MessageOutcome>,
    /// Set when the batch stopped early under the abort policy.
    pub aborted: bool,
}

impl BatchReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    pub fn processed(&self) -> usize {
        self.outcomes.len() - self.failures()
    }
}

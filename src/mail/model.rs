//! Structured view of a parsed email.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A file attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// MIME type label, e.g. `image/png`.
    pub content_type: String,
    pub filename: Option<String>,
    #[serde(skip)]
    pub content: Vec<u8>,
}

impl Attachment {
    pub fn new(content_type: impl Into<String>, filename: Option<&str>, content: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            filename: filename.map(str::to_string),
            content,
        }
    }

    /// Filename for log lines and placeholders.
    pub fn display_name(&self) -> &str {
        self.filename
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or("unnamed")
    }

    /// `type/subtype` lowercased, parameters dropped.
    pub fn mime_essence(&self) -> String {
        self.content_type
            .split(';')
            .next()
            .unwrap_or("")
            .trim()
            .to_ascii_lowercase()
    }

    /// PNG or JPEG image, the formats OCR accepts.
    pub fn is_recognizable_image(&self) -> bool {
        let essence = self.mime_essence();
        match essence.split_once('/') {
            Some(("image", subtype)) => matches!(subtype, "png" | "jpeg" | "jpg"),
            _ => false,
        }
    }
}

/// A message after MIME parsing. Missing headers stay `None` here; the
/// pipeline decides on display defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredMail {
    pub from: Option<String>,
    pub to: Vec<String>,
    pub subject: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub text: Option<String>,
    pub html: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl StructuredMail {
    pub fn has_attachments(&self) -> bool {
        !self.attachments.is_empty()
    }
}

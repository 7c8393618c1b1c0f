//! Mail summarizer: email parsing, content extraction, LLM summaries.

pub mod config;
pub mod error;
pub mod llm;
pub mod mail;
pub mod mailbox;
pub mod ocr;
pub mod pipeline;

//! Email summarization pipeline.
//!
//! Every message, whether read from a file or fetched from a mailbox, flows
//! through:
//! 1. `parse_email()`: raw RFC 5322 source to `StructuredMail`
//! 2. `extract_content()`: body selection, optional image text
//! 3. `Summarizer::summarize_and_outline()`: LLM summary and outline
//! 4. `ProcessReport`: printable result
//!
//! `EmailPipeline` drives the stages and owns the OCR session.

pub mod extractor;
pub mod generator;
pub mod processor;
mod report;
pub mod summarizer;
pub mod types;

pub use extractor::extract_content;
pub use generator::{LlmTextGenerator, TextGenerator};
pub use processor::{EmailPipeline, MailboxRequest};
pub use summarizer::Summarizer;
pub use types::{
    BatchReport, ExtractedContent, ExtractionMetadata, MessageOutcome, ProcessReport,
    SummarizationResult,
};

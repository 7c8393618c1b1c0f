//! Pipeline orchestrator: parse, extract, summarize, report.
//!
//! Flow for one message:
//! 1. Parse the raw RFC 5322 source
//! 2. Normalize missing headers
//! 3. Extract text (optionally with image text)
//! 4. Summarize and outline
//!
//! Mailbox runs repeat that per fetched message under a [`BatchPolicy`].

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::{BatchPolicy, ProcessingConfig};
use crate::error::PipelineError;
use crate::mail::{StructuredMail, parse_email};
use crate::mailbox::{MailSource, SearchCriteria};
use crate::ocr::OcrSession;
use crate::pipeline::extractor::extract_content;
use crate::pipeline::generator::TextGenerator;
use crate::pipeline::summarizer::Summarizer;
use crate::pipeline::types::{BatchReport, MessageOutcome, ProcessReport};

/// Mailbox selected when none is given.
pub const DEFAULT_MAILBOX: &str = "INBOX";

const UNKNOWN_SENDER: &str = "unknown";
const NO_SUBJECT: &str = "(no subject)";

/// Which mailbox to read and which messages to take from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailboxRequest {
    pub mailbox: String,
    pub criteria: SearchCriteria,
}

impl Default for MailboxRequest {
    fn default() -> Self {
        Self {
            mailbox: DEFAULT_MAILBOX.to_string(),
            criteria: SearchCriteria::default(),
        }
    }
}

/// Runs messages through the whole pipeline.
///
/// Owns the OCR session and releases it when a run (single or batch)
/// finishes, whatever the outcome.
pub struct EmailPipeline {
    config: ProcessingConfig,
    summarizer: Summarizer,
    ocr: OcrSession,
}

impl EmailPipeline {
    pub fn new(
        config: ProcessingConfig,
        generator: Arc<dyn TextGenerator>,
        ocr: OcrSession,
    ) -> Self {
        Self {
            config,
            summarizer: Summarizer::new(generator),
            ocr,
        }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Process one message given as a file path or as literal source.
    pub async fn process_input(&self, input: &str) -> Result<ProcessReport, PipelineError> {
        let result = match read_input(input).await {
            Ok(raw) => self.process_raw(&raw).await,
            Err(e) => Err(e),
        };
        self.ocr.release().await;
        if let Err(e) = &result {
            error!(error = %e, "Processing failed");
        }
        result
    }

    /// Process one raw message. Leaves the OCR session running.
    pub async fn process_raw(&self, raw: &[u8]) -> Result<ProcessReport, PipelineError> {
        let mail = normalize(parse_email(raw)?, Utc::now());
        debug!(
            from = mail.from.as_deref().unwrap_or(UNKNOWN_SENDER),
            attachments = mail.attachments.len(),
            "Email parsed"
        );

        let content = extract_content(&mail, &self.config.extraction, &self.ocr).await;
        let result = self
            .summarizer
            .summarize_and_outline(&content.main_text, &self.config.summarization)
            .await?;

        let report = ProcessReport {
            sender: mail.from.unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
            recipients: mail.to,
            subject: mail.subject.unwrap_or_else(|| NO_SUBJECT.to_string()),
            date: mail.date.unwrap_or_else(Utc::now),
            summary: result.summary,
            outline: result.outline,
            metadata: content.metadata,
        };
        info!(subject = %report.subject, "Email processed");
        Ok(report)
    }

    /// Process the messages of a mailbox matching `request`.
    ///
    /// Connection-level failures (connect, list, select, search) fail the
    /// whole run. Per-message failures are recorded in the report.
    pub async fn process_mailbox(
        &self,
        source: &mut dyn MailSource,
        request: &MailboxRequest,
    ) -> Result<BatchReport, PipelineError> {
        let result = self.run_mailbox(source, request).await;
        self.ocr.release().await;
        result
    }

    async fn run_mailbox(
        &self,
        source: &mut dyn MailSource,
        request: &MailboxRequest,
    ) -> Result<BatchReport, PipelineError> {
        source.connect().await?;
        let result = self.drain_mailbox(source, request).await;
        if let Err(e) = source.close().await {
            warn!(error = %e, "Failed to close mailbox connection");
        }
        result
    }

    async fn drain_mailbox(
        &self,
        source: &mut dyn MailSource,
        request: &MailboxRequest,
    ) -> Result<BatchReport, PipelineError> {
        let mailboxes = source.list_mailboxes().await?;
        info!(count = mailboxes.len(), mailboxes = ?mailboxes, "Available mailboxes");

        source.select_mailbox(&request.mailbox).await?;
        let uids = source.search_emails(&request.criteria).await?;
        info!(mailbox = %request.mailbox, found = uids.len(), "Processing emails");

        let mut report = BatchReport {
            mailbox: request.mailbox.clone(),
            found: uids.len(),
            outcomes: Vec::with_capacity(uids.len()),
            aborted: false,
        };

        for uid in uids {
            let outcome = match self.process_uid(source, uid).await {
                Ok(processed) => MessageOutcome::Processed {
                    uid,
                    report: processed,
                },
                Err(e) => {
                    error!(uid, error = %e, "Failed to process email");
                    MessageOutcome::Failed {
                        uid,
                        error: e.to_string(),
                    }
                }
            };
            let failed = outcome.is_failure();
            report.outcomes.push(outcome);

            if failed && self.config.batch_policy == BatchPolicy::Abort {
                warn!(uid, "Stopping batch after failure");
                report.aborted = true;
                break;
            }
        }

        info!(
            processed = report.processed(),
            failed = report.failures(),
            "Mailbox batch finished"
        );
        Ok(report)
    }

    async fn process_uid(
        &self,
        source: &mut dyn MailSource,
        uid: u32,
    ) -> Result<ProcessReport, PipelineError> {
        let raw = source.fetch_email(uid).await?;
        self.process_raw(&raw).await
    }
}

/// Read `input` as a file if one exists at that path, else use it verbatim.
async fn read_input(input: &str) -> Result<Vec<u8>, PipelineError> {
    let path = Path::new(input);
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        debug!("Input is not a file, treating it as raw email source");
        return Ok(input.as_bytes().to_vec());
    }
    info!(path = %path.display(), "Reading email file");
    tokio::fs::read(path)
        .await
        .map_err(|source| PipelineError::Input {
            path: input.to_string(),
            source,
        })
}

/// Fill in safe defaults for headers a message may omit.
fn normalize(mut mail: StructuredMail, now: DateTime<Utc>) -> StructuredMail {
    mail.from = mail.from.filter(|f| !f.trim().is_empty());
    mail.subject = mail.subject.filter(|s| !s.trim().is_empty());
    mail.date = Some(mail.date.unwrap_or(now));
    mail
}

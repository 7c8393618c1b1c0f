//! Mail retrieval: the `MailSource` interface and its IMAP implementation.

mod client;
pub mod protocol;

pub use client::{ImapConfig, ImapMailbox};

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::MailboxError;

/// Which messages to look for in the selected mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Only messages received on or after this date.
    pub since: Option<NaiveDate>,
    pub unseen_only: bool,
    /// Keep only the newest `limit` matches.
    pub limit: Option<usize>,
}

/// A remote mailbox the pipeline can pull raw messages from.
#[async_trait]
pub trait MailSource: Send {
    async fn connect(&mut self) -> Result<(), MailboxError>;

    async fn list_mailboxes(&mut self) -> Result<Vec<String>, MailboxError>;

    async fn select_mailbox(&mut self, name: &str) -> Result<(), MailboxError>;

    /// Identifiers of matching messages, in server order.
    async fn search_emails(&mut self, criteria: &SearchCriteria) -> Result<Vec<u32>, MailboxError>;

    /// Full RFC 5322 source of one message.
    async fn fetch_email(&mut self, uid: u32) -> Result<Vec<u8>, MailboxError>;

    async fn close(&mut self) -> Result<(), MailboxError>;
}

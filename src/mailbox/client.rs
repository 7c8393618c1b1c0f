//! IMAP client over TLS (rustls) or plain TCP.
//!
//! The socket work is blocking and runs on `spawn_blocking`; the session is
//! moved into each blocking task and handed back when it finishes. A session
//! that hit a transport error is not handed back: its stream may still hold
//! the unread tail of the failed response.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use super::protocol::{self, Status};
use super::{MailSource, SearchCriteria};
use crate::error::MailboxError;

/// Default socket read timeout.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from blocking IMAP operations.
#[derive(Debug, thiserror::Error)]
enum ImapError {
    /// Tagged `NO` or `BAD`. The response was read in full.
    #[error("{0}")]
    Rejected(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Tls(#[from] rustls::Error),

    #[error(transparent)]
    InvalidHost(#[from] rustls_pki_types::InvalidDnsNameError),

    #[error("{0}")]
    Protocol(String),
}

impl ImapError {
    /// True when the stream is still in step with the command sequence.
    fn leaves_session_usable(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// IMAP connection settings.
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    /// Use implicit TLS. Plain TCP otherwise.
    pub secure: bool,
    pub username: String,
    pub password: SecretString,
    pub read_timeout: Duration,
}

impl ImapConfig {
    /// Implicit TLS on port 993, empty credentials.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 993,
            secure: true,
            username: String::new(),
            password: SecretString::from(String::new()),
            read_timeout: READ_TIMEOUT,
        }
    }

    /// Build config from environment variables.
    /// Returns `None` if `IMAP_HOST` is not set.
    pub fn from_env() -> Option<Self> {
        let host = std::env::var("IMAP_HOST").ok().filter(|h| !h.is_empty())?;

        let port: u16 = std::env::var("IMAP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(993);

        let secure = std::env::var("IMAP_SECURE")
            .map(|s| !matches!(s.to_ascii_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        let username = std::env::var("IMAP_USER").unwrap_or_default();
        let password = SecretString::from(std::env::var("IMAP_PASS").unwrap_or_default());

        Some(Self {
            host,
            port,
            secure,
            username,
            password,
            read_timeout: READ_TIMEOUT,
        })
    }
}

trait Transport: Read + Write + Send {}

impl<T: Read + Write + Send> Transport for T {}

/// One authenticated IMAP connection.
struct ImapSession {
    stream: BufReader<Box<dyn Transport>>,
    next_tag: u32,
}

/// A literal and the response line text around it.
struct Literal {
    /// Line that announced the literal joined with the line that follows it.
    context: String,
    data: Vec<u8>,
}

/// Lines and literals of one command's response.
struct Response {
    lines: Vec<String>,
    literals: Vec<Literal>,
}

impl ImapSession {
    fn open(config: &ImapConfig) -> Result<Self, ImapError> {
        let tcp = TcpStream::connect((config.host.as_str(), config.port))?;
        tcp.set_read_timeout(Some(config.read_timeout))?;

        let transport: Box<dyn Transport> = if config.secure {
            let mut root_store = rustls::RootCertStore::empty();
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
            let tls_config = Arc::new(
                rustls::ClientConfig::builder()
                    .with_root_certificates(root_store)
                    .with_no_client_auth(),
            );
            let server_name = rustls_pki_types::ServerName::try_from(config.host.clone())?;
            let conn = rustls::ClientConnection::new(tls_config, server_name)?;
            Box::new(rustls::StreamOwned::new(conn, tcp))
        } else {
            Box::new(tcp)
        };

        let mut session = Self {
            stream: BufReader::new(transport),
            next_tag: 1,
        };

        let greeting = session.read_line()?;
        if !greeting.starts_with("* OK") && !greeting.starts_with("* PREAUTH") {
            return Err(ImapError::Protocol(format!(
                "unexpected greeting: {}",
                greeting.trim_end()
            )));
        }

        let login = format!(
            "LOGIN {} {}",
            protocol::quote(&config.username),
            protocol::quote(config.password.expose_secret())
        );
        session
            .command(&login)
            .map_err(|e| ImapError::Protocol(format!("login failed: {e}")))?;
        Ok(session)
    }

    fn read_line(&mut self) -> Result<String, ImapError> {
        let mut buf = Vec::new();
        let n = self.stream.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Err(ImapError::Protocol("IMAP connection closed".to_string()));
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Send a command and collect its response up to the tagged completion.
    fn command(&mut self, cmd: &str) -> Result<Response, ImapError> {
        let tag = format!("A{}", self.next_tag);
        self.next_tag += 1;

        let stream = self.stream.get_mut();
        stream.write_all(format!("{tag} {cmd}\r\n").as_bytes())?;
        stream.flush()?;

        let mut response = Response {
            lines: Vec::new(),
            literals: Vec::new(),
        };
        loop {
            let mut line = self.read_line()?;
            while let Some(len) = protocol::literal_len(&line) {
                let mut data = vec![0u8; len];
                self.stream.read_exact(&mut data)?;
                // The response line continues after the literal.
                let rest = self.read_line()?;
                response.literals.push(Literal {
                    context: format!("{} {}", line.trim_end(), rest.trim_end()),
                    data,
                });
                line = rest;
            }

            match protocol::tagged_status(&line, &tag) {
                Some(Status::Ok) => return Ok(response),
                Some(Status::No) | Some(Status::Bad) => {
                    return Err(ImapError::Rejected(line.trim_end().to_string()));
                }
                None => response.lines.push(line),
            }
        }
    }
}

/// Blocking IMAP session driven from async code.
pub struct ImapMailbox {
    config: ImapConfig,
    session: Option<ImapSession>,
}

impl ImapMailbox {
    pub fn new(config: ImapConfig) -> Self {
        Self {
            config,
            session: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Run `op` against the session on the blocking pool.
    ///
    /// The session is kept after success or a tagged rejection, and dropped
    /// after anything else.
    async fn run<T, F, E>(&mut self, op: F, wrap: E) -> Result<T, MailboxError>
    where
        F: FnOnce(&mut ImapSession) -> Result<T, ImapError> + Send + 'static,
        T: Send + 'static,
        E: FnOnce(String) -> MailboxError,
    {
        let mut session = self.session.take().ok_or(MailboxError::NotConnected)?;
        let joined = tokio::task::spawn_blocking(move || {
            let result = op(&mut session);
            (session, result)
        })
        .await;

        match joined {
            Ok((session, Ok(value))) => {
                self.session = Some(session);
                Ok(value)
            }
            Ok((session, Err(e))) => {
                if e.leaves_session_usable() {
                    self.session = Some(session);
                } else {
                    warn!(error = %e, "IMAP transport error, dropping connection");
                }
                Err(wrap(e.to_string()))
            }
            Err(e) => Err(wrap(format!("IMAP task panicked: {e}"))),
        }
    }
}

#[async_trait]
impl MailSource for ImapMailbox {
    async fn connect(&mut self) -> Result<(), MailboxError> {
        if self.session.is_some() {
            return Ok(());
        }
        let config = self.config.clone();
        let session = tokio::task::spawn_blocking(move || ImapSession::open(&config))
            .await
            .map_err(|e| MailboxError::Connect(format!("IMAP task panicked: {e}")))?
            .map_err(|e| MailboxError::Connect(e.to_string()))?;
        self.session = Some(session);
        info!(host = %self.config.host, port = self.config.port, "IMAP connection established");
        Ok(())
    }

    async fn list_mailboxes(&mut self) -> Result<Vec<String>, MailboxError> {
        let response = self
            .run(|s| s.command("LIST \"\" \"*\""), MailboxError::List)
            .await?;
        Ok(response
            .lines
            .iter()
            .filter_map(|line| protocol::parse_list_line(line))
            .collect())
    }

    async fn select_mailbox(&mut self, name: &str) -> Result<(), MailboxError> {
        let cmd = format!("SELECT {}", protocol::quote(name));
        let mailbox = name.to_string();
        self.run(
            move |s| s.command(&cmd),
            |reason| MailboxError::Select { mailbox, reason },
        )
        .await?;
        info!(mailbox = %name, "Mailbox selected");
        Ok(())
    }

    async fn search_emails(&mut self, criteria: &SearchCriteria) -> Result<Vec<u32>, MailboxError> {
        let cmd = protocol::search_command(criteria);
        let response = self
            .run(move |s| s.command(&cmd), MailboxError::Search)
            .await?;
        let uids = protocol::apply_limit(protocol::parse_search(&response.lines), criteria.limit);
        debug!(count = uids.len(), "Search finished");
        Ok(uids)
    }

    async fn fetch_email(&mut self, uid: u32) -> Result<Vec<u8>, MailboxError> {
        let cmd = format!("UID FETCH {uid} BODY.PEEK[]");
        let response = self
            .run(move |s| s.command(&cmd), |reason| MailboxError::Fetch { uid, reason })
            .await?;
        response
            .literals
            .into_iter()
            .find(|literal| protocol::fetch_uid(&literal.context) == Some(uid))
            .map(|literal| literal.data)
            .ok_or_else(|| MailboxError::Fetch {
                uid,
                reason: "source not available".to_string(),
            })
    }

    async fn close(&mut self) -> Result<(), MailboxError> {
        if self.session.is_none() {
            return Ok(());
        }
        let result = self.run(|s| s.command("LOGOUT"), MailboxError::Close).await;
        self.session = None;
        result?;
        info!("IMAP connection closed");
        Ok(())
    }
}

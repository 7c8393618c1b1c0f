use std::fmt::Display;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use mail_summarizer::config::{
    BatchPolicy, DEFAULT_OUTLINE_POINTS, ExtractionConfig, ImageRecognitionStrategy, Language,
    OutlineStyle, ProcessingConfig, SummarizationConfig, SummaryLength, Tone,
};
use mail_summarizer::error::{self, ConfigError};
use mail_summarizer::llm::{LlmConfig, create_provider};
use mail_summarizer::mailbox::{ImapConfig, ImapMailbox, SearchCriteria};
use mail_summarizer::ocr::{OcrSession, TesseractConfig, TesseractEngine};
use mail_summarizer::pipeline::generator::DEFAULT_TEMPERATURE;
use mail_summarizer::pipeline::{
    BatchReport, EmailPipeline, LlmTextGenerator, MailboxRequest, ProcessReport,
};

#[derive(Parser)]
#[command(name = "mail-summarizer", version, about = "Summarize emails with an LLM")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize one email given as a file path or as raw source
    Process {
        /// Path to an .eml file, or the raw email text itself
        input: String,

        #[command(flatten)]
        options: SummaryArgs,
    },
    /// Fetch and summarize emails from an IMAP mailbox
    Imap {
        #[command(flatten)]
        connection: ImapArgs,

        #[command(flatten)]
        options: SummaryArgs,
    },
}

#[derive(Args)]
struct SummaryArgs {
    /// Output language code, or "auto" to follow the email
    #[arg(short, long, default_value = "auto")]
    language: Language,

    #[arg(short, long, value_enum, default_value_t = SummaryLength::Medium)]
    summary_length: SummaryLength,

    /// Also generate an outline
    #[arg(short = 'g', long)]
    outline: bool,

    #[arg(short = 'o', long, default_value_t = DEFAULT_OUTLINE_POINTS,
          value_parser = clap::value_parser!(u32).range(1..))]
    outline_points: u32,

    #[arg(short = 't', long, value_enum, default_value_t = OutlineStyle::Bullet)]
    outline_style: OutlineStyle,

    /// Extract text from image attachments and inline images
    #[arg(short = 'i', long)]
    recognize_images: bool,

    #[arg(short = 'r', long, value_enum, default_value_t = ImageRecognitionStrategy::Ocr)]
    recognition_strategy: ImageRecognitionStrategy,

    #[arg(long, value_enum, default_value_t = Tone::Professional)]
    tone: Tone,

    /// LLM sampling temperature
    #[arg(long, env = "SUMMARIZER_LLM_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f32,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl SummaryArgs {
    fn processing_config(&self, batch_policy: BatchPolicy) -> ProcessingConfig {
        ProcessingConfig {
            extraction: ExtractionConfig {
                recognize_images: self.recognize_images,
                image_recognition_strategy: self.recognition_strategy,
            },
            summarization: SummarizationConfig {
                language: self.language.clone(),
                summary_length: self.summary_length,
                generate_outline: self.outline,
                outline_points: self.outline_points,
                outline_style: self.outline_style,
                tone: self.tone,
            },
            batch_policy,
        }
    }
}

/// Flags override `IMAP_*` environment variables.
#[derive(Args)]
struct ImapArgs {
    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long)]
    password: Option<String>,

    /// Connect over plain TCP instead of TLS
    #[arg(long)]
    insecure: bool,

    #[arg(long, default_value = "INBOX")]
    mailbox: String,

    /// Process only the newest N matching messages
    #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..))]
    limit: u64,

    /// Only unread messages
    #[arg(long)]
    unseen: bool,

    /// Only messages received on or after this date (YYYY-MM-DD)
    #[arg(long)]
    since: Option<NaiveDate>,

    /// Stop at the first message that fails
    #[arg(long)]
    fail_fast: bool,
}

impl ImapArgs {
    fn imap_config(&self) -> Result<ImapConfig, ConfigError> {
        let mut config = match (&self.host, ImapConfig::from_env()) {
            (Some(host), Some(env)) => ImapConfig {
                host: host.clone(),
                ..env
            },
            (Some(host), None) => ImapConfig::new(host.clone()),
            (None, Some(env)) => env,
            (None, None) => {
                return Err(ConfigError::MissingRequired {
                    key: "IMAP_HOST".to_string(),
                    hint: "Set IMAP_HOST or pass --host.".to_string(),
                });
            }
        };
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(user) = &self.user {
            config.username = user.clone();
        }
        if let Some(password) = &self.password {
            config.password = SecretString::from(password.clone());
        }
        if self.insecure {
            config.secure = false;
        }
        Ok(config)
    }

    fn request(&self) -> MailboxRequest {
        MailboxRequest {
            mailbox: self.mailbox.clone(),
            criteria: SearchCriteria {
                since: self.since,
                unseen_only: self.unseen,
                limit: Some(self.limit as usize),
            },
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only reports.
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG`, then `LOG_LEVEL`, then `info`.
fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("LOG_LEVEL"))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Process { input, options } => {
            let report = summarize_input(&input, &options).await?;
            emit(&report, options.format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Imap {
            connection,
            options,
        } => {
            // Install rustls crypto provider before any TLS usage
            let _ = rustls::crypto::ring::default_provider().install_default();

            let batch = summarize_mailbox(&connection, &options).await?;
            emit(&batch, options.format)?;
            if batch.failures() > 0 {
                Ok(ExitCode::FAILURE)
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}

async fn summarize_input(input: &str, options: &SummaryArgs) -> error::Result<ProcessReport> {
    let pipeline = build_pipeline(options, BatchPolicy::Abort)?;
    Ok(pipeline.process_input(input).await?)
}

async fn summarize_mailbox(
    connection: &ImapArgs,
    options: &SummaryArgs,
) -> error::Result<BatchReport> {
    let policy = if connection.fail_fast {
        BatchPolicy::Abort
    } else {
        BatchPolicy::Continue
    };
    let pipeline = build_pipeline(options, policy)?;
    let mut mailbox = ImapMailbox::new(connection.imap_config()?);
    Ok(pipeline
        .process_mailbox(&mut mailbox, &connection.request())
        .await?)
}

fn build_pipeline(options: &SummaryArgs, policy: BatchPolicy) -> error::Result<EmailPipeline> {
    let config = options.processing_config(policy);
    config.validate()?;

    let llm_config = LlmConfig::from_env()?;
    let llm = create_provider(&llm_config)?;
    let generator = LlmTextGenerator::new(llm).with_temperature(options.temperature);

    let ocr = OcrSession::new(Box::new(TesseractEngine::new(TesseractConfig::from_env())));
    Ok(EmailPipeline::new(config, Arc::new(generator), ocr))
}

fn emit<T: Display + Serialize>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{value}"),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

//! OCR through the `tesseract` command-line binary.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::OcrEngine;
use crate::error::OcrError;

/// Where to find tesseract and which trained language to use.
#[derive(Debug, Clone)]
pub struct TesseractConfig {
    pub binary: String,
    pub language: String,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            language: "eng".to_string(),
        }
    }
}

impl TesseractConfig {
    /// Build config from `TESSERACT_PATH` and `OCR_LANGUAGE`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            binary: std::env::var("TESSERACT_PATH").unwrap_or(defaults.binary),
            language: std::env::var("OCR_LANGUAGE").unwrap_or(defaults.language),
        }
    }
}

/// Runs one tesseract process per image, reading the image from stdin.
pub struct TesseractEngine {
    config: TesseractConfig,
    version: Option<String>,
}

impl TesseractEngine {
    pub fn new(config: TesseractConfig) -> Self {
        Self {
            config,
            version: None,
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn init(&mut self) -> Result<(), OcrError> {
        if self.version.is_some() {
            return Ok(());
        }

        let output = Command::new(&self.config.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| OcrError::InitFailed(format!("{}: {e}", self.config.binary)))?;
        if !output.status.success() {
            return Err(OcrError::InitFailed(format!(
                "{} --version exited with {}",
                self.config.binary, output.status
            )));
        }

        // Older releases print the version banner on stderr.
        let banner = if output.stdout.is_empty() {
            output.stderr
        } else {
            output.stdout
        };
        let version = String::from_utf8_lossy(&banner)
            .lines()
            .next()
            .unwrap_or("tesseract")
            .trim()
            .to_string();
        debug!(version = %version, language = %self.config.language, "Tesseract ready");
        self.version = Some(version);
        Ok(())
    }

    async fn recognize(&mut self, image: &[u8]) -> Result<String, OcrError> {
        if self.version.is_none() {
            return Err(OcrError::NotInitialized);
        }

        let mut child = Command::new(&self.config.binary)
            .args(["stdin", "stdout", "-l", &self.config.language])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::RecognitionFailed("tesseract stdin unavailable".into()))?;
        let feed = async move {
            let result = stdin.write_all(image).await;
            drop(stdin);
            result
        };
        let (written, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;
        written?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::RecognitionFailed(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn terminate(&mut self) -> Result<(), OcrError> {
        self.version = None;
        Ok(())
    }

    fn is_initialized(&self) -> bool {
        self.version.is_some()
    }
}

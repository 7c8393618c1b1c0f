//! OCR engine abstraction and the owned session handle the pipeline uses.
//!
//! The engine is expensive to start, so it is initialized on first use and
//! reused for every image after that. Whoever owns the [`OcrSession`] is
//! responsible for calling [`OcrSession::release`] once recognition work is
//! over.

mod tesseract;

pub use tesseract::{TesseractConfig, TesseractEngine};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::OcrError;

/// An OCR backend.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Prepare the engine. Calling this on a ready engine is a no-op.
    async fn init(&mut self) -> Result<(), OcrError>;

    /// Recognize text in PNG or JPEG bytes. Requires a prior `init`.
    async fn recognize(&mut self, image: &[u8]) -> Result<String, OcrError>;

    /// Release the engine. Safe to call when not initialized.
    async fn terminate(&mut self) -> Result<(), OcrError>;

    fn is_initialized(&self) -> bool;
}

/// Owned handle over one OCR engine.
///
/// Serializes access so at most one recognition runs at a time.
pub struct OcrSession {
    engine: Mutex<Box<dyn OcrEngine>>,
}

impl OcrSession {
    pub fn new(engine: Box<dyn OcrEngine>) -> Self {
        Self {
            engine: Mutex::new(engine),
        }
    }

    /// Initialize the engine if needed, then recognize `image`.
    pub async fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        let mut engine = self.engine.lock().await;
        if !engine.is_initialized() {
            engine.init().await?;
            info!("OCR engine initialized");
        }
        let text = engine.recognize(image).await?;
        debug!(chars = text.len(), "OCR recognition finished");
        Ok(text)
    }

    pub async fn is_initialized(&self) -> bool {
        self.engine.lock().await.is_initialized()
    }

    /// Shut the engine down. A failure is logged, not returned: release runs
    /// on error paths where there is nothing better to do with it.
    pub async fn release(&self) {
        let mut engine = self.engine.lock().await;
        if !engine.is_initialized() {
            return;
        }
        match engine.terminate().await {
            Ok(()) => info!("OCR engine terminated"),
            Err(e) => warn!(error = %e, "Failed to terminate OCR engine"),
        }
    }
}

impl Drop for OcrSession {
    fn drop(&mut self) {
        if self.engine.get_mut().is_initialized() {
            warn!("OCR session dropped without release; engine resources leaked");
        }
    }
}

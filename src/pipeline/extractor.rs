//! Content extraction: choose the body text, optionally enrich it with text
//! recognized in images.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::{ExtractionConfig, ImageRecognitionStrategy};
use crate::mail::{Attachment, StructuredMail, strip_html};
use crate::ocr::OcrSession;
use crate::pipeline::types::{
    ExtractedContent, ExtractionMetadata, IMAGE_SECTION_SEPARATOR, LANGUAGE_UNDETECTED,
};

/// Characters of an `<img>` tag quoted in its placeholder.
const INLINE_TAG_EXCERPT_CHARS: usize = 50;

/// `<img ... src="..." ...>`, attribute scan only.
static IMG_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["'][^>]*>"#).unwrap()
});

/// Extract the summarizable text of `mail`.
///
/// Never fails: missing bodies yield empty text and a failed image becomes a
/// placeholder line. The OCR session is initialized on demand but left
/// running; releasing it is the caller's job.
pub async fn extract_content(
    mail: &StructuredMail,
    config: &ExtractionConfig,
    ocr: &OcrSession,
) -> ExtractedContent {
    let mut main_text = select_main_text(mail);

    let image_texts = if config.recognize_images {
        let strategy = config.image_recognition_strategy;
        let mut texts = recognize_attachments(&mail.attachments, strategy, ocr).await;
        if let Some(html) = mail.html.as_deref() {
            texts.extend(inline_image_placeholders(html, strategy));
        }
        if !texts.is_empty() {
            main_text.push_str(IMAGE_SECTION_SEPARATOR);
            main_text.push_str(&texts.join("\n"));
        }
        Some(texts)
    } else {
        None
    };

    let content = ExtractedContent {
        main_text,
        image_texts,
        detected_language: LANGUAGE_UNDETECTED.to_string(),
        metadata: ExtractionMetadata::for_mail(mail),
    };
    info!(
        chars = content.main_text.len(),
        images = content.image_texts.as_ref().map_or(0, Vec::len),
        "Content extracted"
    );
    content
}

/// Trimmed plain body if it has content, else the stripped HTML body, else "".
pub fn select_main_text(mail: &StructuredMail) -> String {
    if let Some(text) = mail.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        return text.to_string();
    }
    match mail.html.as_deref() {
        Some(html) => strip_html(html),
        None => String::new(),
    }
}

async fn recognize_attachments(
    attachments: &[Attachment],
    strategy: ImageRecognitionStrategy,
    ocr: &OcrSession,
) -> Vec<String> {
    let mut texts = Vec::new();
    for image in attachments.iter().filter(|a| a.is_recognizable_image()) {
        let name = image.display_name();
        let text = match strategy {
            ImageRecognitionStrategy::Ocr if !image.content.is_empty() => {
                debug!(name, "Running OCR on image attachment");
                match ocr.recognize(&image.content).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(name, error = %e, "OCR failed for image attachment");
                        format!("[image recognition failed: {name} - OCR error]")
                    }
                }
            }
            _ => format!("[image description unavailable: {name}]"),
        };
        texts.push(text);
    }
    texts
}

/// One placeholder per `<img>` tag in document order.
pub fn inline_image_placeholders(html: &str, strategy: ImageRecognitionStrategy) -> Vec<String> {
    IMG_TAG
        .find_iter(html)
        .map(|m| {
            let excerpt: String = m.as_str().chars().take(INLINE_TAG_EXCERPT_CHARS).collect();
            format!("[inline image extraction unsupported: {excerpt}... - {strategy}]")
        })
        .collect()
}

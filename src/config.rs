//! Configuration types.
//!
//! One canonical [`ProcessingConfig`] drives a pipeline run: how content is
//! extracted and how it is summarized. Enumerated fields replace the loose
//! strings the command line accepts.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default number of outline points.
pub const DEFAULT_OUTLINE_POINTS: u32 = 5;

/// How images found in a message are turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ImageRecognitionStrategy {
    /// Optical character recognition.
    #[default]
    Ocr,
    /// Image description (not available; yields a placeholder).
    #[value(alias = "captioning")]
    Description,
}

impl fmt::Display for ImageRecognitionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ocr => f.write_str("ocr"),
            Self::Description => f.write_str("description"),
        }
    }
}

/// Controls image enrichment during content extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub recognize_images: bool,
    /// Only consulted when `recognize_images` is set.
    pub image_recognition_strategy: ImageRecognitionStrategy,
}

/// Output language for summaries and outlines.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Language {
    /// Answer in the language of the source text.
    #[default]
    Auto,
    /// An explicit language code such as `en` or `zh`.
    Code(String),
}

impl Language {
    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "language".to_string(),
                message: "language must not be empty".to_string(),
            });
        }
        if trimmed.eq_ignore_ascii_case("auto") {
            Ok(Self::Auto)
        } else {
            Ok(Self::Code(trimmed.to_string()))
        }
    }
}

impl TryFrom<String> for Language {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(value: Language) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Code(code) => f.write_str(code),
        }
    }
}

/// Coarse summary length hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    /// Phrase embedded in the summary prompt.
    pub fn prompt_hint(self) -> &'static str {
        match self {
            Self::Short => "a short (one to two sentence)",
            Self::Medium => "a medium-length (one paragraph)",
            Self::Long => "a detailed (several paragraph)",
        }
    }
}

/// Layout of a generated outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OutlineStyle {
    #[default]
    Bullet,
    Numbered,
    Paragraph,
}

impl OutlineStyle {
    /// Formatting instruction embedded in the outline prompt.
    pub fn prompt_hint(self) -> &'static str {
        match self {
            Self::Bullet => "a bulleted list, one point per line starting with \"- \"",
            Self::Numbered => "a numbered list, one point per line starting with \"1.\", \"2.\", ...",
            Self::Paragraph => "short paragraphs, one per point",
        }
    }
}

/// Tone of the generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Formal,
    Casual,
    #[default]
    Professional,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Formal => f.write_str("formal"),
            Self::Casual => f.write_str("casual"),
            Self::Professional => f.write_str("professional"),
        }
    }
}

/// Controls summary and outline generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarizationConfig {
    pub language: Language,
    pub summary_length: SummaryLength,
    pub generate_outline: bool,
    /// Only consulted when `generate_outline` is set. Must be at least 1.
    pub outline_points: u32,
    /// Only consulted when `generate_outline` is set.
    pub outline_style: OutlineStyle,
    pub tone: Tone,
}

impl Default for SummarizationConfig {
    fn default() -> Self {
        Self {
            language: Language::Auto,
            summary_length: SummaryLength::Medium,
            generate_outline: false,
            outline_points: DEFAULT_OUTLINE_POINTS,
            outline_style: OutlineStyle::Bullet,
            tone: Tone::Professional,
        }
    }
}

/// What to do when one message of a mailbox batch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPolicy {
    /// Record the failure and move on to the next message.
    #[default]
    Continue,
    /// Stop the batch at the first failed message.
    Abort,
}

/// Everything a pipeline run needs to know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub extraction: ExtractionConfig,
    pub summarization: SummarizationConfig,
    pub batch_policy: BatchPolicy,
}

impl ProcessingConfig {
    /// Reject values the enumerated types cannot rule out.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.summarization.outline_points == 0 {
            return Err(ConfigError::InvalidValue {
                key: "outline_points".to_string(),
                message: "must be a positive integer".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ProcessingConfig::default();
        assert!(!config.extraction.recognize_images);
        assert_eq!(
            config.extraction.image_recognition_strategy,
            ImageRecognitionStrategy::Ocr
        );
        assert!(config.summarization.language.is_auto());
        assert_eq!(config.summarization.summary_length, SummaryLength::Medium);
        assert!(!config.summarization.generate_outline);
        assert_eq!(config.summarization.outline_points, 5);
        assert_eq!(config.summarization.outline_style, OutlineStyle::Bullet);
        assert_eq!(config.summarization.tone, Tone::Professional);
        assert_eq!(config.batch_policy, BatchPolicy::Continue);
    }

    #[test]
    fn language_parses_auto_and_codes() {
        assert_eq!("AUTO".parse::<Language>().unwrap(), Language::Auto);
        assert_eq!("zh".parse::<Language>().unwrap(), Language::Code("zh".into()));
        assert!("  ".parse::<Language>().is_err());
        assert_eq!(Language::Code("en".into()).to_string(), "en");
    }

    #[test]
    fn zero_outline_points_rejected() {
        let mut config = ProcessingConfig::default();
        config.summarization.outline_points = 0;
        assert!(config.validate().is_err());
        config.summarization.outline_points = 1;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn captioning_is_an_alias_for_description() {
        let strategy =
            <ImageRecognitionStrategy as ValueEnum>::from_str("captioning", true).unwrap();
        assert_eq!(strategy, ImageRecognitionStrategy::Description);
    }

    #[test]
    fn config_serializes_with_snake_case_enums() {
        let json = serde_json::to_value(ProcessingConfig::default()).unwrap();
        assert_eq!(json["summarization"]["language"], "auto");
        assert_eq!(json["summarization"]["outline_style"], "bullet");
        assert_eq!(json["extraction"]["image_recognition_strategy"], "ocr");
    }
}

//! Summary and optional outline for extracted text.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::SummarizationConfig;
use crate::error::SummarizeError;
use crate::pipeline::generator::TextGenerator;
use crate::pipeline::types::SummarizationResult;

pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Summarize `text` and, when configured, outline it.
    ///
    /// Empty input is rejected before the generator is called; whitespace is
    /// passed through as-is. Any generator failure, and a blank summary,
    /// surface as [`SummarizeError::Generation`].
    pub async fn summarize_and_outline(
        &self,
        text: &str,
        config: &SummarizationConfig,
    ) -> Result<SummarizationResult, SummarizeError> {
        if text.is_empty() {
            return Err(SummarizeError::EmptyInput);
        }

        let summary = self
            .generator
            .generate_summary(text, &config.language, config.summary_length, config.tone)
            .await
            .inspect_err(|e| warn!(error = %e, "Summary generation failed"))?;
        if summary.trim().is_empty() {
            return Err(SummarizeError::Generation {
                reason: "model returned an empty summary".to_string(),
            });
        }

        let outline = if config.generate_outline {
            self.generator
                .generate_outline(
                    text,
                    &config.language,
                    config.outline_points,
                    config.outline_style,
                    config.tone,
                )
                .await
                .inspect_err(|e| warn!(error = %e, "Outline generation failed"))?
        } else {
            String::new()
        };

        info!(
            summary_chars = summary.len(),
            outline = config.generate_outline,
            "Summarization finished"
        );
        Ok(SummarizationResult { summary, outline })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Language, OutlineStyle, SummaryLength, Tone};
    use crate::error::LlmError;

    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct ScriptedGenerator {
        summary: String,
        fail_outline: bool,
        summary_calls: AtomicUsize,
        outline_calls: AtomicUsize,
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate_summary(
            &self,
            _text: &str,
            _language: &Language,
            _length: SummaryLength,
            _tone: Tone,
        ) -> Result<String, LlmError> {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.summary.clone())
        }

        async fn generate_outline(
            &self,
            _text: &str,
            _language: &Language,
            points: u32,
            _style: OutlineStyle,
            _tone: Tone,
        ) -> Result<String, LlmError> {
            self.outline_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_outline {
                return Err(LlmError::RateLimited {
                    provider: "scripted".into(),
                    retry_after: None,
                });
            }
            Ok((1..=points).map(|i| format!("- point {i}")).collect::<Vec<_>>().join("\n"))
        }
    }

    fn generator(summary: &str) -> Arc<ScriptedGenerator> {
        Arc::new(ScriptedGenerator {
            summary: summary.to_string(),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn empty_text_rejected_without_calling_generator() {
        let generator = generator("unused");
        let summarizer = Summarizer::new(generator.clone());

        let configs = [
            SummarizationConfig::default(),
            SummarizationConfig {
                language: Language::Code("fr".into()),
                summary_length: SummaryLength::Long,
                generate_outline: true,
                outline_points: 3,
                outline_style: OutlineStyle::Numbered,
                tone: Tone::Casual,
            },
        ];
        for config in &configs {
            let err = summarizer.summarize_and_outline("", config).await.unwrap_err();
            assert!(err.is_empty_input());
            assert_eq!(err.to_string(), "Summarization failed: input text is empty");
        }
        assert_eq!(generator.summary_calls.load(Ordering::SeqCst), 0);
        assert_eq!(generator.outline_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn whitespace_text_reaches_generator() {
        let generator = generator("Nothing to report.");
        let summarizer = Summarizer::new(generator.clone());

        let result = summarizer
            .summarize_and_outline("  \n\t ", &SummarizationConfig::default())
            .await
            .unwrap();
        assert_eq!(result.summary, "Nothing to report.");
        assert_eq!(generator.summary_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn outline_skipped_unless_requested() {
        let generator = generator("Short summary.");
        let summarizer = Summarizer::new(generator.clone());

        let result = summarizer
            .summarize_and_outline("Some text", &SummarizationConfig::default())
            .await
            .unwrap();
        assert_eq!(result.summary, "Short summary.");
        assert_eq!(result.outline, "");
        assert_eq!(generator.outline_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn outline_generated_with_requested_points() {
        let summarizer = Summarizer::new(generator("Summary."));
        let config = SummarizationConfig {
            generate_outline: true,
            outline_points: 3,
            ..Default::default()
        };

        let result = summarizer
            .summarize_and_outline("Some text", &config)
            .await
            .unwrap();
        assert_eq!(result.outline, "- point 1\n- point 2\n- point 3");
    }

    #[tokio::test]
    async fn blank_summary_is_a_generation_failure() {
        let summarizer = Summarizer::new(generator("   "));
        let err = summarizer
            .summarize_and_outline("Some text", &SummarizationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SummarizeError::Generation { .. }));
    }

    #[tokio::test]
    async fn outline_failure_fails_whole_call() {
        let summarizer = Summarizer::new(Arc::new(ScriptedGenerator {
            summary: "Summary.".into(),
            fail_outline: true,
            ..Default::default()
        }));
        let config = SummarizationConfig {
            generate_outline: true,
            ..Default::default()
        };

        let err = summarizer
            .summarize_and_outline("Some text", &config)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Summarization failed: "));
        assert!(err.to_string().contains("rate limited"));
    }
}

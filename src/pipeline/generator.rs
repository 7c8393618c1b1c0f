//! Text generation: summary and outline prompts sent to an LLM.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::{Language, OutlineStyle, SummaryLength, Tone};
use crate::error::LlmError;
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider};

/// Default sampling temperature for both calls.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Token budget for a summary.
const SUMMARY_MAX_TOKENS: u32 = 1024;

/// Token budget per requested outline point.
const OUTLINE_TOKENS_PER_POINT: u32 = 50;

/// Longest source text sent to the model, in characters.
const MAX_SOURCE_CHARS: usize = 60_000;

/// Produces summaries and outlines for a piece of text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate_summary(
        &self,
        text: &str,
        language: &Language,
        length: SummaryLength,
        tone: Tone,
    ) -> Result<String, LlmError>;

    async fn generate_outline(
        &self,
        text: &str,
        language: &Language,
        points: u32,
        style: OutlineStyle,
        tone: Tone,
    ) -> Result<String, LlmError>;
}

/// [`TextGenerator`] backed by any [`LlmProvider`].
pub struct LlmTextGenerator {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl LlmTextGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn run(
        &self,
        system_prompt: String,
        user_prompt: String,
        max_tokens: u32,
    ) -> Result<String, LlmError> {
        let request = CompletionRequest::new(vec![
            ChatMessage::system(system_prompt),
            ChatMessage::user(user_prompt),
        ])
        .with_temperature(self.temperature)
        .with_max_tokens(max_tokens);

        let response = self.llm.complete(request).await?;
        debug!(
            model = self.llm.model_name(),
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Generation finished"
        );
        Ok(response.content.trim().to_string())
    }
}

#[async_trait]
impl TextGenerator for LlmTextGenerator {
    async fn generate_summary(
        &self,
        text: &str,
        language: &Language,
        length: SummaryLength,
        tone: Tone,
    ) -> Result<String, LlmError> {
        let system_prompt = format!(
            "You summarize emails. Write {length} summary in a {tone} tone, {language}.\n\n\
             Rules:\n\
             - Keep the facts, requests, dates and amounts\n\
             - Do not invent anything that is not in the email\n\
             - Output only the summary text, no heading or preamble",
            length = length.prompt_hint(),
            language = language_instruction(language),
        );
        let user_prompt = format!("Email content:\n\"\"\"\n{}\n\"\"\"", clip(text));
        self.run(system_prompt, user_prompt, SUMMARY_MAX_TOKENS).await
    }

    async fn generate_outline(
        &self,
        text: &str,
        language: &Language,
        points: u32,
        style: OutlineStyle,
        tone: Tone,
    ) -> Result<String, LlmError> {
        let system_prompt = format!(
            "You outline emails. List the {points} most important points as {style}, \
             in a {tone} tone, {language}.\n\n\
             Output only the outline, no heading or preamble.",
            style = style.prompt_hint(),
            language = language_instruction(language),
        );
        let user_prompt = format!("Email content:\n\"\"\"\n{}\n\"\"\"", clip(text));
        self.run(
            system_prompt,
            user_prompt,
            points.saturating_mul(OUTLINE_TOKENS_PER_POINT),
        )
        .await
    }
}

fn language_instruction(language: &Language) -> String {
    match language {
        Language::Auto => "in the same language as the email".to_string(),
        Language::Code(code) => format!("in the language with code \"{code}\""),
    }
}

/// Cut overly long input at a char boundary.
fn clip(text: &str) -> &str {
    match text.char_indices().nth(MAX_SOURCE_CHARS) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

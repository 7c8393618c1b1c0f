//! HTML to plain text conversion.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

/// Wrap width used when rendering HTML.
const WRAP_WIDTH: usize = 130;

static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank-line regex"));

/// Convert HTML to readable plain text.
///
/// Paragraph breaks survive as blank lines, runs of blank lines collapse to
/// one, and trailing whitespace is dropped. A rendering failure yields an
/// empty string so extraction can carry on.
pub fn strip_html(html: &str) -> String {
    if html.trim().is_empty() {
        return String::new();
    }

    match html2text::from_read(html.as_bytes(), WRAP_WIDTH) {
        Ok(text) => normalize_whitespace(&text),
        Err(e) => {
            warn!(error = %e, "HTML conversion failed, dropping HTML body");
            String::new()
        }
    }
}

fn normalize_whitespace(text: &str) -> String {
    let trimmed_lines = text
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    BLANK_RUNS
        .replace_all(&trimmed_lines, "\n\n")
        .trim()
        .to_string()
}

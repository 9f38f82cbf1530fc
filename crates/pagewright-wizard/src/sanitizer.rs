//! Validation of raw generation output
//!
//! Fail closed: anything that is not a complete HTML document with each
//! placeholder token exactly once is rejected, never patched up.

use pagewright_core::{PagewrightError, PlaceholderToken, Result};
use regex::Regex;
use std::sync::OnceLock;

static DOCTYPE: OnceLock<Regex> = OnceLock::new();
static FENCE_OPEN: OnceLock<Regex> = OnceLock::new();

fn doctype() -> &'static Regex {
    DOCTYPE.get_or_init(|| Regex::new(r"(?i)^<!doctype\s+html\s*>").expect("valid regex"))
}

fn fence_open() -> &'static Regex {
    FENCE_OPEN.get_or_init(|| Regex::new(r"^```[A-Za-z0-9_-]*[ \t]*\r?\n").expect("valid regex"))
}

/// Turn raw service output into a validated HTML document
pub fn sanitize(raw_text: &str) -> Result<String> {
    let html = strip_code_fences(raw_text);
    check_structure(html)?;

    for token in PlaceholderToken::all() {
        match token.occurrences(html) {
            1 => {}
            0 => {
                return Err(PagewrightError::InvalidOutput(format!(
                    "placeholder {} for the {} is missing",
                    token,
                    token.role()
                )))
            }
            n => {
                return Err(PagewrightError::InvalidOutput(format!(
                    "placeholder {} appears {} times",
                    token, n
                )))
            }
        }
    }

    Ok(html.to_string())
}

/// Remove a surrounding Markdown code fence, if any, and outer whitespace
pub fn strip_code_fences(raw_text: &str) -> &str {
    let mut text = raw_text.trim().trim_start_matches('\u{feff}');

    if let Some(open) = fence_open().find(text) {
        text = &text[open.end()..];
        text = text.trim_end();
        if let Some(stripped) = text.strip_suffix("```") {
            text = stripped;
        }
    }

    text.trim()
}

/// Doctype first, `</html>` last, and nothing but whitespace around them
pub fn check_structure(html: &str) -> Result<()> {
    if !doctype().is_match(html) {
        return Err(PagewrightError::InvalidOutput(
            "document does not start with <!DOCTYPE html>".to_string(),
        ));
    }

    let lower = html.to_ascii_lowercase();
    if !lower.contains("<html") {
        return Err(PagewrightError::InvalidOutput(
            "document has no <html> root element".to_string(),
        ));
    }
    if !lower.trim_end().ends_with("</html>") {
        return Err(PagewrightError::InvalidOutput(
            "document does not end with </html>".to_string(),
        ));
    }

    Ok(())
}

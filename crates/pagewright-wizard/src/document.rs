//! The generated artifact

use chrono::{DateTime, Utc};
use pagewright_core::{AssetRole, Result};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

use crate::briefing::Briefing;

const FALLBACK_NAME: &str = "landing-page";
const MAX_NAME_LEN: usize = 60;

static TITLE: OnceLock<Regex> = OnceLock::new();

fn title_regex() -> &'static Regex {
    TITLE.get_or_init(|| Regex::new(r"(?is)<title[^>]*>(.*?)</title>").expect("valid regex"))
}

/// A validated HTML document produced by generation
///
/// Documents are immutable. Refinement produces a new document with a
/// higher revision instead of editing this one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedDocument {
    raw_text: String,
    sanitized_html: String,
    source_briefing_snapshot: Briefing,
    created_at: DateTime<Utc>,
    request_fingerprint: String,
    revision: u32,
}

impl GeneratedDocument {
    pub fn new(
        raw_text: impl Into<String>,
        sanitized_html: impl Into<String>,
        source_briefing_snapshot: Briefing,
        request_fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            sanitized_html: sanitized_html.into(),
            source_briefing_snapshot,
            created_at: Utc::now(),
            request_fingerprint: request_fingerprint.into(),
            revision: 0,
        }
    }

    /// Successor document carrying new HTML; raw text and briefing are inherited
    pub fn refined(&self, sanitized_html: impl Into<String>) -> Self {
        Self {
            raw_text: self.raw_text.clone(),
            sanitized_html: sanitized_html.into(),
            source_briefing_snapshot: self.source_briefing_snapshot.clone(),
            created_at: Utc::now(),
            request_fingerprint: self.request_fingerprint.clone(),
            revision: self.revision + 1,
        }
    }

    /// Unmodified service output of the generation this document descends from
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn sanitized_html(&self) -> &str {
        &self.sanitized_html
    }

    pub fn source_briefing_snapshot(&self) -> &Briefing {
        &self.source_briefing_snapshot
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn request_fingerprint(&self) -> &str {
        &self.request_fingerprint
    }

    /// 0 for a fresh generation, +1 per successful refinement
    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn has_placeholder(&self, role: AssetRole) -> bool {
        role.placeholder().occurrences(&self.sanitized_html) > 0
    }

    /// Text of the `<title>` element, if present and non-blank
    pub fn title(&self) -> Option<String> {
        let captures = title_regex().captures(&self.sanitized_html)?;
        let title = captures.get(1)?.as_str().trim();
        if title.is_empty() {
            None
        } else {
            Some(title.to_string())
        }
    }

    /// File name for download, e.g. `acme-bakery.html`
    pub fn download_name(&self) -> String {
        let slug = self
            .title()
            .map(|title| slugify(&title))
            .filter(|slug| !slug.is_empty())
            .unwrap_or_else(|| FALLBACK_NAME.to_string());
        format!("{}.html", slug)
    }

    /// Write the HTML as a single standalone file
    pub async fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, self.sanitized_html.as_bytes()).await?;
        tracing::info!(
            "Wrote document revision {} ({} bytes) to {}",
            self.revision,
            self.sanitized_html.len(),
            path.display()
        );
        Ok(())
    }
}

fn slugify(text: &str) -> String {
    let mut slug = String::new();
    let mut pending_dash = false;

    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            slug.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_NAME_LEN {
            break;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagewright_core::PlaceholderToken;
    use tempfile::TempDir;

    fn document(title: &str) -> GeneratedDocument {
        let html = format!(
            "<!DOCTYPE html><html><head><title>{}</title></head><body><img src=\"{}\"></body></html>",
            title,
            PlaceholderToken::LOGO
        );
        GeneratedDocument::new(html.clone(), html, Briefing::new(), "abc123")
    }

    #[test]
    fn test_download_name_from_title() {
        assert_eq!(document("Acme Bakery").download_name(), "acme-bakery.html");
        assert_eq!(
            document("  Café & Co. | Home ").download_name(),
            "caf-co-home.html"
        );
    }

    #[test]
    fn test_download_name_fallback() {
        assert_eq!(document("").download_name(), "landing-page.html");
        assert_eq!(document("¡¿!").download_name(), "landing-page.html");
    }

    #[test]
    fn test_refined_increments_revision() {
        let original = document("Acme Bakery");
        let refined = original.refined("<!DOCTYPE html><html></html>");

        assert_eq!(original.revision(), 0);
        assert_eq!(refined.revision(), 1);
        assert_eq!(refined.raw_text(), original.raw_text());
        assert_eq!(refined.request_fingerprint(), "abc123");
        assert!(original.has_placeholder(AssetRole::Logo));
        assert!(!refined.has_placeholder(AssetRole::Logo));
    }

    #[tokio::test]
    async fn test_write_to_creates_file() {
        let dir = TempDir::new().unwrap();
        let doc = document("Acme Bakery");
        let path = dir.path().join("out").join(doc.download_name());

        doc.write_to(&path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, doc.sanitized_html());
    }
}

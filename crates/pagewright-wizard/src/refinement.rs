//! Asset refinement by deterministic placeholder substitution
//!
//! Each asset replaces its role's placeholder token with an inline
//! `data:` URI. No generation call is involved, so everything outside
//! the placeholder is left byte-for-byte intact.

use base64::{engine::general_purpose, Engine as _};
use pagewright_core::{Asset, AssetRole, PagewrightError, PlaceholderToken, Result};
use std::collections::BTreeSet;

use crate::document::GeneratedDocument;
use crate::sanitizer;

const DEFAULT_MAX_ASSET_BYTES: usize = 5 * 1024 * 1024;

/// Result of a refinement request
#[derive(Debug, Clone, PartialEq)]
pub enum RefinementOutcome {
    /// No assets were supplied; the document is returned as it was
    NoChangeRequested(GeneratedDocument),
    /// Placeholders were substituted into a new document revision
    Refined(GeneratedDocument),
}

impl RefinementOutcome {
    pub fn document(&self) -> &GeneratedDocument {
        match self {
            RefinementOutcome::NoChangeRequested(doc) | RefinementOutcome::Refined(doc) => doc,
        }
    }

    pub fn into_document(self) -> GeneratedDocument {
        match self {
            RefinementOutcome::NoChangeRequested(doc) | RefinementOutcome::Refined(doc) => doc,
        }
    }

    pub fn is_changed(&self) -> bool {
        matches!(self, RefinementOutcome::Refined(_))
    }
}

/// Injects user assets into a generated document
#[derive(Debug, Clone)]
pub struct RefinementCoordinator {
    max_asset_bytes: usize,
}

impl RefinementCoordinator {
    pub fn new(max_asset_bytes: usize) -> Self {
        Self { max_asset_bytes }
    }

    pub fn max_asset_bytes(&self) -> usize {
        self.max_asset_bytes
    }

    /// Substitute every asset into `document`, all or nothing
    ///
    /// Fails with `SubstitutionFailed` when a role has no placeholder left.
    pub fn refine(
        &self,
        document: &GeneratedDocument,
        assets: &[Asset],
    ) -> Result<RefinementOutcome> {
        if assets.is_empty() {
            return Ok(RefinementOutcome::NoChangeRequested(document.clone()));
        }

        let mut seen = BTreeSet::new();
        for asset in assets {
            if !seen.insert(asset.role) {
                return Err(PagewrightError::DuplicateAsset(asset.role));
            }
            asset.validate(self.max_asset_bytes)?;
        }

        let mut html = document.sanitized_html().to_string();
        for asset in assets {
            let token = asset.role.placeholder();
            match token.occurrences(&html) {
                0 => return Err(PagewrightError::SubstitutionFailed(asset.role)),
                1 => {}
                n => {
                    return Err(PagewrightError::InvalidOutput(format!(
                        "placeholder {} appears {} times",
                        token, n
                    )))
                }
            }
            html = html.replacen(token.as_str(), &data_uri(asset), 1);
            tracing::debug!(
                "Substituted {} ({} bytes, {})",
                asset.role,
                asset.bytes.len(),
                asset.mime_type
            );
        }

        sanitizer::check_structure(&html)?;
        for token in PlaceholderToken::all() {
            if token.occurrences(&html) > 1 {
                return Err(PagewrightError::InvalidOutput(format!(
                    "refinement left placeholder {} duplicated",
                    token
                )));
            }
        }

        let roles: Vec<AssetRole> = assets.iter().map(|a| a.role).collect();
        let refined = document.refined(html);
        tracing::info!(
            "Refined document to revision {} with {:?}",
            refined.revision(),
            roles
        );
        Ok(RefinementOutcome::Refined(refined))
    }
}

impl Default for RefinementCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ASSET_BYTES)
    }
}

/// Inline image reference for an asset
pub fn data_uri(asset: &Asset) -> String {
    format!(
        "data:{};base64,{}",
        asset.mime_type,
        general_purpose::STANDARD.encode(&asset.bytes)
    )
}

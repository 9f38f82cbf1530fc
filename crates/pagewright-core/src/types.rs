//! Core type definitions shared across Pagewright crates

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{PagewrightError, Result};

/// One question in the wizard interview
///
/// Ids are 1-based and contiguous within a question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionSpec {
    pub id: u32,
    pub prompt: String,
    #[serde(default)]
    pub help_text: String,
    #[serde(default)]
    pub category_label: String,
    /// Blank answers are rejected for required questions
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl QuestionSpec {
    pub fn new(
        id: u32,
        prompt: impl Into<String>,
        help_text: impl Into<String>,
        category_label: impl Into<String>,
    ) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            help_text: help_text.into(),
            category_label: category_label.into(),
            required: true,
        }
    }

    /// Mark this question as skippable
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// Which slot of the generated page an asset fills
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetRole {
    Logo,
    HeroImage,
}

impl AssetRole {
    pub const ALL: [AssetRole; 2] = [AssetRole::Logo, AssetRole::HeroImage];

    /// The placeholder token generation embeds for this role
    pub fn placeholder(&self) -> PlaceholderToken {
        PlaceholderToken::for_role(*self)
    }
}

impl fmt::Display for AssetRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRole::Logo => write!(f, "logo"),
            AssetRole::HeroImage => write!(f, "hero image"),
        }
    }
}

impl std::str::FromStr for AssetRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', ' '], "_").as_str() {
            "logo" => Ok(AssetRole::Logo),
            "hero" | "hero_image" => Ok(AssetRole::HeroImage),
            _ => Err(format!("Invalid asset role: {}. Use logo or hero.", s)),
        }
    }
}

/// Marker string embedded in generated output where an asset belongs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaceholderToken {
    role: AssetRole,
    marker: &'static str,
}

impl PlaceholderToken {
    pub const LOGO: PlaceholderToken = PlaceholderToken {
        role: AssetRole::Logo,
        marker: "{{PAGEWRIGHT_LOGO}}",
    };

    pub const HERO_IMAGE: PlaceholderToken = PlaceholderToken {
        role: AssetRole::HeroImage,
        marker: "{{PAGEWRIGHT_HERO_IMAGE}}",
    };

    pub fn for_role(role: AssetRole) -> Self {
        match role {
            AssetRole::Logo => Self::LOGO,
            AssetRole::HeroImage => Self::HERO_IMAGE,
        }
    }

    pub fn all() -> [PlaceholderToken; 2] {
        [Self::LOGO, Self::HERO_IMAGE]
    }

    pub fn role(&self) -> AssetRole {
        self.role
    }

    pub fn as_str(&self) -> &'static str {
        self.marker
    }

    /// Number of non-overlapping occurrences in `text`
    pub fn occurrences(&self, text: &str) -> usize {
        text.matches(self.marker).count()
    }
}

impl fmt::Display for PlaceholderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker)
    }
}

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: &[u8] = &[0xFF, 0xD8, 0xFF];

/// A user-supplied image for one refinement call
///
/// Assets are never persisted; they live only as long as the call that
/// consumes them.
#[derive(Clone, PartialEq, Eq)]
pub struct Asset {
    pub role: AssetRole,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Asset {
    pub fn new(role: AssetRole, bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            role,
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn logo(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self::new(AssetRole::Logo, bytes, mime_type)
    }

    pub fn hero_image(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self::new(AssetRole::HeroImage, bytes, mime_type)
    }

    /// Check type, signature and size before the asset is embedded
    pub fn validate(&self, max_bytes: usize) -> Result<()> {
        if self.bytes.is_empty() {
            return Err(PagewrightError::InvalidAsset(format!("{} is empty", self.role)));
        }

        if self.bytes.len() > max_bytes {
            return Err(PagewrightError::InvalidAsset(format!(
                "{} is {} bytes, limit is {}",
                self.role,
                self.bytes.len(),
                max_bytes
            )));
        }

        let signature = match self.mime_type.as_str() {
            "image/png" => PNG_SIGNATURE,
            "image/jpeg" => JPEG_SIGNATURE,
            other => {
                return Err(PagewrightError::InvalidAsset(format!(
                    "{} has unsupported type {} (expected image/png or image/jpeg)",
                    self.role, other
                )))
            }
        };

        if !self.bytes.starts_with(signature) {
            return Err(PagewrightError::InvalidAsset(format!(
                "{} content does not match {}",
                self.role, self.mime_type
            )));
        }

        Ok(())
    }
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("role", &self.role)
            .field("bytes", &self.bytes.len())
            .field("mime_type", &self.mime_type)
            .finish()
    }
}

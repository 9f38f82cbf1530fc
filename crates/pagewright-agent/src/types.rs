//! Type definitions for generation service interactions

use serde::{Deserialize, Serialize};

/// Gemini model variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    #[default]
    Flash,
    Pro,
}

impl Model {
    /// Get the API model name
    pub fn api_name(&self) -> &'static str {
        match self {
            Model::Flash => "gemini-1.5-flash",
            Model::Pro => "gemini-1.5-pro",
        }
    }
}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Model::Flash => write!(f, "flash"),
            Model::Pro => write!(f, "pro"),
        }
    }
}

impl std::str::FromStr for Model {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "flash" | "gemini-1.5-flash" => Ok(Model::Flash),
            "pro" | "gemini-1.5-pro" => Ok(Model::Pro),
            _ => Err(format!("Invalid model: {}. Use flash or pro.", s)),
        }
    }
}

/// `generateContent` request body
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationParams,
}

impl GenerateContentRequest {
    /// Single-turn user request
    pub fn user_text(text: &str, temperature: f32, max_output_tokens: u32) -> Self {
        Self {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: text.to_string(),
                }],
            }],
            generation_config: GenerationParams {
                temperature,
                max_output_tokens,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// `generateContent` response body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<Usage>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    pub fn first_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let content = candidate.content.as_ref()?;
        let text: String = content.parts.iter().map(|p| p.text.as_str()).collect();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Why the first candidate stopped, e.g. `STOP`, `MAX_TOKENS`, `SAFETY`
    pub fn finish_reason(&self) -> Option<&str> {
        self.candidates.first()?.finish_reason.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub prompt_token_count: usize,
    #[serde(default)]
    pub candidates_token_count: usize,
}

//! # pagewright-core
//!
//! Core types for the Pagewright guided page builder.
//!
//! Pagewright interviews a user through an ordered questionnaire, turns the
//! answers into a generation request, validates the returned HTML document
//! and then lets the user drop their own logo and hero image into it.
//!
//! This crate holds what every other crate shares:
//! - The unified [`PagewrightError`] and the transport [`GenerationFailure`] kinds
//! - Domain types: questions, asset roles, placeholder tokens
//! - [`PagewrightConfig`] loaded from `.pagewright/config.toml`
//! - Bounded exponential backoff for transient failures ([`retry`])

pub mod config;
mod error;
pub mod retry;
mod types;

pub use config::{AssetConfig, GenerationConfig, PagewrightConfig, RetryConfig, WizardConfig};
pub use error::{GenerationFailure, PagewrightError, Result};
pub use retry::{retry_transient, RetryPolicy};
pub use types::*;

//! # pagewright-agent
//!
//! Client for the external generative text service used by Pagewright.
//!
//! The [`GenerationClient`] trait is the boundary the wizard depends on;
//! [`GeminiClient`] is the production implementation. Tests substitute
//! their own implementation of the trait.

mod auth;
mod client;
mod types;

pub use auth::get_api_key;
pub use client::{failure_for_status, GeminiClient, GenerationClient};
pub use types::*;

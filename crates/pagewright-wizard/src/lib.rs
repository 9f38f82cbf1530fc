//! # pagewright-wizard
//!
//! The guided page-builder wizard.
//!
//! This crate provides:
//! - The landing-page questionnaire ([`QuestionBank`]) and collected answers ([`Briefing`])
//! - Request synthesis from a completed briefing
//! - Validation of generated HTML ([`sanitizer`])
//! - Deterministic asset injection ([`RefinementCoordinator`])
//! - The [`WizardController`] that drives a [`WizardSession`] through the
//!   interview, generation and refinement states

mod briefing;
mod controller;
mod document;
mod prompt;
mod question_bank;
mod refinement;
pub mod sanitizer;
mod state_machine;

pub use briefing::Briefing;
pub use controller::{SharedSession, WizardController, WizardSession};
pub use document::GeneratedDocument;
pub use prompt::{request_fingerprint, synthesize};
pub use question_bank::QuestionBank;
pub use refinement::{data_uri, RefinementCoordinator, RefinementOutcome};
pub use state_machine::{transition, Event, WizardState};

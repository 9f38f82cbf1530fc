//! Pure state machine for the wizard control flow
//!
//! This module implements a pure state machine with NO I/O.
//! All state transitions are deterministic and testable.
//!
//! Key design principles:
//! - Pure function: transition(state, event, question_count) -> state
//! - One dispatch point for every wizard operation
//! - Disallowed transitions are rejected with an error and leave the
//!   caller's state untouched (never panic, never a half-applied change)

use pagewright_core::{PagewrightError, Result};
use serde::Serialize;
use std::fmt;

/// Wizard state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WizardState {
    /// Session created, interview not begun
    #[default]
    NotStarted,
    /// Showing question `step` (1-based)
    Asking { step: u32 },
    /// All questions answered, waiting for generate or edit
    Review,
    /// Generation call in flight
    Generating,
    /// A document is available; stable resting state
    Generated,
    /// Asset substitution in progress
    Refining,
    /// Generation failed; briefing kept for retry
    Error { message: String },
}

impl WizardState {
    /// Whether an operation is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self, WizardState::Generating | WizardState::Refining)
    }

    pub fn step(&self) -> Option<u32> {
        match self {
            WizardState::Asking { step } => Some(*step),
            _ => None,
        }
    }
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardState::NotStarted => write!(f, "not started"),
            WizardState::Asking { step } => write!(f, "asking question {}", step),
            WizardState::Review => write!(f, "in review"),
            WizardState::Generating => write!(f, "generating"),
            WizardState::Generated => write!(f, "generated"),
            WizardState::Refining => write!(f, "refining"),
            WizardState::Error { .. } => write!(f, "in error"),
        }
    }
}

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Begin the interview
    Start,
    /// Record an answer for `step` (no state change)
    Answer { step: u32 },
    /// Advance; `answered` is false when a required answer is blank
    Next { answered: bool },
    /// Return to the previous question
    Back,
    /// Leave review and restart from question 1 keeping answers
    EditAnswers,
    /// Request generation (also the retry from Error)
    Generate,
    /// Generation produced a valid document
    GenerationSucceeded,
    /// Generation failed
    GenerationFailed { message: String },
    /// Begin asset refinement
    Refine,
    /// Refinement ended, successfully or not
    RefinementFinished,
    /// Discard everything
    Reset,
}

impl Event {
    fn operation(&self) -> &'static str {
        match self {
            Event::Start => "start",
            Event::Answer { .. } => "answer",
            Event::Next { .. } => "go to the next question",
            Event::Back => "go back",
            Event::EditAnswers => "edit answers",
            Event::Generate => "generate",
            Event::GenerationSucceeded => "complete generation",
            Event::GenerationFailed { .. } => "fail generation",
            Event::Refine => "refine",
            Event::RefinementFinished => "finish refinement",
            Event::Reset => "reset",
        }
    }
}

/// Pure state transition function
///
/// Takes the current state, an event and the number of questions, and
/// returns the next state. The caller commits the returned state; on
/// error nothing changes.
pub fn transition(state: &WizardState, event: Event, question_count: u32) -> Result<WizardState> {
    match (state, event) {
        // Reset is valid from every state
        (_, Event::Reset) => Ok(WizardState::NotStarted),

        // From NotStarted
        (WizardState::NotStarted, Event::Start) if question_count > 0 => {
            Ok(WizardState::Asking { step: 1 })
        }

        // From Asking
        (WizardState::Asking { step }, Event::Answer { step: answered_step })
            if *step == answered_step =>
        {
            Ok(state.clone())
        }

        (WizardState::Asking { step }, Event::Next { answered }) => {
            if !answered {
                return Err(PagewrightError::AnswerRequired { step: *step });
            }
            if *step < question_count {
                Ok(WizardState::Asking { step: step + 1 })
            } else {
                Ok(WizardState::Review)
            }
        }

        (WizardState::Asking { step }, Event::Back) if *step > 1 => {
            Ok(WizardState::Asking { step: step - 1 })
        }

        // From Review or Error
        (WizardState::Review, Event::EditAnswers)
        | (WizardState::Error { .. }, Event::EditAnswers) => Ok(WizardState::Asking { step: 1 }),

        (WizardState::Review, Event::Generate) | (WizardState::Error { .. }, Event::Generate) => {
            Ok(WizardState::Generating)
        }

        // From Generating
        (WizardState::Generating, Event::GenerationSucceeded) => Ok(WizardState::Generated),

        (WizardState::Generating, Event::GenerationFailed { message }) => {
            Ok(WizardState::Error { message })
        }

        // From Generated / Refining
        (WizardState::Generated, Event::Refine) => Ok(WizardState::Refining),

        (WizardState::Refining, Event::RefinementFinished) => Ok(WizardState::Generated),

        // All other transitions are disallowed
        (state, event) => Err(PagewrightError::InvalidTransition {
            operation: event.operation().to_string(),
            state: state.to_string(),
        }),
    }
}

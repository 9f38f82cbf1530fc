//! Accumulated interview answers

use pagewright_core::{PagewrightError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::question_bank::QuestionBank;

/// Answers keyed by question id, in question order
///
/// Never holds an entry for an id outside the bank it was recorded against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Briefing {
    answers: BTreeMap<u32, String>,
}

impl Briefing {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or overwrite) the answer for `step`
    pub fn record(&mut self, bank: &QuestionBank, step: u32, text: impl Into<String>) -> Result<()> {
        if !bank.contains(step) {
            return Err(PagewrightError::StepOutOfRange {
                step,
                count: bank.count(),
            });
        }
        self.answers.insert(step, text.into());
        Ok(())
    }

    /// Answer text, empty when nothing was entered
    pub fn answer(&self, step: u32) -> &str {
        self.answers.get(&step).map(String::as_str).unwrap_or("")
    }

    pub fn has_answer(&self, step: u32) -> bool {
        self.answers.contains_key(&step)
    }

    /// Required question ids whose answer is missing or blank
    pub fn missing_required(&self, bank: &QuestionBank) -> Vec<u32> {
        bank.iter()
            .filter(|q| q.required && self.answer(q.id).trim().is_empty())
            .map(|q| q.id)
            .collect()
    }

    pub fn is_complete(&self, bank: &QuestionBank) -> bool {
        self.missing_required(bank).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.answers.iter().map(|(id, text)| (*id, text.as_str()))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }
}

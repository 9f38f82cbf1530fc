//! Ordered questionnaire for the page-builder interview

use pagewright_core::{PagewrightError, QuestionSpec, Result, WizardConfig};

const BRAND: &str = "Brand identity";
const CONTENT: &str = "Page content";

/// Read-only, ordered list of interview questions
///
/// Ids always run contiguously from 1 to [`count`](Self::count).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<QuestionSpec>,
}

impl QuestionBank {
    /// Built-in landing page flavor: branding first, then content
    pub fn landing_page() -> Self {
        Self {
            questions: vec![
                QuestionSpec::new(
                    1,
                    "What visual style should the page have?",
                    "For example: modern and minimal, warm and rustic, bold and playful.",
                    BRAND,
                ),
                QuestionSpec::new(
                    2,
                    "Which colors represent your brand?",
                    "Name two or three colors or paste hex codes, e.g. #2E7D32 and cream.",
                    BRAND,
                ),
                QuestionSpec::new(
                    3,
                    "What is the name of your business?",
                    "Used as the page title and in the header next to your logo.",
                    CONTENT,
                ),
                QuestionSpec::new(
                    4,
                    "What do you sell or offer?",
                    "Describe your main products or services in a few sentences.",
                    CONTENT,
                ),
                QuestionSpec::new(
                    5,
                    "Who are your ideal customers?",
                    "Describe their needs, problems and what they are looking for.",
                    CONTENT,
                ),
                QuestionSpec::new(
                    6,
                    "What makes you different from competitors?",
                    "Your unique selling point: quality, price, speed, tradition...",
                    CONTENT,
                ),
                QuestionSpec::new(
                    7,
                    "What should visitors do, and how can they reach you?",
                    "Call to action plus contact details: phone, e-mail, address, social links.",
                    CONTENT,
                ),
            ],
        }
    }

    /// Build a bank from explicit specs, validating contiguous ids
    pub fn from_specs(questions: Vec<QuestionSpec>) -> Result<Self> {
        if questions.is_empty() {
            return Err(PagewrightError::Config(
                "A question bank needs at least one question".to_string(),
            ));
        }

        for (index, question) in questions.iter().enumerate() {
            let expected = index as u32 + 1;
            if question.id != expected {
                return Err(PagewrightError::Config(format!(
                    "Question ids must be contiguous from 1: expected {}, found {}",
                    expected, question.id
                )));
            }
        }

        Ok(Self { questions })
    }

    /// Custom questions from config, or the built-in flavor
    pub fn from_config(config: &WizardConfig) -> Result<Self> {
        if config.questions.is_empty() {
            Ok(Self::landing_page())
        } else {
            Self::from_specs(config.questions.clone())
        }
    }

    pub fn get(&self, step: u32) -> Option<&QuestionSpec> {
        let index = step.checked_sub(1)? as usize;
        self.questions.get(index)
    }

    pub fn count(&self) -> u32 {
        self.questions.len() as u32
    }

    pub fn contains(&self, step: u32) -> bool {
        step >= 1 && step <= self.count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QuestionSpec> {
        self.questions.iter()
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::landing_page()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landing_page_ids_contiguous() {
        let bank = QuestionBank::landing_page();
        assert_eq!(bank.count(), 7);
        for (index, question) in bank.iter().enumerate() {
            assert_eq!(question.id, index as u32 + 1);
        }
    }

    #[test]
    fn test_branding_before_content() {
        let bank = QuestionBank::landing_page();
        let labels: Vec<_> = bank.iter().map(|q| q.category_label.as_str()).collect();
        let first_content = labels.iter().position(|l| *l == CONTENT).unwrap();
        assert!(labels[..first_content].iter().all(|l| *l == BRAND));
        assert!(labels[first_content..].iter().all(|l| *l == CONTENT));
    }

    #[test]
    fn test_get_out_of_range() {
        let bank = QuestionBank::landing_page();
        assert!(bank.get(0).is_none());
        assert!(bank.get(8).is_none());
        assert_eq!(bank.get(3).unwrap().id, 3);
        assert!(!bank.contains(0));
        assert!(bank.contains(7));
    }

    #[test]
    fn test_from_specs_rejects_gaps() {
        let specs = vec![
            QuestionSpec::new(1, "Name?", "", CONTENT),
            QuestionSpec::new(3, "Tagline?", "", CONTENT),
        ];
        assert!(QuestionBank::from_specs(specs).is_err());
        assert!(QuestionBank::from_specs(Vec::new()).is_err());
    }

    #[test]
    fn test_from_config_prefers_custom_questions() {
        let config = WizardConfig {
            questions: vec![QuestionSpec::new(1, "Name?", "", CONTENT)],
        };
        assert_eq!(QuestionBank::from_config(&config).unwrap().count(), 1);
        assert_eq!(
            QuestionBank::from_config(&WizardConfig::default()).unwrap(),
            QuestionBank::landing_page()
        );
    }
}

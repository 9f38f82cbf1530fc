//! Generation request builder
//!
//! Renders a completed briefing into the request sent to the generation
//! service. The output depends only on the question bank and the answers,
//! so identical briefings always produce byte-identical requests.

use pagewright_core::{PagewrightError, PlaceholderToken, Result};
use sha2::{Digest, Sha256};

use crate::briefing::Briefing;
use crate::question_bank::QuestionBank;

/// Build the generation request for a completed briefing
///
/// The request asks for:
/// - One self-contained HTML document
/// - A responsive layout
/// - Both placeholder tokens at fixed locations (logo in the header,
///   hero image in the first section)
///
/// Fails with `IncompleteBriefing` if any required answer is blank.
pub fn synthesize(bank: &QuestionBank, briefing: &Briefing) -> Result<String> {
    let missing = briefing.missing_required(bank);
    if !missing.is_empty() {
        return Err(PagewrightError::IncompleteBriefing { missing });
    }

    let mut prompt = String::new();

    // Header
    prompt.push_str("# MASTER INSTRUCTION\n\n");
    prompt.push_str(
        "You are an expert web designer and front-end developer. Build a complete, \
         polished landing page for the small business described in the briefing below.\n\n",
    );

    // Briefing, grouped by category in question order
    prompt.push_str("## BRIEFING\n");
    let mut current_category: Option<&str> = None;
    for question in bank.iter() {
        let category = question.category_label.as_str();
        if current_category != Some(category) {
            if category.is_empty() {
                prompt.push('\n');
            } else {
                prompt.push_str(&format!("\n### {}\n\n", category));
            }
            current_category = Some(category);
        }

        let answer = briefing.answer(question.id).trim();
        let answer = if answer.is_empty() {
            "(not provided)"
        } else {
            answer
        };
        prompt.push_str(&format!("- **{}** {}\n", question.prompt, answer));
    }
    prompt.push('\n');

    // Document requirements
    prompt.push_str("## REQUIREMENTS\n\n");
    prompt.push_str(
        "1. Produce ONE self-contained HTML5 document. Put all CSS in a single <style> \
         element inside <head> and any JavaScript inline. Do not reference external \
         stylesheets, scripts, fonts or images.\n",
    );
    prompt.push_str(
        "2. The layout MUST be responsive: include \
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"> and use \
         fluid widths and media queries so the page adapts from phones to wide desktops.\n",
    );
    prompt.push_str(
        "3. Write all copy from the briefing. Do not invent prices, addresses or contact \
         details that were not provided.\n",
    );
    prompt.push_str("4. Set the <title> element to the business name.\n\n");

    // Placeholder tokens
    let logo = PlaceholderToken::LOGO;
    let hero = PlaceholderToken::HERO_IMAGE;
    prompt.push_str("## IMAGE PLACEHOLDERS\n\n");
    prompt.push_str(
        "Use each token below exactly once, verbatim, as the src attribute of an <img> \
         element:\n\n",
    );
    prompt.push_str(&format!(
        "- `{}`: the logo, inside the header/brand area at the very top of the page.\n",
        logo
    ));
    prompt.push_str(&format!(
        "- `{}`: the main visual of the hero section directly below the header.\n\n",
        hero
    ));
    prompt.push_str(&format!(
        "Example: <img src=\"{}\" alt=\"Logo\">. Do not use the tokens anywhere else and do \
         not add other <img> elements.\n\n",
        logo
    ));

    // Output format
    prompt.push_str("## OUTPUT FORMAT\n\n");
    prompt.push_str(
        "Respond with the HTML document only. Start with <!DOCTYPE html> and end with \
         </html>. No explanations and no Markdown code fences.\n",
    );

    Ok(prompt)
}

/// SHA-256 hex digest of a request, used as a cache/log key
pub fn request_fingerprint(request: &str) -> String {
    hex::encode(Sha256::digest(request.as_bytes()))
}

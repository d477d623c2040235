//! Prompts sent to the text model and parsing of its JSON answers.
//!
//! Answers are parsed leniently: Markdown code fences are ignored and the
//! outermost `{...}` is extracted before deserializing, since models often
//! wrap JSON in prose.

use std::fmt::Write;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use strata_core::entities::{Item, SynthesisDraft};
use strata_core::enums::SynthesisType;
use strata_core::scoring::clamp_model_score;
use strata_core::text::{excerpt, truncate_chars};

use crate::error::SynthesisError;

/// Characters of each item shown in a scoring prompt.
pub const SCORING_EXCERPT_CHARS: usize = 600;

/// Model-assigned scores for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateScore {
    pub originality: u8,
    pub relevance: u8,
    pub reasoning: String,
}

#[must_use]
pub fn scoring_prompt(
    core_thesis: &str,
    source: &Item,
    related: &Item,
    synthesis_type: SynthesisType,
    similarity: f64,
) -> String {
    let mut prompt = String::with_capacity(2048);
    let _ = writeln!(prompt, "Core thesis: {}", core_thesis.trim());
    prompt.push('\n');
    let _ = writeln!(
        prompt,
        "Today's item ({}): {}\n{}",
        source.newsletter_date,
        source.title,
        excerpt(&source.content, SCORING_EXCERPT_CHARS)
    );
    prompt.push('\n');
    let _ = writeln!(
        prompt,
        "Earlier item ({}): {}\n{}",
        related.newsletter_date,
        related.title,
        excerpt(&related.content, SCORING_EXCERPT_CHARS)
    );
    prompt.push('\n');
    let _ = writeln!(
        prompt,
        "Proposed connection: {} ({}); embedding similarity {similarity:.3}.",
        synthesis_type,
        synthesis_type.describe()
    );
    prompt.push_str(
        "\nRate the connection from 0 to 10 on two axes:\n\
         - originality: how non-obvious the connection is to a well-read reader\n\
         - relevance: how strongly it speaks to the core thesis\n\n\
         Respond with only a JSON object: \
         {\"originality\": <0-10>, \"relevance\": <0-10>, \"reasoning\": \"<one sentence>\"}\n",
    );
    prompt
}

#[must_use]
pub fn development_prompt(
    instructions: &str,
    core_thesis: &str,
    source: &Item,
    related: &Item,
    synthesis_type: SynthesisType,
    content_char_limit: usize,
) -> String {
    let mut prompt = String::with_capacity(content_char_limit * 2 + 1024);
    let _ = writeln!(prompt, "{}", instructions.trim());
    prompt.push('\n');
    let _ = writeln!(prompt, "Core thesis: {}", core_thesis.trim());
    let _ = writeln!(
        prompt,
        "Connection type: {synthesis_type} ({})",
        synthesis_type.describe()
    );
    prompt.push('\n');
    let _ = writeln!(
        prompt,
        "## Today's item ({}, {})\n{}\n\n{}",
        source.newsletter_date,
        source.source_identifier,
        source.title,
        truncate_chars(source.content.trim(), content_char_limit)
    );
    prompt.push('\n');
    let _ = writeln!(
        prompt,
        "## Earlier item ({}, {})\n{}\n\n{}",
        related.newsletter_date,
        related.source_identifier,
        related.title,
        truncate_chars(related.content.trim(), content_char_limit)
    );
    prompt.push_str(
        "\nRespond with only a JSON object with these string fields: \
         {\"headline\": \"...\", \"content\": \"...\", \
         \"historical_reference\": \"...\", \"core_thesis_alignment\": \"...\"}\n",
    );
    prompt
}

/// Slice of `raw` from the first `{` to the last `}`, ignoring code fences.
#[must_use]
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end > start).then(|| &raw[start..=end])
}

#[derive(Debug, Deserialize)]
struct RawScore {
    originality: f64,
    relevance: f64,
    #[serde(default)]
    reasoning: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawDraft {
    headline: String,
    content: String,
    historical_reference: String,
    core_thesis_alignment: String,
}

fn parse_object<T: DeserializeOwned>(raw: &str) -> Result<T, SynthesisError> {
    let json = extract_json_object(raw)
        .ok_or_else(|| SynthesisError::MalformedResponse("no JSON object in response".into()))?;
    serde_json::from_str(json).map_err(|e| SynthesisError::MalformedResponse(e.to_string()))
}

/// Parse a scoring answer; scores are clamped to `0..=10`.
///
/// # Errors
///
/// Returns [`SynthesisError::MalformedResponse`] if no JSON object with both
/// scores can be found.
pub fn parse_candidate_score(raw: &str) -> Result<CandidateScore, SynthesisError> {
    let parsed: RawScore = parse_object(raw)?;
    Ok(CandidateScore {
        originality: clamp_model_score(parsed.originality),
        relevance: clamp_model_score(parsed.relevance),
        reasoning: parsed.reasoning.trim().to_string(),
    })
}

/// Parse a development answer.
///
/// # Errors
///
/// Returns [`SynthesisError::MalformedResponse`] if the object is missing or
/// any of the four fields is blank.
pub fn parse_synthesis_draft(raw: &str) -> Result<SynthesisDraft, SynthesisError> {
    let parsed: RawDraft = parse_object(raw)?;
    let draft = SynthesisDraft {
        headline: parsed.headline.trim().to_string(),
        content: parsed.content.trim().to_string(),
        historical_reference: parsed.historical_reference.trim().to_string(),
        core_thesis_alignment: parsed.core_thesis_alignment.trim().to_string(),
    };
    let blank = draft.blank_fields();
    if !blank.is_empty() {
        return Err(SynthesisError::MalformedResponse(format!(
            "missing fields: {}",
            blank.join(", ")
        )));
    }
    Ok(draft)
}

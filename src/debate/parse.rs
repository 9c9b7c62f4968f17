//! Parsing of generated candidate arguments.
//!
//! Models are asked for a JSON array but often wrap it in prose or answer with
//! a numbered list instead. Parsing tries the array first, then the lines, and
//! settles on built-in sentences when neither yields three usable options.

use crate::content::ContentResult;

/// Exactly three candidate arguments offered to the user
pub type CandidateArguments = [String; 3];

/// Pro-topic sentences used when generation fails or cannot be parsed
pub const DEFAULT_CANDIDATE_ARGUMENTS: [&str; 3] = [
    "AI helps people do creative work faster so we can focus on what matters.",
    "AI can save lives by improving medical diagnosis and treatment.",
    "Used responsibly, AI makes it easier to solve problems and care for others.",
];

pub fn default_candidate_arguments() -> CandidateArguments {
    DEFAULT_CANDIDATE_ARGUMENTS.map(str::to_string)
}

/// Parse a raw completion into three candidate arguments, never failing
pub fn parse_candidate_arguments(raw: &str) -> CandidateArguments {
    if let Some(arguments) = parse_json_array(raw) {
        return arguments;
    }

    if let Some(arguments) = parse_lines(raw) {
        tracing::debug!("Candidate arguments parsed from plain lines");
        return arguments;
    }

    tracing::warn!("Could not parse candidate arguments, using defaults");
    default_candidate_arguments()
}

/// Parse a successful reply, or fall back to the built-in set when the lookup failed
pub fn candidate_arguments_or_default(result: ContentResult<String>) -> CandidateArguments {
    match result {
        Ok(raw) => parse_candidate_arguments(&raw),
        Err(e) => {
            tracing::warn!("Candidate arguments unavailable, using defaults: {}", e);
            default_candidate_arguments()
        }
    }
}

/// Take the substring between the first `[` and the last `]` as a JSON array
fn parse_json_array(raw: &str) -> Option<CandidateArguments> {
    let first = raw.find('[')?;
    let last = raw.rfind(']')?;
    if last <= first {
        return None;
    }

    let value: serde_json::Value = serde_json::from_str(&raw[first..=last]).ok()?;
    let entries: Vec<String> = value
        .as_array()?
        .iter()
        .filter_map(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(3)
        .map(str::to_string)
        .collect();

    entries.try_into().ok()
}

fn parse_lines(raw: &str) -> Option<CandidateArguments> {
    let cleaned: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(clean_line)
        .filter(|l| !l.is_empty())
        .take(3)
        .collect();

    cleaned.try_into().ok()
}

/// Strip an enumeration prefix like `1.`, `2)` or `-` and one pair of quotes
fn clean_line(line: &str) -> String {
    let without_marker = line
        .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | ')' | '-'))
        .trim_start();

    let is_quote = |c: char| c == '"' || c == '\'';
    let mut text = without_marker;
    if text.starts_with(is_quote) {
        text = &text[1..];
    }
    if text.ends_with(is_quote) {
        text = &text[..text.len() - 1];
    }

    text.trim().to_string()
}

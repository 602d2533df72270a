//! Free-text parsing of model output.

use lexrag_core::Domain;

/// One query per non-blank line, trimmed, duplicates kept.
pub fn split_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// First whitespace-delimited token of the trimmed, upper-cased text, with
/// surrounding punctuation stripped.
pub fn first_token(text: &str) -> Option<String> {
    let upper = text.trim().to_uppercase();
    let token = upper
        .split_whitespace()
        .next()?
        .trim_matches(|c: char| !c.is_alphanumeric());

    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

/// Domain named by a classifier reply, if any.
pub fn parse_domain(text: &str) -> Option<Domain> {
    first_token(text).and_then(|token| Domain::from_label(&token))
}

/// Judge rating: the first number in the reply, accepted only if 0, 2 or 4.
pub fn parse_rating(text: &str) -> Option<u8> {
    let number = text
        .split(|c: char| !c.is_ascii_digit())
        .find(|part| !part.is_empty())?;

    match number.parse::<u8>().ok()? {
        rating @ (0 | 2 | 4) => Some(rating),
        _ => None,
    }
}

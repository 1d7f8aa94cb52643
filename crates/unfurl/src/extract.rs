//! URL extraction from message body text.
//!
//! Pulls candidate absolute URLs out of plain text with a permissive
//! scheme+host+path matcher that stops at whitespace and angle
//! brackets and refuses to end on trailing punctuation.

use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Regex for matching URL tokens in free text.
///
/// The final character class keeps trailing `.`, `,`, `:`, `;`,
/// quotes and `]` out of the match so that a URL at the end of a
/// sentence is captured without the punctuation.
fn url_token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"https?://[^\s<]+[^<.,:;"'\]\s]"#).expect("URL token regex is valid")
    })
}

/// Extract all well-formed absolute URLs from a message body.
///
/// Tokens that match the pattern but fail strict URL parsing are
/// silently dropped. Order of appearance is preserved; duplicates are
/// kept (deduplication happens later, at the resolved-reference
/// level).
pub fn extract_urls(body: &str) -> Vec<Url> {
    url_token_regex()
        .find_iter(body)
        .filter_map(|m| Url::parse(m.as_str()).ok())
        .collect()
}

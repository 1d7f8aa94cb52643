//! Description sanitizing: provider HTML fragments to chat markdown.
//!
//! Walks the parsed HTML tree depth-first, resolving children before
//! applying each element's own transformation:
//! - text nodes are markdown-escaped, except bare URLs which pass
//!   through verbatim so they stay clickable
//! - `<br>` becomes a newline
//! - `<a>` becomes `[text](href)`, unwrapping redirect-style hrefs
//! - `<strong>` becomes `**text**`
//! - every other element is unwrapped to its text content
//!
//! The result is truncated to [`DESCRIPTION_LIMIT`] characters with an
//! ellipsis, never splitting a markdown token.

use ego_tree::NodeRef;
use percent_encoding::percent_decode_str;
use regex::Regex;
use scraper::{Html, Node};
use std::sync::OnceLock;

use crate::DESCRIPTION_LIMIT;

/// Truncation marker
const ELLIPSIS: char = '…';

/// Provider-internal redirect prefix on outbound anchor hrefs
const JUMP_PREFIX: &str = "/jump.php?";

/// Characters that trigger markdown formatting on the destination
/// platform. Backslash itself is not escaped so that re-sanitizing
/// already-escaped output is a no-op.
const MARKDOWN_SPECIALS: &[char] = &['`', '*', '_', '~', '|'];

/// A text node that is exactly one bare URL is left untouched.
fn bare_url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^https?://[^\s<]+[^<.,:;"'\]\s]$"#).expect("bare URL regex is valid")
    })
}

/// Escape markdown-special characters, skipping ones that already
/// carry a backslash.
fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev = '\0';
    for c in text.chars() {
        if MARKDOWN_SPECIALS.contains(&c) && prev != '\\' {
            out.push('\\');
        }
        out.push(c);
        prev = c;
    }
    out
}

/// Resolve an anchor href, decoding redirect-wrapped targets.
fn resolve_href(href: &str) -> String {
    match href.strip_prefix(JUMP_PREFIX) {
        Some(encoded) => percent_decode_str(encoded).decode_utf8_lossy().into_owned(),
        None => href.to_string(),
    }
}

fn render_children(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        render_node(child, out);
    }
}

/// Depth-first node renderer. Children are resolved before the
/// element's own transformation is applied.
fn render_node(node: NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => {
            // The parser already decoded entities in text nodes.
            let raw: &str = text;
            if bare_url_regex().is_match(raw) {
                out.push_str(raw);
            } else {
                out.push_str(&escape_markdown(raw));
            }
        }
        Node::Element(element) => match element.name() {
            "br" => out.push('\n'),
            "a" => {
                let mut inner = String::new();
                render_children(node, &mut inner);
                let href = element.attr("href").map(resolve_href).unwrap_or_default();
                out.push('[');
                out.push_str(&inner);
                out.push_str("](");
                out.push_str(&href);
                out.push(')');
            }
            "strong" => {
                let mut inner = String::new();
                render_children(node, &mut inner);
                out.push_str("**");
                out.push_str(&inner);
                out.push_str("**");
            }
            _ => render_children(node, out),
        },
        // Comments, doctypes and processing instructions contribute nothing.
        _ => render_children(node, out),
    }
}

/// True if the markdown link opened by the leading `[` in `tail` is
/// fully closed within `tail`.
fn link_complete(tail: &str) -> bool {
    match tail.find("](") {
        Some(i) => tail[i..].contains(')'),
        None => false,
    }
}

/// Truncate markdown to `limit` characters including the ellipsis,
/// backing off rather than splitting a link or bold token.
fn truncate_markdown(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }

    let mut cut: String = text.chars().take(limit - 1).collect();

    if let Some(open) = cut.rfind('[') {
        if !link_complete(&cut[open..]) {
            cut.truncate(open);
        }
    }

    if cut.matches("**").count() % 2 == 1 {
        if let Some(pos) = cut.rfind("**") {
            cut.truncate(pos);
        }
    }

    let mut out = cut.trim_end().to_string();
    out.push(ELLIPSIS);
    out
}

/// Convert a provider-supplied HTML description fragment into
/// length-bounded markdown for the destination platform.
pub fn sanitize_description(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    render_children(fragment.tree.root(), &mut out);
    truncate_markdown(&out, DESCRIPTION_LIMIT)
}

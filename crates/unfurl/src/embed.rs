//! Embed records produced by the pipeline.
//!
//! The shape follows the destination platform's embed object: only the
//! first record of a multi-page work carries title, link, description,
//! timestamp, stats and author; every record carries color, image and
//! a position footer.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single preview embed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Embed {
    /// Accent color
    pub color: u32,

    /// Work title (first record only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Canonical link to the work (first record only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Sanitized description markdown (first record only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Creation timestamp of the work (first record only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// Embedded image
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,

    /// Stat fields and quality notices
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,

    /// Page position indicator, e.g. `"3/5"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,

    /// Author block (first record only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<EmbedAuthor>,
}

/// Image attachment of an embed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

/// A titled key/value field on an embed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Embed footer text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// Embed author block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedAuthor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

/// Format a count with thousands grouping, e.g. `1234567` -> `"1,234,567"`
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
        assert_eq!(format_count(12345678), "12,345,678");
    }

    #[test]
    fn test_embed_serialization_skips_empty() {
        let embed = Embed {
            color: 0x0096FA,
            footer: Some(EmbedFooter {
                text: "1/1".to_string(),
            }),
            ..Default::default()
        };
        let json = serde_json::to_value(&embed).unwrap();
        assert_eq!(json["color"], 0x0096FA);
        assert_eq!(json["footer"]["text"], "1/1");
        assert!(json.get("title").is_none());
        assert!(json.get("fields").is_none());
    }
}

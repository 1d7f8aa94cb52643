//! Unfurl - rich embed previews for illustration links in chat messages
//!
//! This crate implements the link-to-embed pipeline: it recognizes
//! supported URLs inside a message, resolves remote metadata, and turns
//! each link into one or more preview embeds ready for delivery.
//!
//! ## Provider System
//!
//! Unfurl uses a pluggable provider system where each provider parses
//! the URL shapes it understands into a typed reference and resolves
//! that reference into embeds. The [`ProviderRegistry`] matches every
//! URL against every registered provider, deduplicates equivalent
//! references, and resolves the survivors in parallel with per-item
//! failure isolation.
//!
//! Built-in providers:
//! - [`PixivProvider`] - pixiv artwork pages, including multi-page
//!   works with a page-range fragment (e.g. `#2-5,8`)
//!
//! ## Pipeline
//!
//! ```text
//! message text -> extract_urls -> ProviderRegistry::generate_embeds
//!              -> chunk_batches -> ReplyPlan
//! ```
//!
//! The chat-platform connection itself is out of scope: callers feed
//! message text in and deliver the resulting [`ReplyPlan`] themselves.

pub mod batch;
pub mod client;
mod embed;
mod error;
mod extract;
pub mod providers;
mod range;
mod sanitize;
mod service;

pub use batch::chunk_batches;
pub use embed::{Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedImage};
pub use error::UnfurlError;
pub use extract::extract_urls;
pub use providers::{IllustRef, ParsedUrl, PixivProvider, Provider, ProviderRegistry};
pub use range::{parse_ranges, PageRange, PAGE_MAX};
pub use sanitize::sanitize_description;
pub use service::{ReplyPlan, UnfurlService};

/// Maximum number of embeds the destination platform accepts per message
pub const EMBEDS_PER_MESSAGE: usize = 10;

/// Maximum rendered description length, including the ellipsis
pub const DESCRIPTION_LIMIT: usize = 350;

/// Byte-size ceiling for an embedded image variant (10 MiB)
pub const IMAGE_SIZE_CEILING: u64 = 10 * 1024 * 1024;

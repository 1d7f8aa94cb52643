//! Provider system for link resolution
//!
//! Design: each provider parses the URL shapes it understands into a
//! typed reference and resolves that reference into an ordered embed
//! list. The registry matches every URL against every provider (a URL
//! may match more than one), deduplicates equivalent references, and
//! resolves the survivors in parallel with per-item failure isolation.

mod pixiv;

pub use pixiv::{IllustRef, PixivProvider};

use crate::embed::Embed;
use crate::error::UnfurlError;
use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, warn};
use url::Url;

/// A provider-specific reference extracted from a raw URL.
///
/// Equality for deduplication is the reference's own domain equality,
/// combined with the variant discriminant by the registry: two
/// references are duplicates only when the same provider produced
/// equal targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedUrl {
    /// A pixiv illustration: numeric id plus requested page ranges
    PixivIllust(IllustRef),
}

impl ParsedUrl {
    /// Domain equality used for deduplication.
    ///
    /// For illustrations this compares ids only - two mentions of the
    /// same work with different page ranges resolve once.
    pub fn same_target(&self, other: &ParsedUrl) -> bool {
        match (self, other) {
            (ParsedUrl::PixivIllust(a), ParsedUrl::PixivIllust(b)) => a.same_illust(b),
        }
    }
}

/// Trait for link-to-embed providers
///
/// Implement this trait to unfurl a new class of URLs. `parse`
/// declares which URLs the provider understands; `resolve` is called
/// only with references this provider produced.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Unique identifier for this provider (for logging/debugging)
    fn name(&self) -> &'static str;

    /// Parse a URL into a typed reference, or `None` if the URL is
    /// not one of this provider's shapes. A mismatch is not an error.
    fn parse(&self, url: &Url) -> Option<ParsedUrl>;

    /// Resolve a reference into an ordered embed list.
    async fn resolve(&self, target: &ParsedUrl) -> Result<Vec<Embed>, UnfurlError>;
}

/// Registry of providers that matches, deduplicates and resolves
///
/// Maintains an ordered list of providers. URLs are matched against
/// every provider in registration order; all matches become candidate
/// (provider, reference) pairs.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn Provider>>,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProviderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with the built-in providers registered
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PixivProvider::new()));
        registry
    }

    /// Register a provider
    pub fn register(&mut self, provider: Box<dyn Provider>) {
        self.providers.push(provider);
    }

    /// Match, deduplicate and resolve a set of discovered URLs.
    ///
    /// Returns one embed group per surviving reference, in discovery
    /// order. A failed resolution is logged and dropped; it never
    /// aborts sibling resolutions.
    pub async fn generate_embeds(&self, urls: &[Url]) -> Vec<Vec<Embed>> {
        let mut pairs: Vec<(usize, ParsedUrl)> = Vec::new();
        for url in urls {
            for (index, provider) in self.providers.iter().enumerate() {
                if let Some(parsed) = provider.parse(url) {
                    debug!(provider = provider.name(), url = %url, "matched URL");
                    pairs.push((index, parsed));
                }
            }
        }

        // Keep only the first occurrence of each (provider, target).
        let mut unique: Vec<(usize, ParsedUrl)> = Vec::new();
        for (index, parsed) in pairs {
            let duplicate = unique
                .iter()
                .any(|(seen, other)| *seen == index && other.same_target(&parsed));
            if !duplicate {
                unique.push((index, parsed));
            }
        }

        let resolutions = unique.iter().map(|(index, parsed)| {
            let provider = &self.providers[*index];
            async move {
                match provider.resolve(parsed).await {
                    Ok(embeds) => Some(embeds),
                    Err(err) => {
                        warn!(provider = provider.name(), error = %err, "resolution failed");
                        None
                    }
                }
            }
        });

        join_all(resolutions)
            .await
            .into_iter()
            .flatten()
            .filter(|group| !group.is_empty())
            .collect()
    }
}

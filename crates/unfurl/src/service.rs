//! Message-level orchestration.
//!
//! Ties the pipeline together: extract URLs from a message body, run
//! them through the provider registry, and batch the resulting embed
//! groups into a reply plan the caller can deliver.

use crate::batch::chunk_batches;
use crate::embed::Embed;
use crate::extract::extract_urls;
use crate::providers::ProviderRegistry;
use crate::EMBEDS_PER_MESSAGE;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the caller should do with the original message and its replies.
///
/// When `batches` is empty nothing is sent and the platform's own link
/// preview is left intact; `suppress_source_preview` is only set
/// together with at least one batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyPlan {
    /// Ask the platform to drop its auto-generated preview on the
    /// original message
    pub suppress_source_preview: bool,
    /// Reply payloads, each at most [`EMBEDS_PER_MESSAGE`] embeds,
    /// sent sequentially in order
    pub batches: Vec<Vec<Embed>>,
}

/// The link-to-embed pipeline behind a single entry point
pub struct UnfurlService {
    registry: ProviderRegistry,
}

impl Default for UnfurlService {
    fn default() -> Self {
        Self::new()
    }
}

impl UnfurlService {
    /// Create a service with the built-in providers
    pub fn new() -> Self {
        Self {
            registry: ProviderRegistry::with_defaults(),
        }
    }

    /// Create a service around a custom registry
    pub fn with_registry(registry: ProviderRegistry) -> Self {
        Self { registry }
    }

    /// Unfurl every supported link in a message body into a reply plan.
    pub async fn unfurl_message(&self, body: &str) -> ReplyPlan {
        let urls = extract_urls(body);
        if urls.is_empty() {
            return ReplyPlan::default();
        }
        debug!(count = urls.len(), "extracted candidate URLs");

        let groups = self.registry.generate_embeds(&urls).await;
        if groups.is_empty() {
            return ReplyPlan::default();
        }

        ReplyPlan {
            suppress_source_preview: true,
            batches: chunk_batches(groups, EMBEDS_PER_MESSAGE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_urls_no_reply() {
        let service = UnfurlService::new();
        let plan = service.unfurl_message("just chatting").await;
        assert!(!plan.suppress_source_preview);
        assert!(plan.batches.is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_urls_no_reply() {
        let service = UnfurlService::new();
        let plan = service.unfurl_message("look https://example.com/cat.png").await;
        assert!(!plan.suppress_source_preview);
        assert!(plan.batches.is_empty());
    }
}

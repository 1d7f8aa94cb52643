//! Pixiv illustration provider
//!
//! Handles pixiv artwork URLs, resolving them into one embed per
//! selected page. The first embed of a work carries the full metadata
//! (title, link, description, stats, author); subsequent embeds carry
//! only the page image and a position footer.

use crate::client::get_with_retry;
use crate::embed::{format_count, Embed, EmbedAuthor, EmbedField, EmbedFooter, EmbedImage};
use crate::error::UnfurlError;
use crate::providers::{ParsedUrl, Provider};
use crate::range::{parse_ranges, ranges_contain, ranges_span, PageRange};
use crate::sanitize::sanitize_description;
use crate::IMAGE_SIZE_CEILING;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use reqwest::header::{CONTENT_LENGTH, REFERER};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Timeout for metadata requests and image probes
const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Metadata endpoint; `{base}/{id}` and `{base}/{id}/pages`
const AJAX_ENDPOINT: &str = "https://www.pixiv.net/ajax/illust";

/// Canonical artwork page, linked from the first embed
const ARTWORK_ENDPOINT: &str = "https://www.pixiv.net/artworks/";

/// Author profile page, linked from the author block
const USER_ENDPOINT: &str = "https://www.pixiv.net/users/";

/// Image proxy; pixiv image hosts reject hot-linked requests
const PROXY_ENDPOINT: &str = "https://pixifull.xcvr48.workers.dev/";

/// Referer required by the image hosts for size probes
const IMAGE_REFERER: &str = "http://www.pixiv.net/";

/// Pixiv brand color used as the embed accent
const PIXIV_COLOR: u32 = 0x0096FA;

/// A parsed pixiv artwork reference: id plus requested page ranges
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IllustRef {
    pub id: u64,
    pub ranges: Vec<PageRange>,
}

impl IllustRef {
    /// Create a reference; an empty range set defaults to `[1,1]`
    pub fn new(id: u64, ranges: Vec<PageRange>) -> Self {
        let ranges = if ranges.is_empty() {
            vec![PageRange::new(1, 1)]
        } else {
            ranges
        };
        Self { id, ranges }
    }

    /// Dedup equality: same work, page ranges ignored
    pub fn same_illust(&self, other: &IllustRef) -> bool {
        self.id == other.id
    }
}

/// Pixiv illustration provider
///
/// Matches `https://www.pixiv.net/artworks/<id>` (optionally behind
/// `/en/`) and the legacy `member_illust.php?illust_id=<id>` form. An
/// optional URL fragment supplies the page-range specifier.
pub struct PixivProvider {
    ajax_base: String,
    proxy_base: String,
}

impl PixivProvider {
    /// Create a provider against the live pixiv endpoints
    pub fn new() -> Self {
        Self::with_endpoints(AJAX_ENDPOINT, PROXY_ENDPOINT)
    }

    /// Create a provider with custom metadata and proxy endpoints
    pub fn with_endpoints(ajax_base: impl Into<String>, proxy_base: impl Into<String>) -> Self {
        Self {
            ajax_base: ajax_base.into(),
            proxy_base: proxy_base.into(),
        }
    }

    /// Rewrite an image URL to route through the proxy host, keeping
    /// the original path.
    fn proxied_url(&self, raw: &str) -> String {
        let path = match Url::parse(raw) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => return raw.to_string(),
        };
        match Url::parse(&self.proxy_base).and_then(|base| base.join(&path)) {
            Ok(joined) => joined.to_string(),
            Err(_) => raw.to_string(),
        }
    }

    async fn resolve_illust(&self, illust: &IllustRef) -> Result<Vec<Embed>, UnfurlError> {
        let client = reqwest::Client::builder()
            .connect_timeout(API_TIMEOUT)
            .timeout(API_TIMEOUT)
            .build()
            .map_err(UnfurlError::ClientBuildError)?;

        let illust_url = format!("{}/{}", self.ajax_base, illust.id);
        let response = get_with_retry(&client, &illust_url).await?;
        if !response.status().is_success() {
            return Err(UnfurlError::from_status(
                response.status().as_u16(),
                illust_url,
            ));
        }

        let body = response
            .json::<AjaxResponse<IllustBody>>()
            .await
            .map_err(|e| UnfurlError::MalformedResponse(format!("illust {}: {}", illust.id, e)))?
            .body;

        if body.x_restrict != 0 {
            return Err(UnfurlError::RestrictedContent { id: illust.id });
        }

        // Any related work exposing an avatar will do.
        let avatar = body
            .user_illusts
            .values()
            .filter_map(|entry| entry.as_ref())
            .find_map(|entry| entry.profile_image_url.as_deref())
            .map(|url| self.proxied_url(url));

        let pages = self.select_pages(&client, illust, &illust_url, &body).await?;

        let embed_futures = pages
            .iter()
            .map(|page| self.page_embed(&client, page, body.page_count, &body.urls));
        let mut embeds = futures::future::try_join_all(embed_futures).await?;

        if let Some(first) = embeds.first_mut() {
            first.title = Some(body.title.clone());
            first.url = Some(format!("{}{}", ARTWORK_ENDPOINT, illust.id));
            first.description = Some(sanitize_description(&body.description));
            first.timestamp = Some(body.create_date);
            first.author = Some(EmbedAuthor {
                name: body.user_name.clone(),
                url: Some(format!("{}{}", USER_ENDPOINT, body.user_id)),
                icon_url: avatar,
            });

            // Stat fields go ahead of any quality notice already present.
            let mut fields = vec![
                stat_field("Views", body.view_count),
                stat_field("Bookmarks", body.bookmark_count),
                stat_field("Likes", body.like_count),
            ];
            fields.append(&mut first.fields);
            first.fields = fields;
        }

        Ok(embeds)
    }

    /// Decide which pages to embed, fetching the per-page listing only
    /// when the primary metadata cannot cover the request by itself.
    async fn select_pages(
        &self,
        client: &reqwest::Client,
        illust: &IllustRef,
        illust_url: &str,
        body: &IllustBody,
    ) -> Result<Vec<PageRecord>, UnfurlError> {
        let primary = PageRecord {
            urls: body.urls.to_page_urls(),
            position: 1,
        };

        // One-page work, or the request covers exactly page 1: the
        // primary metadata already holds the image set.
        if body.page_count == 1
            || (ranges_contain(&illust.ranges, 1) && ranges_span(&illust.ranges) == 1)
        {
            return Ok(vec![primary]);
        }

        let pages_url = format!("{illust_url}/pages");
        let response = get_with_retry(client, &pages_url).await?;
        if !response.status().is_success() {
            return Err(UnfurlError::from_status(
                response.status().as_u16(),
                pages_url,
            ));
        }

        let all_pages = response
            .json::<AjaxResponse<Vec<IllustPage>>>()
            .await
            .map_err(|e| UnfurlError::MalformedResponse(format!("pages {}: {}", illust.id, e)))?
            .body;

        let selected = pages_in_ranges(&illust.ranges, all_pages);
        if selected.is_empty() {
            // Requested range lies entirely beyond the page count.
            Ok(vec![primary])
        } else {
            Ok(selected)
        }
    }

    /// Build the page-level embed: probed image, optional quality
    /// notice, position footer.
    async fn page_embed(
        &self,
        client: &reqwest::Client,
        page: &PageRecord,
        total_pages: u32,
        primary_urls: &IllustUrls,
    ) -> Result<Embed, UnfurlError> {
        let quality = select_quality(client, &page.urls).await?;

        let mut fields = Vec::new();
        if quality != ImageQuality::Original {
            fields.push(EmbedField {
                name: "Image Quality".to_string(),
                value: format!(
                    "Using {} due to size, [click here for original]({})",
                    quality.as_str(),
                    self.proxied_url(&primary_urls.original)
                ),
                inline: false,
            });
        }

        Ok(Embed {
            color: PIXIV_COLOR,
            image: Some(EmbedImage {
                url: self.proxied_url(page.urls.variant(quality)),
            }),
            fields,
            footer: Some(EmbedFooter {
                text: format!("{}/{}", page.position, total_pages),
            }),
            ..Default::default()
        })
    }
}

impl Default for PixivProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for PixivProvider {
    fn name(&self) -> &'static str {
        "pixiv_illust"
    }

    fn parse(&self, url: &Url) -> Option<ParsedUrl> {
        parse_illust_url(url).map(ParsedUrl::PixivIllust)
    }

    async fn resolve(&self, target: &ParsedUrl) -> Result<Vec<Embed>, UnfurlError> {
        let ParsedUrl::PixivIllust(illust) = target;
        self.resolve_illust(illust).await
    }
}

/// Parse a pixiv artwork URL into a reference
fn parse_illust_url(url: &Url) -> Option<IllustRef> {
    let host = url.host_str()?;
    if !host.eq_ignore_ascii_case("www.pixiv.net") && !host.eq_ignore_ascii_case("pixiv.net") {
        return None;
    }

    let id: u64 = if url.path() == "/member_illust.php" {
        let (_, value) = url.query_pairs().find(|(key, _)| key == "illust_id")?;
        parse_digits(&value)?
    } else {
        let segments: Vec<&str> = url.path_segments()?.collect();
        let segments = match segments.first() {
            Some(first) if first.eq_ignore_ascii_case("en") => &segments[1..],
            _ => &segments[..],
        };
        if segments.len() != 2 || !segments[0].eq_ignore_ascii_case("artworks") {
            return None;
        }
        parse_digits(segments[1])?
    };

    let ranges = parse_ranges(url.fragment().unwrap_or(""));
    Some(IllustRef::new(id, ranges))
}

/// Strict digits-only parse; rejects signs and empty input
fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn stat_field(name: &str, count: u64) -> EmbedField {
    EmbedField {
        name: name.to_string(),
        value: format_count(count),
        inline: true,
    }
}

/// Image variant tiers eligible for embedding, best first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImageQuality {
    Original,
    Regular,
    Small,
}

impl ImageQuality {
    fn as_str(self) -> &'static str {
        match self {
            ImageQuality::Original => "original",
            ImageQuality::Regular => "regular",
            ImageQuality::Small => "small",
        }
    }
}

/// Tiers probed in order; `small` is the unprobed fallback
const PROBE_ORDER: [ImageQuality; 2] = [ImageQuality::Original, ImageQuality::Regular];

/// Pick the best image tier whose declared size fits the ceiling.
///
/// A failed probe or a missing content length aborts the whole
/// resolution rather than degrading a tier.
async fn select_quality(
    client: &reqwest::Client,
    urls: &PageUrls,
) -> Result<ImageQuality, UnfurlError> {
    for quality in PROBE_ORDER {
        let url = urls.variant(quality);
        let response = client
            .head(url)
            .header(REFERER, IMAGE_REFERER)
            .send()
            .await
            .map_err(|e| UnfurlError::RequestError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(UnfurlError::SizeProbeFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status().as_u16()),
            });
        }

        let length: u64 = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| UnfurlError::SizeProbeFailed {
                url: url.to_string(),
                reason: "could not determine content length".to_string(),
            })?;

        if length <= IMAGE_SIZE_CEILING {
            return Ok(quality);
        }
    }

    Ok(ImageQuality::Small)
}

/// One selected page: its variant URLs plus its 1-based position
/// among all pages of the work
#[derive(Debug, Clone)]
struct PageRecord {
    urls: PageUrls,
    position: u32,
}

/// Select the pages whose positions fall inside the merged ranges.
/// Positions beyond the actual page count simply yield fewer pages.
fn pages_in_ranges(ranges: &[PageRange], pages: Vec<IllustPage>) -> Vec<PageRecord> {
    pages
        .into_iter()
        .enumerate()
        .filter_map(|(index, page)| {
            let position = (index + 1) as u32;
            ranges_contain(ranges, position).then_some(PageRecord {
                urls: page.urls,
                position,
            })
        })
        .collect()
}

/// Envelope wrapping every ajax payload
#[derive(Debug, Deserialize)]
struct AjaxResponse<T> {
    #[allow(dead_code)]
    error: bool,
    #[allow(dead_code)]
    message: String,
    body: T,
}

/// Primary illustration metadata (partial)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IllustBody {
    title: String,
    description: String,
    create_date: DateTime<FixedOffset>,
    x_restrict: u32,
    user_id: String,
    user_name: String,
    #[serde(default)]
    user_illusts: HashMap<String, Option<UserIllust>>,
    page_count: u32,
    view_count: u64,
    bookmark_count: u64,
    like_count: u64,
    urls: IllustUrls,
}

/// Related-work entry; only the avatar matters here
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserIllust {
    profile_image_url: Option<String>,
}

/// Image variants on the primary metadata, largest first
#[derive(Debug, Deserialize)]
struct IllustUrls {
    original: String,
    regular: String,
    small: String,
    thumb: String,
}

impl IllustUrls {
    /// The primary metadata doubles as page 1's variant set
    fn to_page_urls(&self) -> PageUrls {
        PageUrls {
            original: self.original.clone(),
            regular: self.regular.clone(),
            small: self.small.clone(),
            thumb_mini: self.thumb.clone(),
        }
    }
}

/// Image variants of one page, largest first
#[derive(Debug, Clone, Deserialize)]
struct PageUrls {
    original: String,
    regular: String,
    small: String,
    #[allow(dead_code)]
    thumb_mini: String,
}

impl PageUrls {
    fn variant(&self, quality: ImageQuality) -> &str {
        match quality {
            ImageQuality::Original => &self.original,
            ImageQuality::Regular => &self.regular,
            ImageQuality::Small => &self.small,
        }
    }
}

/// One entry of the per-page listing
#[derive(Debug, Deserialize)]
struct IllustPage {
    urls: PageUrls,
}

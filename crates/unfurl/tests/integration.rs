//! Integration tests for the link-to-embed pipeline using wiremock

use serde_json::json;
use unfurl::{PixivProvider, ProviderRegistry, UnfurlService};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PROXY: &str = "https://proxy.test/";

/// Service wired to a provider whose ajax endpoint points at the mock
/// server.
fn service_for(server: &MockServer) -> UnfurlService {
    let mut registry = ProviderRegistry::new();
    registry.register(Box::new(PixivProvider::with_endpoints(
        format!("{}/ajax/illust", server.uri()),
        PROXY,
    )));
    UnfurlService::with_registry(registry)
}

fn page_urls(base: &str, page: usize) -> serde_json::Value {
    json!({
        "original": format!("{base}/img/p{page}_original.png"),
        "regular": format!("{base}/img/p{page}_regular.jpg"),
        "small": format!("{base}/img/p{page}_small.jpg"),
        "thumb_mini": format!("{base}/img/p{page}_thumb.jpg"),
    })
}

fn illust_json(base: &str, page_count: u32, x_restrict: u32) -> serde_json::Value {
    json!({
        "error": false,
        "message": "",
        "body": {
            "title": "Test Work",
            "description": "first line<br>visit <strong>my page</strong>",
            "createDate": "2021-06-01T12:00:00+09:00",
            "xRestrict": x_restrict,
            "userId": "555",
            "userName": "artist",
            "userIllusts": {
                "90000": null,
                "90001": { "profileImageUrl": format!("{base}/avatar/artist.png") },
            },
            "pageCount": page_count,
            "viewCount": 1234567,
            "bookmarkCount": 890,
            "likeCount": 456,
            "urls": {
                "original": format!("{base}/img/p1_original.png"),
                "regular": format!("{base}/img/p1_regular.jpg"),
                "small": format!("{base}/img/p1_small.jpg"),
                "thumb": format!("{base}/img/p1_thumb.jpg"),
            },
        },
    })
}

fn pages_json(base: &str, page_count: usize) -> serde_json::Value {
    let pages: Vec<_> = (1..=page_count)
        .map(|p| json!({ "urls": page_urls(base, p), "width": 1200, "height": 900 }))
        .collect();
    json!({ "error": false, "message": "", "body": pages })
}

async fn mount_illust(server: &MockServer, id: u64, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/ajax/illust/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_pages(server: &MockServer, id: u64, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/ajax/illust/{id}/pages")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_probe(server: &MockServer, route: &str, length: u64) {
    Mock::given(method("HEAD"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).insert_header("content-length", length.to_string().as_str()),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_page_range_resolution() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_illust(&server, 123, illust_json(&base, 5, 0)).await;
    mount_pages(&server, 123, pages_json(&base, 5)).await;
    mount_probe(&server, "/img/p2_original.png", 1024).await;
    mount_probe(&server, "/img/p3_original.png", 1024).await;

    let service = service_for(&server);
    let plan = service
        .unfurl_message("see https://www.pixiv.net/artworks/123#2-3")
        .await;

    assert!(plan.suppress_source_preview);
    assert_eq!(plan.batches.len(), 1);
    let batch = &plan.batches[0];
    assert_eq!(batch.len(), 2);

    let first = &batch[0];
    assert_eq!(first.title.as_deref(), Some("Test Work"));
    assert_eq!(
        first.url.as_deref(),
        Some("https://www.pixiv.net/artworks/123")
    );
    assert_eq!(
        first.description.as_deref(),
        Some("first line\nvisit **my page**")
    );
    assert_eq!(
        first.image.as_ref().unwrap().url,
        "https://proxy.test/img/p2_original.png"
    );
    assert_eq!(first.footer.as_ref().unwrap().text, "2/5");
    let field_names: Vec<&str> = first.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(field_names, vec!["Views", "Bookmarks", "Likes"]);
    assert_eq!(first.fields[0].value, "1,234,567");
    let author = first.author.as_ref().unwrap();
    assert_eq!(author.name, "artist");
    assert_eq!(author.url.as_deref(), Some("https://www.pixiv.net/users/555"));
    assert_eq!(
        author.icon_url.as_deref(),
        Some("https://proxy.test/avatar/artist.png")
    );

    let second = &batch[1];
    assert!(second.title.is_none());
    assert!(second.author.is_none());
    assert!(second.fields.is_empty());
    assert_eq!(
        second.image.as_ref().unwrap().url,
        "https://proxy.test/img/p3_original.png"
    );
    assert_eq!(second.footer.as_ref().unwrap().text, "3/5");
}

#[tokio::test]
async fn test_restricted_content_produces_nothing() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_illust(&server, 321, illust_json(&base, 1, 1)).await;

    let service = service_for(&server);
    let plan = service
        .unfurl_message("https://www.pixiv.net/artworks/321")
        .await;

    assert!(!plan.suppress_source_preview);
    assert!(plan.batches.is_empty());
}

#[tokio::test]
async fn test_equivalent_urls_resolve_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/ajax/illust/77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(illust_json(&base, 1, 0)))
        .expect(1)
        .mount(&server)
        .await;
    mount_probe(&server, "/img/p1_original.png", 1024).await;

    let service = service_for(&server);
    let plan = service
        .unfurl_message(concat!(
            "https://www.pixiv.net/artworks/77 and again ",
            "https://www.pixiv.net/member_illust.php?illust_id=77",
        ))
        .await;

    assert_eq!(plan.batches.len(), 1);
    assert_eq!(plan.batches[0].len(), 1);
    assert_eq!(plan.batches[0][0].footer.as_ref().unwrap().text, "1/1");
}

#[tokio::test]
async fn test_failure_isolated_per_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/ajax/illust/1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_illust(&server, 2, illust_json(&base, 1, 0)).await;
    mount_probe(&server, "/img/p1_original.png", 1024).await;

    let service = service_for(&server);
    let plan = service
        .unfurl_message(concat!(
            "https://www.pixiv.net/artworks/1 ",
            "https://www.pixiv.net/artworks/2",
        ))
        .await;

    assert!(plan.suppress_source_preview);
    assert_eq!(plan.batches.len(), 1);
    assert_eq!(plan.batches[0].len(), 1);
    assert_eq!(plan.batches[0][0].title.as_deref(), Some("Test Work"));
}

#[tokio::test]
async fn test_single_page_request_skips_pages_fetch() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_illust(&server, 9, illust_json(&base, 5, 0)).await;
    Mock::given(method("GET"))
        .and(path("/ajax/illust/9/pages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(pages_json(&base, 5)))
        .expect(0)
        .mount(&server)
        .await;
    mount_probe(&server, "/img/p1_original.png", 1024).await;

    let service = service_for(&server);
    let plan = service
        .unfurl_message("https://www.pixiv.net/artworks/9#1")
        .await;

    assert_eq!(plan.batches.len(), 1);
    assert_eq!(plan.batches[0].len(), 1);
    assert_eq!(plan.batches[0][0].footer.as_ref().unwrap().text, "1/5");
}

#[tokio::test]
async fn test_range_beyond_page_count_falls_back_to_primary() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_illust(&server, 4, illust_json(&base, 2, 0)).await;
    mount_pages(&server, 4, pages_json(&base, 2)).await;
    mount_probe(&server, "/img/p1_original.png", 1024).await;

    let service = service_for(&server);
    let plan = service
        .unfurl_message("https://www.pixiv.net/artworks/4#9-")
        .await;

    assert_eq!(plan.batches.len(), 1);
    assert_eq!(plan.batches[0].len(), 1);
    assert_eq!(plan.batches[0][0].footer.as_ref().unwrap().text, "1/2");
}

#[tokio::test]
async fn test_oversized_original_adds_quality_notice() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_illust(&server, 8, illust_json(&base, 1, 0)).await;
    mount_probe(&server, "/img/p1_original.png", 20 * 1024 * 1024).await;
    mount_probe(&server, "/img/p1_regular.jpg", 1024).await;

    let service = service_for(&server);
    let plan = service
        .unfurl_message("https://www.pixiv.net/artworks/8")
        .await;

    let embed = &plan.batches[0][0];
    assert_eq!(
        embed.image.as_ref().unwrap().url,
        "https://proxy.test/img/p1_regular.jpg"
    );
    // Stat fields come first, then the quality notice.
    let field_names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        field_names,
        vec!["Views", "Bookmarks", "Likes", "Image Quality"]
    );
    let notice = &embed.fields[3].value;
    assert!(notice.contains("Using regular due to size"));
    assert!(notice.contains("https://proxy.test/img/p1_original.png"));
}

//! End-to-end tests: both provider APIs and the article hosts are served by
//! a wiremock server, and the real adapters, prober and pipeline run
//! against it.
//!
//! Probing is pointed at 127.0.0.1, so every config here sets
//! `allow_private_hosts`.

use newsreel::app::{App, AppEvent, FeedPhase};
use newsreel::config::Config;
use newsreel::feed::{Pipeline, PipelineError};
use newsreel::storage::{FeedQuery, Provider};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(server: &MockServer) -> Config {
    Config {
        newsapi_key: Some("na-key".into()),
        worldnews_key: Some("wn-key".into()),
        newsapi_base_url: format!("{}/v2", server.uri()),
        worldnews_base_url: server.uri(),
        request_timeout_secs: 5,
        probe_timeout_secs: 2,
        allow_private_hosts: true,
        ..Config::default()
    }
}

fn pipeline(config: &Config) -> Pipeline {
    Pipeline::from_config(config).unwrap()
}

async fn mount_newsapi(server: &MockServer, keyword: &str, page: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("q", keyword))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_worldnews(server: &MockServer, keyword: &str, page: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/search-news"))
        .and(query_param("text", keyword))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_article(server: &MockServer, article_path: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(article_path))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

fn newsapi_article(server: &MockServer, slug: &str, title: &str, desc: &str, at: &str) -> serde_json::Value {
    json!({
        "source": { "id": null, "name": "Wire" },
        "title": title,
        "description": desc,
        "url": format!("{}/{}", server.uri(), slug),
        "urlToImage": null,
        "publishedAt": at,
    })
}

fn worldnews_article(server: &MockServer, slug: &str, title: &str, summary: &str, at: &str) -> serde_json::Value {
    json!({
        "title": title,
        "summary": summary,
        "url": format!("{}/{}", server.uri(), slug),
        "image": null,
        "publish_date": at,
        "source_country": "us",
    })
}

async fn next_event(rx: &mut mpsc::Receiver<AppEvent>) -> AppEvent {
    tokio::time::timeout(Duration::from_secs(10), rx.recv())
        .await
        .expect("timed out waiting for feed")
        .expect("channel closed")
}

#[tokio::test]
async fn test_merge_filter_probe_sort() {
    let server = MockServer::start().await;

    mount_newsapi(
        &server,
        "AI",
        "1",
        json!({
            "status": "ok",
            "totalResults": 3,
            "articles": [
                newsapi_article(&server, "a", "Chips", "New accelerators", "2024-05-01T10:00:00Z"),
                newsapi_article(&server, "gone", "Gone", "[Removed]", "2024-05-01T13:00:00Z"),
                newsapi_article(&server, "paywalled", "Locked", "Subscribers only", "2024-05-01T12:00:00Z"),
            ]
        }),
    )
    .await;
    mount_worldnews(
        &server,
        "AI",
        "1",
        json!({
            "news": [
                worldnews_article(&server, "c", "Models", "<p>Rain &amp; wind</p>", "2024-05-01 11:00:00"),
                worldnews_article(&server, "a", "Chips again", "Duplicate URL", "2024-05-01 14:00:00"),
            ]
        }),
    )
    .await;
    mount_article(&server, "/a", 200).await;
    mount_article(&server, "/paywalled", 401).await;
    mount_article(&server, "/c", 404).await;

    let articles = pipeline(&test_config(&server))
        .run(&FeedQuery::new("AI"))
        .await
        .unwrap();

    let titles: Vec<&str> = articles.iter().map(|a| &*a.title).collect();
    assert_eq!(titles, vec!["Models", "Chips"]);
    assert_eq!(&*articles[0].description, "Rain & wind");
    assert_eq!(articles[0].provider, Provider::WorldNews);
    assert_eq!(articles[1].provider, Provider::NewsApi);
    assert_eq!(&*articles[1].source_name, "Wire");
}

#[tokio::test]
async fn test_one_provider_down_still_returns_other() {
    let server = MockServer::start().await;
    mount_newsapi(
        &server,
        "Apple",
        "1",
        json!({
            "status": "ok",
            "articles": [newsapi_article(&server, "x", "Vision", "Headset", "2024-05-02T08:00:00Z")]
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/search-news"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_article(&server, "/x", 200).await;

    let articles = pipeline(&test_config(&server))
        .run(&FeedQuery::new("Apple"))
        .await
        .unwrap();
    assert_eq!(articles.len(), 1);
    assert_eq!(&*articles[0].title, "Vision");
}

#[tokio::test]
async fn test_both_providers_down_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = pipeline(&test_config(&server))
        .run(&FeedQuery::new("AI"))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::AllSourcesFailed(_)));
}

#[tokio::test]
async fn test_missing_keys_count_as_failures() {
    let server = MockServer::start().await;
    let config = Config {
        newsapi_key: None,
        worldnews_key: None,
        ..test_config(&server)
    };
    // Keys from the environment would make this test meaningless.
    if config.newsapi_key().is_some() || config.worldnews_key().is_some() {
        return;
    }

    let err = pipeline(&config).run(&FeedQuery::new("AI")).await.unwrap_err();
    assert!(err.to_string().contains("No API key"));
}

#[tokio::test]
async fn test_app_loads_then_pages_to_empty() {
    let server = MockServer::start().await;
    mount_newsapi(
        &server,
        "Nvidia",
        "1",
        json!({
            "status": "ok",
            "articles": [
                newsapi_article(&server, "n1", "Earnings", "Beat", "2024-05-03T08:00:00Z"),
                newsapi_article(&server, "n2", "Supply", "Tight", "2024-05-03T07:00:00Z"),
            ]
        }),
    )
    .await;
    mount_worldnews(&server, "Nvidia", "1", json!({ "news": [] })).await;
    mount_newsapi(&server, "Nvidia", "2", json!({ "status": "ok", "articles": [] })).await;
    mount_worldnews(&server, "Nvidia", "2", json!({ "news": [] })).await;
    mount_article(&server, "/n1", 200).await;
    mount_article(&server, "/n2", 200).await;

    let config = test_config(&server);
    let mut app = App::with_pipeline(pipeline(&config), &config);
    let (tx, mut rx) = mpsc::channel(8);

    assert!(app.search("Nvidia", &tx));
    app.handle_event(next_event(&mut rx).await);
    assert_eq!(app.feed.phase(), FeedPhase::Ready);
    assert_eq!(app.feed.articles().len(), 2);

    assert!(app.load_more(&tx));
    assert!(!app.load_more(&tx), "second load-more while loading is ignored");
    app.handle_event(next_event(&mut rx).await);

    assert_eq!(app.feed.articles().len(), 2);
    assert!(!app.feed.is_loading_more());
    assert_eq!(app.feed.page(), 2);
}

#[tokio::test]
async fn test_app_latest_keyword_wins() {
    let server = MockServer::start().await;
    // The first keyword is slow, so its result lands after the second.
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .and(query_param("q", "AI"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "status": "ok",
                    "articles": [newsapi_article(&server, "ai", "Old query", "Late", "2024-05-01T00:00:00Z")]
                }))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    mount_worldnews(&server, "AI", "1", json!({ "news": [] })).await;
    mount_newsapi(
        &server,
        "Tesla",
        "1",
        json!({
            "status": "ok",
            "articles": [newsapi_article(&server, "t", "Recall", "Update", "2024-05-01T00:00:00Z")]
        }),
    )
    .await;
    mount_worldnews(&server, "Tesla", "1", json!({ "news": [] })).await;
    mount_article(&server, "/ai", 200).await;
    mount_article(&server, "/t", 200).await;

    let config = test_config(&server);
    let mut app = App::with_pipeline(pipeline(&config), &config);
    let (tx, mut rx) = mpsc::channel(8);

    app.search("AI", &tx);
    app.search("Tesla", &tx);
    while app.feed.is_loading_initial() {
        app.handle_event(next_event(&mut rx).await);
    }

    assert_eq!(app.feed.keyword(), "Tesla");
    let titles: Vec<&str> = app.feed.articles().iter().map(|a| &*a.title).collect();
    assert_eq!(titles, vec!["Recall"]);
}

#[tokio::test]
async fn test_app_clear_returns_to_default_keyword() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/everything"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok", "articles": [] })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search-news"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "news": [] })))
        .mount(&server)
        .await;

    let config = Config {
        default_keyword: "Renault".into(),
        ..test_config(&server)
    };
    let mut app = App::with_pipeline(pipeline(&config), &config);
    let (tx, mut rx) = mpsc::channel(8);

    assert!(app.search("zzzz", &tx));
    app.handle_event(next_event(&mut rx).await);
    assert!(app.feed.is_empty_result());
    assert!(app.feed.error().is_none());

    assert!(app.clear_search(&tx));
    assert_eq!(app.feed.keyword(), "Renault");
    app.handle_event(next_event(&mut rx).await);
    assert_eq!(app.feed.phase(), FeedPhase::Ready);
}

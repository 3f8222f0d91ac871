use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

pub const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";

#[derive(Debug, Error)]
pub enum ArtworkSearchError {
    #[error("Artwork search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Artwork search failed with status {0}")]
    Status(StatusCode),
}

/// Finds the low resolution artwork of the first song matching a free-text
/// search term.
#[async_trait]
pub trait ArtworkSearch: Send + Sync {
    /// Returns Ok(None) when the search has no result or the result carries
    /// no artwork.
    async fn search_artwork(&self, term: &str) -> Result<Option<String>, ArtworkSearchError>;
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
struct SearchResult {
    #[serde(rename = "artworkUrl100")]
    artwork_url_100: Option<String>,
}

/// Client for the iTunes Search API.
pub struct ItunesSearchClient {
    client: reqwest::Client,
    base_url: String,
}

impl ItunesSearchClient {
    pub fn new(base_url: &str, timeout_sec: u64) -> Result<Self, ArtworkSearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_sec))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl ArtworkSearch for ItunesSearchClient {
    async fn search_artwork(&self, term: &str) -> Result<Option<String>, ArtworkSearchError> {
        let url = format!(
            "{}?term={}&entity=song&limit=1",
            self.base_url,
            urlencoding::encode(term)
        );
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ArtworkSearchError::Status(response.status()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body
            .results
            .into_iter()
            .next()
            .and_then(|r| r.artwork_url_100)
            .filter(|url| !url.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::get, Json, Router};
    use serde_json::json;
    use std::time::Instant;
    use tokio::net::TcpListener;

    /// Serves canned search responses on a random port, returns the base URL.
    async fn spawn_search_stub() -> String {
        let app = Router::new()
            .route(
                "/found",
                get(|| async {
                    Json(json!({
                        "resultCount": 1,
                        "results": [{"trackName": "x", "artworkUrl100": "http://a/100x100bb.jpg"}]
                    }))
                }),
            )
            .route(
                "/empty",
                get(|| async { Json(json!({"resultCount": 0, "results": []})) }),
            )
            .route(
                "/broken",
                get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route("/garbage", get(|| async { "<html>not json</html>" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Json(json!({"results": []}))
                }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://127.0.0.1:{}", port)
    }

    fn client(base: &str, path: &str, timeout_sec: u64) -> ItunesSearchClient {
        ItunesSearchClient::new(&format!("{}{}", base, path), timeout_sec).unwrap()
    }

    #[test]
    fn parses_search_response() {
        let body: SearchResponse = serde_json::from_str(
            r#"{"resultCount":1,"results":[{"trackName":"x","artworkUrl100":"http://a/100x100bb.jpg"}]}"#,
        )
        .unwrap();
        assert_eq!(
            body.results[0].artwork_url_100.as_deref(),
            Some("http://a/100x100bb.jpg")
        );

        let empty: SearchResponse = serde_json::from_str(r#"{"resultCount":0}"#).unwrap();
        assert!(empty.results.is_empty());
    }

    #[tokio::test]
    async fn returns_first_artwork_url() {
        let base = spawn_search_stub().await;

        let result = client(&base, "/found", 5).search_artwork("Queen Bohemian Rhapsody").await;

        assert_eq!(result.unwrap().as_deref(), Some("http://a/100x100bb.jpg"));
    }

    #[tokio::test]
    async fn empty_results_are_not_an_error() {
        let base = spawn_search_stub().await;

        let result = client(&base, "/empty", 5).search_artwork("Nobody").await;

        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let base = spawn_search_stub().await;

        let result = client(&base, "/broken", 5).search_artwork("Queen").await;

        match result {
            Err(ArtworkSearchError::Status(status)) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("Expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let base = spawn_search_stub().await;

        let result = client(&base, "/garbage", 5).search_artwork("Queen").await;

        assert!(matches!(result, Err(ArtworkSearchError::Request(_))));
    }

    #[tokio::test]
    async fn slow_search_times_out() {
        let base = spawn_search_stub().await;
        let start = Instant::now();

        let result = client(&base, "/slow", 1).search_artwork("Queen").await;

        assert!(matches!(result, Err(ArtworkSearchError::Request(ref e)) if e.is_timeout()));
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}

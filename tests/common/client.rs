//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all radioawa-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET request failed")
    }

    // ========================================================================
    // Server Endpoints
    // ========================================================================

    pub async fn get_home(&self) -> Response {
        self.get("/").await
    }

    pub async fn get_health(&self) -> Response {
        self.get("/v1/health").await
    }

    pub async fn get_environment(&self) -> Response {
        self.get("/v1/environment").await
    }

    // ========================================================================
    // Station Endpoints
    // ========================================================================

    pub async fn get_stations(&self) -> Response {
        self.get("/v1/stations").await
    }

    pub async fn get_all_stations(&self) -> Response {
        self.get("/v1/stations/all").await
    }

    pub async fn get_station(&self, code: &str) -> Response {
        self.get(&format!("/v1/stations/{}", code)).await
    }

    // ========================================================================
    // Rating Endpoints
    // ========================================================================

    /// POST /v1/ratings from the loopback address
    pub async fn submit_rating(
        &self,
        station_code: &str,
        artist: &str,
        title: &str,
        user_id: &str,
        rating_type: &str,
    ) -> Response {
        self.client
            .post(format!("{}/v1/ratings", self.base_url))
            .json(&json!({
                "stationCode": station_code,
                "artist": artist,
                "title": title,
                "userId": user_id,
                "ratingType": rating_type,
            }))
            .send()
            .await
            .expect("Submit rating request failed")
    }

    /// POST /v1/ratings as if forwarded by a proxy for `client_ip`
    pub async fn submit_rating_from(
        &self,
        client_ip: &str,
        station_code: &str,
        artist: &str,
        title: &str,
        user_id: &str,
    ) -> Response {
        self.client
            .post(format!("{}/v1/ratings", self.base_url))
            .header("X-Forwarded-For", client_ip)
            .json(&json!({
                "stationCode": station_code,
                "artist": artist,
                "title": title,
                "userId": user_id,
                "ratingType": "THUMBS_UP",
            }))
            .send()
            .await
            .expect("Submit rating request failed")
    }

    pub async fn get_rating_counts(
        &self,
        station_code: &str,
        artist: &str,
        title: &str,
        user_id: Option<&str>,
    ) -> Response {
        let mut query = vec![
            ("stationCode", station_code),
            ("artist", artist),
            ("title", title),
        ];
        if let Some(user_id) = user_id {
            query.push(("userId", user_id));
        }
        self.client
            .get(format!("{}/v1/ratings/counts", self.base_url))
            .query(&query)
            .send()
            .await
            .expect("Rating counts request failed")
    }

    // ========================================================================
    // Artwork Endpoints
    // ========================================================================

    pub async fn get_artwork(&self, artist: &str, title: &str) -> Response {
        self.client
            .get(format!("{}/v1/artwork", self.base_url))
            .query(&[("artist", artist), ("title", title)])
            .send()
            .await
            .expect("Artwork request failed")
    }

    pub async fn get_artwork_cache(&self) -> Response {
        self.get("/v1/artwork/cache").await
    }

    pub async fn clear_artwork_cache(&self) -> Response {
        self.client
            .delete(format!("{}/v1/artwork/cache", self.base_url))
            .send()
            .await
            .expect("Clear artwork cache request failed")
    }

    // ========================================================================
    // Metadata Endpoints
    // ========================================================================

    pub async fn get_now_playing(&self, station_code: &str) -> Response {
        self.get(&format!("/v1/metadata/{}", station_code)).await
    }

    pub async fn get_now_playing_artwork(&self, station_code: &str) -> Response {
        self.get(&format!("/v1/metadata/{}/artwork", station_code))
            .await
    }

    // ========================================================================
    // Alert Endpoints
    // ========================================================================

    pub async fn list_alerts(&self) -> Response {
        self.get("/v1/alerts").await
    }

    pub async fn get_alert(&self, id: i64) -> Response {
        self.get(&format!("/v1/alerts/{}", id)).await
    }

    pub async fn create_alert(&self, body: &Value) -> Response {
        self.client
            .post(format!("{}/v1/alerts", self.base_url))
            .json(body)
            .send()
            .await
            .expect("Create alert request failed")
    }

    pub async fn update_alert(&self, id: i64, body: &Value) -> Response {
        self.client
            .put(format!("{}/v1/alerts/{}", self.base_url, id))
            .json(body)
            .send()
            .await
            .expect("Update alert request failed")
    }

    pub async fn delete_alert(&self, id: i64) -> Response {
        self.client
            .delete(format!("{}/v1/alerts/{}", self.base_url, id))
            .send()
            .await
            .expect("Delete alert request failed")
    }

    pub async fn list_alerts_by_severity(&self, severity: &str) -> Response {
        self.get(&format!("/v1/alerts/severity/{}", severity)).await
    }

    pub async fn list_alerts_by_status(&self, status: &str) -> Response {
        self.get(&format!("/v1/alerts/status/{}", status)).await
    }
}

//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all catalog-server endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::fmt::Display;
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

    async fn post(&self, path: &str, body: &Value) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .expect("POST request failed")
    }

    pub async fn home(&self) -> Response {
        self.get("/").await
    }

    // ========================================================================
    // Mutation Endpoints
    // ========================================================================

    pub async fn add_artist(&self, body: &Value) -> Response {
        self.post("/artist", body).await
    }

    pub async fn add_album(&self, body: &Value) -> Response {
        self.post("/album", body).await
    }

    pub async fn add_song(&self, body: &Value) -> Response {
        self.post("/songs", body).await
    }

    pub async fn add_playlist(&self, body: &Value) -> Response {
        self.post("/playlists", body).await
    }

    pub async fn add_play(&self, body: &Value) -> Response {
        self.post("/playcount", body).await
    }

    /// Sends a raw, possibly malformed, body to a mutation route
    pub async fn post_raw(&self, path: &str, body: &'static str) -> Response {
        self.client
            .post(format!("{}{}", self.base_url, path))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("POST request failed")
    }

    // ========================================================================
    // Lookup Endpoints
    // ========================================================================

    pub async fn get_song(&self, id: impl Display) -> Response {
        self.get(&format!("/songs/{}", id)).await
    }

    pub async fn get_album(&self, id: impl Display) -> Response {
        self.get(&format!("/albums/{}", id)).await
    }

    pub async fn get_artist(&self, id: impl Display) -> Response {
        self.get(&format!("/artists/{}", id)).await
    }

    pub async fn get_playlist(&self, id: impl Display) -> Response {
        self.get(&format!("/playlists/{}", id)).await
    }

    pub async fn get_songs_by_album(&self, id: impl Display) -> Response {
        self.get(&format!("/songs/by_album/{}", id)).await
    }

    pub async fn get_songs_by_artist(&self, id: impl Display) -> Response {
        self.get(&format!("/songs/by_artist/{}", id)).await
    }

    pub async fn get_albums_by_artist(&self, id: impl Display) -> Response {
        self.get(&format!("/albums/by_artist/{}", id)).await
    }

    // ========================================================================
    // Analytics Endpoints
    // ========================================================================

    pub async fn get_average_song_length(&self, artist_id: impl Display) -> Response {
        self.get(&format!("/analytics/artists/avg_song_length/{}", artist_id))
            .await
    }

    pub async fn get_count_singles(&self, artist_id: impl Display) -> Response {
        self.get(&format!("/analytics/artists/cnt_singles/{}", artist_id))
            .await
    }

    pub async fn get_top_artists_by_length(&self, n: impl Display) -> Response {
        self.get(&format!("/analytics/artists/top_length/{}", n))
            .await
    }

    pub async fn get_solo_albums(&self) -> Response {
        self.get("/analytics/solo_albums").await
    }

    pub async fn get_top_song(&self, date: &str) -> Response {
        self.get(&format!("/analytics/playcount/top_song/{}", date))
            .await
    }

    pub async fn get_top_source(&self, song_id: impl Display, date: &str) -> Response {
        self.get(&format!(
            "/analytics/playcount/top_source/{}/{}",
            song_id, date
        ))
        .await
    }

    pub async fn get_top_country(&self, date: &str) -> Response {
        self.get(&format!("/analytics/playcount/top_country/{}", date))
            .await
    }

    // ========================================================================
    // Debug Endpoints
    // ========================================================================

    pub async fn debug_query(&self, sql: &str) -> Response {
        self.post("/debug/query", &json!({ "query": sql })).await
    }

    pub async fn debug_reset(&self) -> Response {
        self.post("/debug/reset", &json!({})).await
    }
}

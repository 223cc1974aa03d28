//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, SONG_INTRO_ID};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_get_song() {
//!     let server = TestServer::spawn_seeded().await;
//!     let client = server.client();
//!
//!     let response = client.get_song(SONG_INTRO_ID).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

#![allow(dead_code)]

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::TestClient;
pub use constants::*;
pub use server::TestServer;

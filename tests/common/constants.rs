//! Shared constants for end-to-end tests
//!
//! This module contains all constants used across the test suite.
//! When the seeded catalog changes, update only this file and `fixtures.rs`.

// ============================================================================
// Test Catalog IDs
// ============================================================================

/// Artist "Nina", an integer id, country US
pub const ARTIST_NINA_ID: i64 = 1;

/// Artist "Otto", country DE
pub const ARTIST_OTTO_ID: &str = "A2";

/// Artist "Luz", country BR, credited on nothing
pub const ARTIST_LUZ_ID: &str = "A3";

/// "First Light" by Nina, tracklist [SONG_ROAD, SONG_INTRO]
pub const ALBUM_FIRST_LIGHT_ID: &str = "AL1";

/// "Together" by Nina, tracklist [SONG_DUET]
pub const ALBUM_TOGETHER_ID: &str = "AL2";

/// "Otto Alone" by Otto, tracklist [SONG_OTTO]
pub const ALBUM_OTTO_ALONE_ID: &str = "AL3";

/// "Intro", 100s, Nina
pub const SONG_INTRO_ID: &str = "S1";

/// "Long Road", 300s, Nina
pub const SONG_ROAD_ID: &str = "S2";

/// "Duet", 200s, Nina and Otto
pub const SONG_DUET_ID: &str = "S3";

/// "Otto Theme", 150s, Otto
pub const SONG_OTTO_ID: &str = "S4";

/// "Loose Single", 120s, Nina, on no album
pub const SONG_SINGLE_ID: &str = "S5";

/// "Road Trip" playlist, [SONG_DUET, SONG_INTRO]
pub const PLAYLIST_ROAD_TRIP_ID: i64 = 10;

// ============================================================================
// Test Catalog Metadata
// ============================================================================

pub const ARTIST_NINA_NAME: &str = "Nina";

pub const ALBUM_FIRST_LIGHT_NAME: &str = "First Light";

pub const PLAYLIST_ROAD_TRIP_NAME: &str = "Road Trip";

// ============================================================================
// Play Dates
// ============================================================================

/// Date with seeded plays
pub const PLAY_DATE: &str = "2024-03-01";

/// Date without any play
pub const EMPTY_DATE: &str = "2024-03-02";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

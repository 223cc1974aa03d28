//! SQLite schema for the music catalog.
//!
//! Identifier columns are untyped so integer and string ids are stored as
//! given. Association tables carry no foreign keys: rows may reference
//! entities that were never inserted.

use crate::sqlite_column;
use crate::sqlite_persistence::{SqlType, Table, VersionedSchema};

// =============================================================================
// Entity Tables
// =============================================================================

const ARTIST_TABLE: Table = Table {
    name: "artist",
    columns: &[
        sqlite_column!("artist_id", &SqlType::Untyped, is_primary_key = true),
        sqlite_column!("artist_name", &SqlType::Text, non_null = true),
        sqlite_column!("country", &SqlType::Text),
    ],
    indices: &[],
    unique_constraints: &[],
};

const ALBUM_TABLE: Table = Table {
    name: "album",
    columns: &[
        sqlite_column!("album_id", &SqlType::Untyped, is_primary_key = true),
        sqlite_column!("album_name", &SqlType::Text, non_null = true),
        sqlite_column!("release_year", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

const SONG_TABLE: Table = Table {
    name: "song",
    columns: &[
        sqlite_column!("song_id", &SqlType::Untyped, is_primary_key = true),
        sqlite_column!("song_name", &SqlType::Text, non_null = true),
        sqlite_column!("length", &SqlType::Real, non_null = true), // seconds
    ],
    indices: &[],
    unique_constraints: &[],
};

const PLAYLIST_TABLE: Table = Table {
    name: "playlist",
    columns: &[
        sqlite_column!("playlist_id", &SqlType::Untyped, is_primary_key = true),
        sqlite_column!("playlist_name", &SqlType::Text, non_null = true),
        sqlite_column!("author_name", &SqlType::Text, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[],
};

// =============================================================================
// Association Tables
// =============================================================================

/// Song credits (an artist "created" a song).
const SONG_ARTIST_TABLE: Table = Table {
    name: "song_artist",
    columns: &[
        sqlite_column!("song_id", &SqlType::Untyped, non_null = true),
        sqlite_column!("artist_id", &SqlType::Untyped, non_null = true),
    ],
    indices: &[("idx_song_artist_artist", "artist_id")],
    unique_constraints: &[&["song_id", "artist_id"]],
};

/// Album credits (an album was "released" by an artist).
const ALBUM_ARTIST_TABLE: Table = Table {
    name: "album_artist",
    columns: &[
        sqlite_column!("album_id", &SqlType::Untyped, non_null = true),
        sqlite_column!("artist_id", &SqlType::Untyped, non_null = true),
    ],
    indices: &[("idx_album_artist_artist", "artist_id")],
    unique_constraints: &[&["album_id", "artist_id"]],
};

/// Album tracklists. `ordering` grows by one per inserted track of an album.
const ALBUM_TRACK_TABLE: Table = Table {
    name: "album_track",
    columns: &[
        sqlite_column!("album_id", &SqlType::Untyped, non_null = true),
        sqlite_column!("song_id", &SqlType::Untyped, non_null = true),
        sqlite_column!("ordering", &SqlType::Integer, non_null = true),
    ],
    indices: &[("idx_album_track_song", "song_id")],
    unique_constraints: &[&["album_id", "song_id"]],
};

const PLAYLIST_SONG_TABLE: Table = Table {
    name: "playlist_song",
    columns: &[
        sqlite_column!("playlist_id", &SqlType::Untyped, non_null = true),
        sqlite_column!("song_id", &SqlType::Untyped, non_null = true),
        sqlite_column!("ordering", &SqlType::Integer, non_null = true),
    ],
    indices: &[],
    unique_constraints: &[&["playlist_id", "song_id"]],
};

// =============================================================================
// Play Events
// =============================================================================

/// Play counters keyed by (date, song_id, playlist_id, album_id) with
/// NULL-safe matching. The key can't be a UNIQUE constraint since SQLite
/// treats NULLs as distinct, so uniqueness is kept by the upsert path.
const PLAY_TABLE: Table = Table {
    name: "play",
    columns: &[
        sqlite_column!("date", &SqlType::Text, non_null = true), // 'YYYY-MM-DD'
        sqlite_column!("song_id", &SqlType::Untyped, non_null = true),
        sqlite_column!("play_count", &SqlType::Integer, non_null = true),
        sqlite_column!("playlist_id", &SqlType::Untyped),
        sqlite_column!("album_id", &SqlType::Untyped),
    ],
    indices: &[
        ("idx_play_date", "date"),
        ("idx_play_song_date", "song_id, date"),
    ],
    unique_constraints: &[],
};

pub const CATALOG_VERSIONED_SCHEMAS: &[VersionedSchema] = &[VersionedSchema {
    version: 1,
    tables: &[
        ARTIST_TABLE,
        ALBUM_TABLE,
        SONG_TABLE,
        PLAYLIST_TABLE,
        SONG_ARTIST_TABLE,
        ALBUM_ARTIST_TABLE,
        ALBUM_TRACK_TABLE,
        PLAYLIST_SONG_TABLE,
        PLAY_TABLE,
    ],
}];

//! Catalog entities, insert payloads and query results.

use chrono::NaiveDate;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// =============================================================================
// Identifiers
// =============================================================================

/// Caller-supplied identifier, either an integer or a string.
///
/// Ordering matches SQLite's: every integer sorts before every string,
/// strings compare bytewise.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogId {
    Int(i64),
    Text(String),
}

impl CatalogId {
    /// Interprets a URL path segment. Canonical integers (no leading zeros or
    /// plus sign) become `Int`, anything else stays `Text`.
    pub fn from_path_segment(segment: &str) -> Self {
        match segment.parse::<i64>() {
            Ok(value) if value.to_string() == segment => CatalogId::Int(value),
            _ => CatalogId::Text(segment.to_string()),
        }
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogId::Int(value) => write!(f, "{}", value),
            CatalogId::Text(value) => write!(f, "{}", value),
        }
    }
}

impl From<i64> for CatalogId {
    fn from(value: i64) -> Self {
        CatalogId::Int(value)
    }
}

impl From<&str> for CatalogId {
    fn from(value: &str) -> Self {
        CatalogId::Text(value.to_string())
    }
}

impl ToSql for CatalogId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            CatalogId::Int(value) => ToSqlOutput::from(*value),
            CatalogId::Text(value) => ToSqlOutput::from(value.as_str()),
        })
    }
}

impl FromSql for CatalogId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value {
            ValueRef::Integer(value) => Ok(CatalogId::Int(value)),
            ValueRef::Text(bytes) => std::str::from_utf8(bytes)
                .map(|s| CatalogId::Text(s.to_string()))
                .map_err(|e| FromSqlError::Other(Box::new(e))),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

// =============================================================================
// Core Entities
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub artist_id: CatalogId,
    pub artist_name: String,
    pub country: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub album_id: CatalogId,
    pub album_name: String,
    pub release_year: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub song_id: CatalogId,
    pub song_name: String,
    /// Seconds.
    pub length: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub playlist_id: CatalogId,
    pub playlist_name: String,
    pub author_name: String,
}

// =============================================================================
// Insert Payloads
// =============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct NewAlbum {
    pub album: Album,
    pub artist_ids: Vec<CatalogId>,
    /// Appended to the album's tracklist in this order.
    pub song_ids: Vec<CatalogId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewSong {
    pub song: Song,
    pub artist_ids: Vec<CatalogId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewPlaylist {
    pub playlist: Playlist,
    pub song_ids: Vec<CatalogId>,
}

/// Where a play happened.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlaySource {
    Playlist(CatalogId),
    Album(CatalogId),
    Direct,
}

impl PlaySource {
    pub fn playlist_id(&self) -> Option<&CatalogId> {
        match self {
            PlaySource::Playlist(id) => Some(id),
            _ => None,
        }
    }

    pub fn album_id(&self) -> Option<&CatalogId> {
        match self {
            PlaySource::Album(id) => Some(id),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayEvent {
    pub date: NaiveDate,
    pub song_id: CatalogId,
    pub play_count: i64,
    pub source: PlaySource,
}

// =============================================================================
// Lookup Results
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongDetails {
    #[serde(flatten)]
    pub song: Song,
    pub artist_ids: Vec<CatalogId>,
    pub album_ids: Vec<CatalogId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlbumDetails {
    #[serde(flatten)]
    pub album: Album,
    pub artist_ids: Vec<CatalogId>,
    pub song_ids: Vec<CatalogId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaylistDetails {
    #[serde(flatten)]
    pub playlist: Playlist,
    /// Insertion order.
    pub song_ids: Vec<CatalogId>,
}

/// A song as listed on an album, in tracklist order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlbumTrack {
    pub song_id: CatalogId,
    pub song_name: String,
    pub length: f64,
    pub album_name: String,
    pub artist_ids: Vec<CatalogId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtistSong {
    #[serde(flatten)]
    pub song: Song,
    pub artist_ids: Vec<CatalogId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtistAlbum {
    #[serde(flatten)]
    pub album: Album,
    pub artist_ids: Vec<CatalogId>,
}

// =============================================================================
// Analytics Results
// =============================================================================

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtistAverageLength {
    pub artist_id: CatalogId,
    pub avg_length: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtistSingles {
    pub artist_id: CatalogId,
    pub cnt_single: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtistTotalLength {
    pub artist_id: CatalogId,
    pub total_length: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SongPlayCount {
    pub song_id: CatalogId,
    pub play_count: i64,
}

/// The best performing source of a song on a date.
///
/// Serializes as `{"playlist_id": .., "play_count": ..}`, `{"album_id": ..,
/// "play_count": ..}` or just `{"play_count": ..}` for direct plays.
#[derive(Clone, Debug, PartialEq)]
pub struct TopSource {
    pub source: PlaySource,
    pub play_count: i64,
}

impl Serialize for TopSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        match &self.source {
            PlaySource::Playlist(id) => map.serialize_entry("playlist_id", id)?,
            PlaySource::Album(id) => map.serialize_entry("album_id", id)?,
            PlaySource::Direct => {}
        }
        map.serialize_entry("play_count", &self.play_count)?;
        map.end()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountryPlayCount {
    pub country: String,
    pub play_count: i64,
}

/// Row counts, reported on the home route and as metrics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogCounts {
    pub artists: i64,
    pub albums: i64,
    pub songs: i64,
    pub playlists: i64,
    pub plays: i64,
}

//! CatalogStore trait definition.

use super::error::CatalogResult;
use super::models::*;
use super::raw_query::RawRow;
use chrono::NaiveDate;

/// Storage backend for the music catalog.
///
/// Mutations take the raw JSON request body and validate it before touching
/// the store; each call is applied atomically.
pub trait CatalogStore: Send + Sync {
    // =========================================================================
    // Mutations
    // =========================================================================

    fn add_artist(&self, body: &serde_json::Value) -> CatalogResult<()>;

    /// Inserts the album, its artist credits and appends `song_ids` to its
    /// tracklist.
    fn add_album(&self, body: &serde_json::Value) -> CatalogResult<()>;

    fn add_song(&self, body: &serde_json::Value) -> CatalogResult<()>;

    fn add_playlist(&self, body: &serde_json::Value) -> CatalogResult<()>;

    /// Accumulates a play count, returning the counter's new value.
    fn add_play(&self, body: &serde_json::Value) -> CatalogResult<i64>;

    // =========================================================================
    // Lookups
    // =========================================================================

    fn get_song(&self, song_id: &CatalogId) -> CatalogResult<SongDetails>;

    fn get_album(&self, album_id: &CatalogId) -> CatalogResult<AlbumDetails>;

    fn get_artist(&self, artist_id: &CatalogId) -> CatalogResult<Artist>;

    fn get_playlist(&self, playlist_id: &CatalogId) -> CatalogResult<PlaylistDetails>;

    fn get_songs_by_album(&self, album_id: &CatalogId) -> CatalogResult<Vec<AlbumTrack>>;

    fn get_songs_by_artist(&self, artist_id: &CatalogId) -> CatalogResult<Vec<ArtistSong>>;

    fn get_albums_by_artist(&self, artist_id: &CatalogId) -> CatalogResult<Vec<ArtistAlbum>>;

    // =========================================================================
    // Analytics
    // =========================================================================

    fn average_song_length(&self, artist_id: &CatalogId) -> CatalogResult<ArtistAverageLength>;

    fn count_singles(&self, artist_id: &CatalogId) -> CatalogResult<ArtistSingles>;

    fn top_artists_by_length(&self, limit: u32) -> CatalogResult<Vec<ArtistTotalLength>>;

    fn solo_albums(&self) -> CatalogResult<Vec<CatalogId>>;

    fn top_song_on_date(&self, date: NaiveDate) -> CatalogResult<SongPlayCount>;

    fn top_source_for_song(&self, song_id: &CatalogId, date: NaiveDate)
        -> CatalogResult<TopSource>;

    fn top_country_on_date(&self, date: NaiveDate) -> CatalogResult<CountryPlayCount>;

    // =========================================================================
    // Maintenance
    // =========================================================================

    fn get_counts(&self) -> CatalogResult<CatalogCounts>;

    /// Runs arbitrary SQL. No validation of any kind is applied.
    fn run_query(&self, sql: &str) -> CatalogResult<Vec<RawRow>>;

    /// Drops every catalog table and recreates an empty schema.
    fn reset(&self) -> anyhow::Result<()>;
}

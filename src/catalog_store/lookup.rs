//! Point and relationship lookups.
//!
//! Associated id lists come back in ascending id order (SQLite ordering,
//! which matches `CatalogId`'s `Ord`) and may name entities that were never
//! inserted. Listings that need the entity's own columns skip such rows.

use super::error::{CatalogError, CatalogResult};
use super::models::*;
use rusqlite::{params, Connection, OptionalExtension, Row};

fn song_from_row(row: &Row) -> rusqlite::Result<Song> {
    Ok(Song {
        song_id: row.get(0)?,
        song_name: row.get(1)?,
        length: row.get(2)?,
    })
}

fn album_from_row(row: &Row) -> rusqlite::Result<Album> {
    Ok(Album {
        album_id: row.get(0)?,
        album_name: row.get(1)?,
        release_year: row.get(2)?,
    })
}

/// Runs a single-parameter query returning one id per row.
fn ids_for(conn: &Connection, sql: &str, key: &CatalogId) -> CatalogResult<Vec<CatalogId>> {
    let mut stmt = conn.prepare_cached(sql)?;
    let ids = stmt
        .query_map(params![key], |r| r.get(0))?
        .collect::<Result<Vec<CatalogId>, _>>()?;
    Ok(ids)
}

fn song_artist_ids(conn: &Connection, song_id: &CatalogId) -> CatalogResult<Vec<CatalogId>> {
    ids_for(
        conn,
        "SELECT artist_id FROM song_artist WHERE song_id = ?1 ORDER BY artist_id",
        song_id,
    )
}

fn album_artist_ids(conn: &Connection, album_id: &CatalogId) -> CatalogResult<Vec<CatalogId>> {
    ids_for(
        conn,
        "SELECT artist_id FROM album_artist WHERE album_id = ?1 ORDER BY artist_id",
        album_id,
    )
}

fn find_artist(conn: &Connection, artist_id: &CatalogId) -> CatalogResult<Option<Artist>> {
    let artist = conn
        .prepare_cached("SELECT artist_id, artist_name, country FROM artist WHERE artist_id = ?1")?
        .query_row(params![artist_id], |r| {
            Ok(Artist {
                artist_id: r.get(0)?,
                artist_name: r.get(1)?,
                country: r.get(2)?,
            })
        })
        .optional()?;
    Ok(artist)
}

fn find_album(conn: &Connection, album_id: &CatalogId) -> CatalogResult<Option<Album>> {
    let album = conn
        .prepare_cached("SELECT album_id, album_name, release_year FROM album WHERE album_id = ?1")?
        .query_row(params![album_id], album_from_row)
        .optional()?;
    Ok(album)
}

// =============================================================================
// Point Lookups
// =============================================================================

pub fn get_song(conn: &Connection, song_id: &CatalogId) -> CatalogResult<SongDetails> {
    let song = conn
        .prepare_cached("SELECT song_id, song_name, length FROM song WHERE song_id = ?1")?
        .query_row(params![song_id], song_from_row)
        .optional()?
        .ok_or_else(|| CatalogError::NotFound(format!("song {}", song_id)))?;

    let artist_ids = song_artist_ids(conn, song_id)?;
    let album_ids = ids_for(
        conn,
        "SELECT DISTINCT album_id FROM album_track WHERE song_id = ?1 ORDER BY album_id",
        song_id,
    )?;

    Ok(SongDetails {
        song,
        artist_ids,
        album_ids,
    })
}

pub fn get_album(conn: &Connection, album_id: &CatalogId) -> CatalogResult<AlbumDetails> {
    let album = find_album(conn, album_id)?
        .ok_or_else(|| CatalogError::NotFound(format!("album {}", album_id)))?;

    let artist_ids = album_artist_ids(conn, album_id)?;
    let song_ids = ids_for(
        conn,
        "SELECT song_id FROM album_track WHERE album_id = ?1 ORDER BY song_id",
        album_id,
    )?;

    Ok(AlbumDetails {
        album,
        artist_ids,
        song_ids,
    })
}

pub fn get_artist(conn: &Connection, artist_id: &CatalogId) -> CatalogResult<Artist> {
    find_artist(conn, artist_id)?
        .ok_or_else(|| CatalogError::NotFound(format!("artist {}", artist_id)))
}

pub fn get_playlist(conn: &Connection, playlist_id: &CatalogId) -> CatalogResult<PlaylistDetails> {
    let playlist = conn
        .prepare_cached(
            "SELECT playlist_id, playlist_name, author_name FROM playlist WHERE playlist_id = ?1",
        )?
        .query_row(params![playlist_id], |r| {
            Ok(Playlist {
                playlist_id: r.get(0)?,
                playlist_name: r.get(1)?,
                author_name: r.get(2)?,
            })
        })
        .optional()?
        .ok_or_else(|| CatalogError::NotFound(format!("playlist {}", playlist_id)))?;

    let song_ids = ids_for(
        conn,
        "SELECT song_id FROM playlist_song WHERE playlist_id = ?1 ORDER BY ordering",
        playlist_id,
    )?;

    Ok(PlaylistDetails { playlist, song_ids })
}

// =============================================================================
// Relationship Lookups
// =============================================================================

/// Songs of an album in tracklist order.
pub fn songs_by_album(conn: &Connection, album_id: &CatalogId) -> CatalogResult<Vec<AlbumTrack>> {
    let album = find_album(conn, album_id)?
        .ok_or_else(|| CatalogError::NotFound(format!("album {}", album_id)))?;

    let songs = conn
        .prepare_cached(
            "SELECT s.song_id, s.song_name, s.length
             FROM album_track t
             JOIN song s ON s.song_id = t.song_id
             WHERE t.album_id = ?1
             ORDER BY t.ordering",
        )?
        .query_map(params![album_id], song_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    songs
        .into_iter()
        .map(|song| -> CatalogResult<AlbumTrack> {
            Ok(AlbumTrack {
                artist_ids: song_artist_ids(conn, &song.song_id)?,
                song_id: song.song_id,
                song_name: song.song_name,
                length: song.length,
                album_name: album.album_name.clone(),
            })
        })
        .collect()
}

/// Songs credited to an artist, by ascending song id.
pub fn songs_by_artist(conn: &Connection, artist_id: &CatalogId) -> CatalogResult<Vec<ArtistSong>> {
    if find_artist(conn, artist_id)?.is_none() {
        return Err(CatalogError::NotFound(format!("artist {}", artist_id)));
    }

    let songs = conn
        .prepare_cached(
            "SELECT s.song_id, s.song_name, s.length
             FROM song_artist c
             JOIN song s ON s.song_id = c.song_id
             WHERE c.artist_id = ?1
             ORDER BY s.song_id",
        )?
        .query_map(params![artist_id], song_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    songs
        .into_iter()
        .map(|song| -> CatalogResult<ArtistSong> {
            Ok(ArtistSong {
                artist_ids: song_artist_ids(conn, &song.song_id)?,
                song,
            })
        })
        .collect()
}

/// Albums released by an artist, by ascending album id. An existing artist
/// without albums yields an empty list.
pub fn albums_by_artist(
    conn: &Connection,
    artist_id: &CatalogId,
) -> CatalogResult<Vec<ArtistAlbum>> {
    if find_artist(conn, artist_id)?.is_none() {
        return Err(CatalogError::NotFound(format!("artist {}", artist_id)));
    }

    let albums = conn
        .prepare_cached(
            "SELECT a.album_id, a.album_name, a.release_year
             FROM album_artist r
             JOIN album a ON a.album_id = r.album_id
             WHERE r.artist_id = ?1
             ORDER BY a.album_id",
        )?
        .query_map(params![artist_id], album_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    albums
        .into_iter()
        .map(|album| -> CatalogResult<ArtistAlbum> {
            Ok(ArtistAlbum {
                artist_ids: album_artist_ids(conn, &album.album_id)?,
                album,
            })
        })
        .collect()
}

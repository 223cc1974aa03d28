//! Idempotent inserts.
//!
//! Every function expects to run inside the caller's write transaction and
//! touches only the connection it is handed.

use super::error::{CatalogError, CatalogResult};
use super::models::*;
use super::validation::DATE_FORMAT;
use rusqlite::{params, Connection};
use tracing::debug;

pub fn insert_artist(conn: &Connection, artist: &Artist) -> CatalogResult<()> {
    let inserted = conn.execute(
        "INSERT INTO artist (artist_id, artist_name, country) VALUES (?1, ?2, ?3)
         ON CONFLICT DO NOTHING",
        params![artist.artist_id, artist.artist_name, artist.country],
    )?;
    debug!("artist {} inserted: {}", artist.artist_id, inserted > 0);
    Ok(())
}

pub fn insert_album(conn: &Connection, new_album: &NewAlbum) -> CatalogResult<()> {
    let album = &new_album.album;
    conn.execute(
        "INSERT INTO album (album_id, album_name, release_year) VALUES (?1, ?2, ?3)
         ON CONFLICT DO NOTHING",
        params![album.album_id, album.album_name, album.release_year],
    )?;

    let mut credit_stmt = conn.prepare_cached(
        "INSERT INTO album_artist (album_id, artist_id) VALUES (?1, ?2) ON CONFLICT DO NOTHING",
    )?;
    for artist_id in &new_album.artist_ids {
        credit_stmt.execute(params![album.album_id, artist_id])?;
    }

    // Ordering continues from the album's current last track, so tracks
    // added by later calls always follow earlier ones.
    let mut track_stmt = conn.prepare_cached(
        "INSERT INTO album_track (album_id, song_id, ordering)
         SELECT ?1, ?2, COALESCE(MAX(ordering), 0) + 1 FROM album_track WHERE album_id = ?1
         ON CONFLICT DO NOTHING",
    )?;
    for song_id in &new_album.song_ids {
        track_stmt.execute(params![album.album_id, song_id])?;
    }

    debug!(
        "album {} stored with {} artists and {} tracks",
        album.album_id,
        new_album.artist_ids.len(),
        new_album.song_ids.len()
    );
    Ok(())
}

pub fn insert_song(conn: &Connection, new_song: &NewSong) -> CatalogResult<()> {
    let song = &new_song.song;
    conn.execute(
        "INSERT INTO song (song_id, song_name, length) VALUES (?1, ?2, ?3)
         ON CONFLICT DO NOTHING",
        params![song.song_id, song.song_name, song.length],
    )?;

    let mut credit_stmt = conn.prepare_cached(
        "INSERT INTO song_artist (song_id, artist_id) VALUES (?1, ?2) ON CONFLICT DO NOTHING",
    )?;
    for artist_id in &new_song.artist_ids {
        credit_stmt.execute(params![song.song_id, artist_id])?;
    }

    debug!(
        "song {} stored with {} artists",
        song.song_id,
        new_song.artist_ids.len()
    );
    Ok(())
}

pub fn insert_playlist(conn: &Connection, new_playlist: &NewPlaylist) -> CatalogResult<()> {
    let playlist = &new_playlist.playlist;
    conn.execute(
        "INSERT INTO playlist (playlist_id, playlist_name, author_name) VALUES (?1, ?2, ?3)
         ON CONFLICT DO NOTHING",
        params![
            playlist.playlist_id,
            playlist.playlist_name,
            playlist.author_name
        ],
    )?;

    let mut song_stmt = conn.prepare_cached(
        "INSERT INTO playlist_song (playlist_id, song_id, ordering)
         SELECT ?1, ?2, COALESCE(MAX(ordering), 0) + 1 FROM playlist_song WHERE playlist_id = ?1
         ON CONFLICT DO NOTHING",
    )?;
    for song_id in &new_playlist.song_ids {
        song_stmt.execute(params![playlist.playlist_id, song_id])?;
    }

    debug!(
        "playlist {} stored with {} songs",
        playlist.playlist_id,
        new_playlist.song_ids.len()
    );
    Ok(())
}

/// Adds `play.play_count` to the counter keyed by (date, song, source),
/// creating it when absent. Returns the counter's new value.
///
/// A song's counters for one day must sum within `i64`, so that neither the
/// counter nor the day's per-song totals can overflow. A delta that would
/// break this is rejected as `InvalidValue`.
///
/// Must run inside a write transaction: the read, the update and the
/// fallback insert are only atomic together.
pub fn upsert_play(conn: &Connection, play: &PlayEvent) -> CatalogResult<i64> {
    let date = play.date.format(DATE_FORMAT).to_string();
    let playlist_id = play.source.playlist_id();
    let album_id = play.source.album_id();

    // `IS` matches NULL against NULL, giving the NULL-safe key
    let (current, song_day_total): (Option<i64>, i64) = conn.query_row(
        "SELECT
             (SELECT play_count FROM play
              WHERE date = ?1 AND song_id = ?2 AND playlist_id IS ?3 AND album_id IS ?4),
             (SELECT COALESCE(SUM(play_count), 0) FROM play WHERE date = ?1 AND song_id = ?2)",
        params![date, play.song_id, playlist_id, album_id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;

    if song_day_total.checked_add(play.play_count).is_none() {
        return Err(CatalogError::invalid_value(
            "play_count",
            format!(
                "adding {} to the plays of song {} on {} overflows",
                play.play_count, play.song_id, date
            ),
        ));
    }
    let total = current.unwrap_or(0) + play.play_count;

    match current {
        Some(_) => conn.execute(
            "UPDATE play SET play_count = ?1
             WHERE date = ?2 AND song_id = ?3 AND playlist_id IS ?4 AND album_id IS ?5",
            params![total, date, play.song_id, playlist_id, album_id],
        )?,
        None => conn.execute(
            "INSERT INTO play (date, song_id, play_count, playlist_id, album_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![date, play.song_id, total, playlist_id, album_id],
        )?,
    };

    debug!(
        "play of song {} on {} now at {} (+{})",
        play.song_id, date, total, play.play_count
    );
    Ok(total)
}

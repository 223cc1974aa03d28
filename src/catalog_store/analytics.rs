//! Read-only aggregate queries over the catalog and play counters.
//!
//! Every query is deterministic: ties are broken by ascending id (or country
//! name), and an empty result is reported as `NotFound`. Artist-keyed
//! aggregates only consider artists that have an `artist` row.

use super::error::{CatalogError, CatalogResult};
use super::models::*;
use super::validation::DATE_FORMAT;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};

fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

// =============================================================================
// Artist Aggregates
// =============================================================================

/// Mean length of the songs credited to an artist.
pub fn average_song_length(
    conn: &Connection,
    artist_id: &CatalogId,
) -> CatalogResult<ArtistAverageLength> {
    let (songs, avg_length): (i64, Option<f64>) = conn
        .prepare_cached(
            "SELECT COUNT(*), AVG(s.length)
             FROM song s
             JOIN song_artist c ON c.song_id = s.song_id
             JOIN artist a ON a.artist_id = c.artist_id
             WHERE c.artist_id = ?1",
        )?
        .query_row(params![artist_id], |r| Ok((r.get(0)?, r.get(1)?)))?;

    match avg_length {
        Some(avg_length) if songs > 0 => Ok(ArtistAverageLength {
            artist_id: artist_id.clone(),
            avg_length,
        }),
        _ => Err(CatalogError::NotFound(format!(
            "no songs credited to artist {}",
            artist_id
        ))),
    }
}

/// Number of an artist's songs that are on no album.
pub fn count_singles(conn: &Connection, artist_id: &CatalogId) -> CatalogResult<ArtistSingles> {
    let (songs, singles): (i64, Option<i64>) = conn
        .prepare_cached(
            "SELECT COUNT(*),
                    SUM(NOT EXISTS (SELECT 1 FROM album_track t WHERE t.song_id = s.song_id))
             FROM song s
             JOIN song_artist c ON c.song_id = s.song_id
             JOIN artist a ON a.artist_id = c.artist_id
             WHERE c.artist_id = ?1",
        )?
        .query_row(params![artist_id], |r| Ok((r.get(0)?, r.get(1)?)))?;

    if songs == 0 {
        return Err(CatalogError::NotFound(format!(
            "no songs credited to artist {}",
            artist_id
        )));
    }

    Ok(ArtistSingles {
        artist_id: artist_id.clone(),
        cnt_single: singles.unwrap_or(0),
    })
}

/// The `limit` artists with the largest total song length.
pub fn top_artists_by_length(
    conn: &Connection,
    limit: u32,
) -> CatalogResult<Vec<ArtistTotalLength>> {
    let ranking = conn
        .prepare_cached(
            "SELECT c.artist_id, SUM(s.length) AS total_length
             FROM song_artist c
             JOIN song s ON s.song_id = c.song_id
             JOIN artist a ON a.artist_id = c.artist_id
             GROUP BY c.artist_id
             ORDER BY total_length DESC, c.artist_id ASC
             LIMIT ?1",
        )?
        .query_map(params![limit], |r| {
            Ok(ArtistTotalLength {
                artist_id: r.get(0)?,
                total_length: r.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if ranking.is_empty() {
        return Err(CatalogError::NotFound(
            "no artists with credited songs".to_string(),
        ));
    }
    Ok(ranking)
}

// =============================================================================
// Album Classification
// =============================================================================

/// Albums whose every track is credited exclusively to the album's only
/// artist.
///
/// Computed as every single-artist album minus those having at least one
/// track that is co-credited or credited to someone else.
pub fn solo_albums(conn: &Connection) -> CatalogResult<Vec<CatalogId>> {
    let mut albums = conn
        .prepare_cached(
            "SELECT album_id FROM album_artist
             GROUP BY album_id
             HAVING COUNT(*) = 1
             EXCEPT
             SELECT t.album_id
             FROM album_track t
             JOIN song_artist c ON c.song_id = t.song_id
             JOIN album_artist r ON r.album_id = t.album_id
             GROUP BY t.album_id, t.song_id
             HAVING COUNT(*) != 1 OR MAX(c.artist_id IS NOT r.artist_id)",
        )?
        .query_map([], |r| r.get::<_, CatalogId>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    if albums.is_empty() {
        return Err(CatalogError::NotFound("no solo albums".to_string()));
    }
    albums.sort();
    Ok(albums)
}

// =============================================================================
// Play Count Rankings
// =============================================================================

/// The most played song of a day, summing every source.
pub fn top_song_on_date(conn: &Connection, date: NaiveDate) -> CatalogResult<SongPlayCount> {
    conn.prepare_cached(
        "SELECT song_id, SUM(play_count) AS total
         FROM play
         WHERE date = ?1
         GROUP BY song_id
         ORDER BY total DESC, song_id ASC
         LIMIT 1",
    )?
    .query_row(params![date_key(date)], |r| {
        Ok(SongPlayCount {
            song_id: r.get(0)?,
            play_count: r.get(1)?,
        })
    })
    .optional()?
    .ok_or_else(|| CatalogError::NotFound(format!("no plays on {}", date)))
}

fn category_rank(source: &PlaySource) -> usize {
    match source {
        PlaySource::Playlist(_) => 0,
        PlaySource::Album(_) => 1,
        PlaySource::Direct => 2,
    }
}

fn source_id(source: &PlaySource) -> Option<&CatalogId> {
    source.playlist_id().or_else(|| source.album_id())
}

/// The source (playlist, album or direct) that brought the most plays of a
/// song on a day.
///
/// The best row of each category is found first (ties to the lower source
/// id), then the best category wins, ties going to playlist, album and
/// direct in that order.
pub fn top_source_for_song(
    conn: &Connection,
    song_id: &CatalogId,
    date: NaiveDate,
) -> CatalogResult<TopSource> {
    let rows = conn
        .prepare_cached(
            "SELECT playlist_id, album_id, play_count
             FROM play
             WHERE song_id = ?1 AND date = ?2",
        )?
        .query_map(params![song_id, date_key(date)], |r| {
            let playlist_id: Option<CatalogId> = r.get(0)?;
            let album_id: Option<CatalogId> = r.get(1)?;
            let source = match (playlist_id, album_id) {
                (Some(id), _) => PlaySource::Playlist(id),
                (None, Some(id)) => PlaySource::Album(id),
                (None, None) => PlaySource::Direct,
            };
            Ok(TopSource {
                source,
                play_count: r.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut best_per_category: [Option<TopSource>; 3] = [None, None, None];
    for row in rows {
        let slot = &mut best_per_category[category_rank(&row.source)];
        let replace = match slot {
            None => true,
            Some(best) => {
                row.play_count > best.play_count
                    || (row.play_count == best.play_count
                        && source_id(&row.source) < source_id(&best.source))
            }
        };
        if replace {
            *slot = Some(row);
        }
    }

    best_per_category
        .into_iter()
        .flatten()
        .fold(None, |winner: Option<TopSource>, candidate| match winner {
            Some(current) if current.play_count >= candidate.play_count => Some(current),
            _ => Some(candidate),
        })
        .ok_or_else(|| {
            CatalogError::NotFound(format!("no plays of song {} on {}", song_id, date))
        })
}

/// The country whose artists drew the most plays on a day.
///
/// A play counts once for each distinct country among the song's credited
/// artists, so co-credited artists from the same country don't inflate it.
pub fn top_country_on_date(conn: &Connection, date: NaiveDate) -> CatalogResult<CountryPlayCount> {
    conn.prepare_cached(
        "SELECT sc.country, SUM(p.play_count) AS total
         FROM play p
         JOIN (
             SELECT DISTINCT c.song_id, a.country
             FROM song_artist c
             JOIN artist a ON a.artist_id = c.artist_id
             WHERE a.country IS NOT NULL
         ) sc ON sc.song_id = p.song_id
         WHERE p.date = ?1
         GROUP BY sc.country
         ORDER BY total DESC, sc.country ASC
         LIMIT 1",
    )?
    .query_row(params![date_key(date)], |r| {
        Ok(CountryPlayCount {
            country: r.get(0)?,
            play_count: r.get(1)?,
        })
    })
    .optional()?
    .ok_or_else(|| CatalogError::NotFound(format!("no plays attributable to a country on {}", date)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog_store::mutations::*;
    use crate::catalog_store::schema::CATALOG_VERSIONED_SCHEMAS;

    fn id(s: &str) -> CatalogId {
        CatalogId::from(s)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        CATALOG_VERSIONED_SCHEMAS[0].create(&conn).unwrap();
        conn
    }

    fn artist(conn: &Connection, artist_id: &str, country: Option<&str>) {
        insert_artist(
            conn,
            &Artist {
                artist_id: id(artist_id),
                artist_name: artist_id.to_uppercase(),
                country: country.map(str::to_string),
            },
        )
        .unwrap();
    }

    fn song(conn: &Connection, song_id: &str, length: f64, artists: &[&str]) {
        insert_song(
            conn,
            &NewSong {
                song: Song {
                    song_id: id(song_id),
                    song_name: song_id.to_lowercase(),
                    length,
                },
                artist_ids: artists.iter().map(|a| id(a)).collect(),
            },
        )
        .unwrap();
    }

    fn album(conn: &Connection, album_id: &str, artists: &[&str], songs: &[&str]) {
        insert_album(
            conn,
            &NewAlbum {
                album: Album {
                    album_id: id(album_id),
                    album_name: album_id.to_lowercase(),
                    release_year: 2010,
                },
                artist_ids: artists.iter().map(|a| id(a)).collect(),
                song_ids: songs.iter().map(|s| id(s)).collect(),
            },
        )
        .unwrap();
    }

    fn play(conn: &Connection, date: NaiveDate, song_id: &str, count: i64, source: PlaySource) {
        upsert_play(
            conn,
            &PlayEvent {
                date,
                song_id: id(song_id),
                play_count: count,
                source,
            },
        )
        .unwrap();
    }

    #[test]
    fn average_song_length_over_credited_songs() {
        let conn = test_conn();
        artist(&conn, "x", None);
        song(&conn, "S1", 100.0, &["x"]);
        song(&conn, "S2", 200.0, &["x", "y"]);
        song(&conn, "S3", 999.0, &["y"]);

        let avg = average_song_length(&conn, &id("x")).unwrap();
        assert_eq!(avg.artist_id, id("x"));
        assert_eq!(avg.avg_length, 150.0);
    }

    #[test]
    fn average_song_length_not_found_without_songs() {
        let conn = test_conn();
        artist(&conn, "x", None);
        assert!(matches!(
            average_song_length(&conn, &id("x")),
            Err(CatalogError::NotFound(_))
        ));
        assert!(matches!(
            average_song_length(&conn, &id("missing")),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn count_singles_counts_songs_on_no_album() {
        let conn = test_conn();
        artist(&conn, "x", None);
        song(&conn, "S1", 100.0, &["x"]);
        song(&conn, "S2", 100.0, &["x"]);
        song(&conn, "S3", 100.0, &["x"]);
        album(&conn, "AL1", &["x"], &["S2"]);

        let singles = count_singles(&conn, &id("x")).unwrap();
        assert_eq!(singles.cnt_single, 2);

        album(&conn, "AL2", &["x"], &["S1", "S3"]);
        assert_eq!(count_singles(&conn, &id("x")).unwrap().cnt_single, 0);

        assert!(matches!(
            count_singles(&conn, &id("nobody")),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn top_artists_by_length_breaks_ties_by_id() {
        let conn = test_conn();
        for a in ["a", "b", "c"] {
            artist(&conn, a, None);
        }
        song(&conn, "S1", 300.0, &["c"]);
        song(&conn, "S2", 100.0, &["b"]);
        song(&conn, "S3", 200.0, &["b"]);
        song(&conn, "S4", 300.0, &["a"]);
        song(&conn, "S5", 10.0, &["ghost"]);

        let ranking = top_artists_by_length(&conn, 2).unwrap();
        let ids: Vec<_> = ranking.iter().map(|r| r.artist_id.clone()).collect();
        assert_eq!(ids, vec![id("a"), id("b")]);
        assert_eq!(ranking[0].total_length, 300.0);

        assert_eq!(top_artists_by_length(&conn, 10).unwrap().len(), 3);
        assert!(matches!(
            top_artists_by_length(&conn, 0),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn top_artists_by_length_not_found_on_empty_catalog() {
        let conn = test_conn();
        assert!(matches!(
            top_artists_by_length(&conn, 3),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn solo_albums_excludes_co_credited_and_foreign_tracks() {
        let conn = test_conn();
        song(&conn, "S1", 1.0, &["x"]);
        song(&conn, "S2", 1.0, &["x"]);
        song(&conn, "S3", 1.0, &["x", "y"]);
        song(&conn, "S4", 1.0, &["y"]);

        album(&conn, "A1", &["x"], &["S1", "S2"]); // solo
        album(&conn, "A2", &["x"], &["S1", "S3"]); // co-credited track
        album(&conn, "A3", &["x"], &["S4"]); // someone else's track
        album(&conn, "A4", &["x", "y"], &["S1"]); // two album artists
        album(&conn, "A0", &["y"], &["S4"]); // solo

        assert_eq!(solo_albums(&conn).unwrap(), vec![id("A0"), id("A1")]);
    }

    #[test]
    fn solo_albums_not_found_when_empty() {
        let conn = test_conn();
        song(&conn, "S1", 1.0, &["x", "y"]);
        album(&conn, "A1", &["x"], &["S1"]);
        assert!(matches!(solo_albums(&conn), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn top_song_sums_sources_and_breaks_ties_by_id() {
        let conn = test_conn();
        play(&conn, day(1), "S2", 3, PlaySource::Direct);
        play(&conn, day(1), "S2", 2, PlaySource::Album(id("AL1")));
        play(&conn, day(1), "S1", 5, PlaySource::Playlist(id("P1")));
        play(&conn, day(1), "S3", 4, PlaySource::Direct);
        play(&conn, day(2), "S3", 40, PlaySource::Direct);

        let top = top_song_on_date(&conn, day(1)).unwrap();
        assert_eq!(top.song_id, id("S1"));
        assert_eq!(top.play_count, 5);

        assert!(matches!(
            top_song_on_date(&conn, day(3)),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn top_source_picks_best_category_max() {
        let conn = test_conn();
        play(&conn, day(1), "S1", 3, PlaySource::Playlist(id("P1")));
        play(&conn, day(1), "S1", 5, PlaySource::Album(id("AL1")));
        play(&conn, day(1), "S1", 1, PlaySource::Direct);

        let top = top_source_for_song(&conn, &id("S1"), day(1)).unwrap();
        assert_eq!(top.source, PlaySource::Album(id("AL1")));
        assert_eq!(top.play_count, 5);
    }

    #[test]
    fn top_source_tie_breaks() {
        let conn = test_conn();
        play(&conn, day(1), "S1", 4, PlaySource::Album(id("AL2")));
        play(&conn, day(1), "S1", 4, PlaySource::Album(id("AL1")));
        play(&conn, day(1), "S1", 4, PlaySource::Direct);
        let top = top_source_for_song(&conn, &id("S1"), day(1)).unwrap();
        assert_eq!(top.source, PlaySource::Album(id("AL1")));

        play(&conn, day(1), "S1", 4, PlaySource::Playlist(id("P9")));
        let top = top_source_for_song(&conn, &id("S1"), day(1)).unwrap();
        assert_eq!(top.source, PlaySource::Playlist(id("P9")));
    }

    #[test]
    fn top_source_direct_play() {
        let conn = test_conn();
        play(&conn, day(1), "S1", 2, PlaySource::Direct);
        play(&conn, day(1), "S1", 2, PlaySource::Direct);
        let top = top_source_for_song(&conn, &id("S1"), day(1)).unwrap();
        assert_eq!(top.source, PlaySource::Direct);
        assert_eq!(top.play_count, 4);

        assert!(matches!(
            top_source_for_song(&conn, &id("S1"), day(2)),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn top_country_counts_same_country_co_credits_once() {
        let conn = test_conn();
        artist(&conn, "us1", Some("US"));
        artist(&conn, "us2", Some("US"));
        artist(&conn, "uk1", Some("UK"));
        song(&conn, "S1", 1.0, &["us1", "us2"]);
        song(&conn, "S2", 1.0, &["uk1"]);

        play(&conn, day(1), "S1", 10, PlaySource::Direct);
        play(&conn, day(1), "S2", 15, PlaySource::Direct);

        let top = top_country_on_date(&conn, day(1)).unwrap();
        assert_eq!(top.country, "UK");
        assert_eq!(top.play_count, 15);

        play(&conn, day(1), "S1", 6, PlaySource::Album(id("AL1")));
        let top = top_country_on_date(&conn, day(1)).unwrap();
        assert_eq!(top.country, "US");
        assert_eq!(top.play_count, 16);
    }

    #[test]
    fn top_country_credits_each_country_of_a_mixed_song() {
        let conn = test_conn();
        artist(&conn, "us1", Some("US"));
        artist(&conn, "us2", Some("US"));
        artist(&conn, "fr1", Some("FR"));
        song(&conn, "S1", 1.0, &["us1", "us2", "fr1"]);
        play(&conn, day(1), "S1", 7, PlaySource::Direct);

        // Both countries get 7, the tie goes to the lower name
        let top = top_country_on_date(&conn, day(1)).unwrap();
        assert_eq!(top.country, "FR");
        assert_eq!(top.play_count, 7);
    }

    #[test]
    fn top_country_not_found_without_plays() {
        let conn = test_conn();
        artist(&conn, "x", None);
        song(&conn, "S1", 1.0, &["x"]);
        assert!(matches!(
            top_country_on_date(&conn, day(1)),
            Err(CatalogError::NotFound(_))
        ));

        // Plays by artists without a country can't be attributed
        play(&conn, day(1), "S1", 3, PlaySource::Direct);
        assert!(matches!(
            top_country_on_date(&conn, day(1)),
            Err(CatalogError::NotFound(_))
        ));
    }
}

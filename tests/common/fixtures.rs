//! Test catalog seeding
//!
//! The catalog is built through the public HTTP API, so fixtures exercise the
//! same mutation paths the tests assert on.

use super::client::TestClient;
use super::constants::*;
use reqwest::StatusCode;
use serde_json::{json, Value};

async fn expect_created(response: reqwest::Response, what: &Value) {
    assert_eq!(
        response.status(),
        StatusCode::CREATED,
        "Seeding {} failed: {:?}",
        what,
        response.text().await
    );
}

/// Seeds 3 artists, 3 albums, 5 songs, 1 playlist and plays on `PLAY_DATE`.
///
/// Plays on `PLAY_DATE`:
/// - SONG_INTRO: 5 direct, 4 via the playlist, 3 via First Light (12 total)
/// - SONG_DUET: 7 via Together
/// - SONG_OTTO: 2 direct
pub async fn seed_catalog(client: &TestClient) {
    let artists = [
        json!({"artist_id": ARTIST_NINA_ID, "artist_name": ARTIST_NINA_NAME, "country": "US"}),
        json!({"artist_id": ARTIST_OTTO_ID, "artist_name": "Otto", "country": "DE"}),
        json!({"artist_id": ARTIST_LUZ_ID, "artist_name": "Luz", "country": "BR"}),
    ];
    for artist in artists {
        expect_created(client.add_artist(&artist).await, &artist).await;
    }

    let songs = [
        json!({"song_id": SONG_INTRO_ID, "song_name": "Intro", "length": 100, "artist_ids": [ARTIST_NINA_ID]}),
        json!({"song_id": SONG_ROAD_ID, "song_name": "Long Road", "length": 300, "artist_ids": [ARTIST_NINA_ID]}),
        json!({"song_id": SONG_DUET_ID, "song_name": "Duet", "length": 200, "artist_ids": [ARTIST_NINA_ID, ARTIST_OTTO_ID]}),
        json!({"song_id": SONG_OTTO_ID, "song_name": "Otto Theme", "length": 150, "artist_ids": [ARTIST_OTTO_ID]}),
        json!({"song_id": SONG_SINGLE_ID, "song_name": "Loose Single", "length": 120, "artist_ids": [ARTIST_NINA_ID]}),
    ];
    for song in songs {
        expect_created(client.add_song(&song).await, &song).await;
    }

    let albums = [
        json!({
            "album_id": ALBUM_FIRST_LIGHT_ID,
            "album_name": ALBUM_FIRST_LIGHT_NAME,
            "release_year": 2001,
            "artist_ids": [ARTIST_NINA_ID],
            "song_ids": [SONG_ROAD_ID, SONG_INTRO_ID]
        }),
        json!({
            "album_id": ALBUM_TOGETHER_ID,
            "album_name": "Together",
            "release_year": 2005,
            "artist_ids": [ARTIST_NINA_ID],
            "song_ids": [SONG_DUET_ID]
        }),
        json!({
            "album_id": ALBUM_OTTO_ALONE_ID,
            "album_name": "Otto Alone",
            "release_year": 2010,
            "artist_ids": [ARTIST_OTTO_ID],
            "song_ids": [SONG_OTTO_ID]
        }),
    ];
    for album in albums {
        expect_created(client.add_album(&album).await, &album).await;
    }

    let playlist = json!({
        "playlist_id": PLAYLIST_ROAD_TRIP_ID,
        "playlist_name": PLAYLIST_ROAD_TRIP_NAME,
        "author_name": "sam",
        "song_ids": [SONG_DUET_ID, SONG_INTRO_ID]
    });
    expect_created(client.add_playlist(&playlist).await, &playlist).await;

    let plays = [
        json!({"date": PLAY_DATE, "song_id": SONG_INTRO_ID, "play_count": 5}),
        json!({"date": PLAY_DATE, "song_id": SONG_INTRO_ID, "play_count": 4, "playlist_id": PLAYLIST_ROAD_TRIP_ID}),
        json!({"date": PLAY_DATE, "song_id": SONG_INTRO_ID, "play_count": 3, "album_id": ALBUM_FIRST_LIGHT_ID}),
        json!({"date": PLAY_DATE, "song_id": SONG_DUET_ID, "play_count": 7, "album_id": ALBUM_TOGETHER_ID}),
        json!({"date": PLAY_DATE, "song_id": SONG_OTTO_ID, "play_count": 2}),
    ];
    for play in plays {
        expect_created(client.add_play(&play).await, &play).await;
    }
}

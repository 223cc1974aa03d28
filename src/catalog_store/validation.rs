//! Parsing of mutation request bodies.
//!
//! Every body is turned into a typed insert payload before any write begins,
//! so a malformed request never leaves a partial mutation behind. JSON `null`
//! is treated the same as an absent key.

use super::error::{CatalogError, CatalogResult};
use super::models::*;
use chrono::NaiveDate;
use serde_json::{Map, Value};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `YYYY-MM-DD` date, reporting failures against `field`.
pub fn parse_date(field: &str, value: &str) -> CatalogResult<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| {
        CatalogError::invalid_value(field, format!("'{}' is not a YYYY-MM-DD date", value))
    })
}

struct Body<'a>(&'a Map<String, Value>);

impl<'a> Body<'a> {
    fn new(value: &'a Value) -> CatalogResult<Self> {
        value
            .as_object()
            .map(Body)
            .ok_or_else(|| CatalogError::type_mismatch("body", "a JSON object"))
    }

    fn get(&self, field: &str) -> Option<&'a Value> {
        self.0.get(field).filter(|v| !v.is_null())
    }

    fn required(&self, field: &str) -> CatalogResult<&'a Value> {
        self.get(field)
            .ok_or_else(|| CatalogError::MissingField(field.to_string()))
    }

    fn id(&self, field: &str) -> CatalogResult<CatalogId> {
        as_id(field, self.required(field)?)
    }

    fn optional_id(&self, field: &str) -> CatalogResult<Option<CatalogId>> {
        self.get(field).map(|v| as_id(field, v)).transpose()
    }

    fn string(&self, field: &str) -> CatalogResult<String> {
        as_string(field, self.required(field)?)
    }

    fn optional_string(&self, field: &str) -> CatalogResult<Option<String>> {
        self.get(field).map(|v| as_string(field, v)).transpose()
    }

    fn integer(&self, field: &str) -> CatalogResult<i64> {
        self.required(field)?
            .as_i64()
            .ok_or_else(|| CatalogError::type_mismatch(field, "an integer"))
    }

    fn number(&self, field: &str) -> CatalogResult<f64> {
        self.required(field)?
            .as_f64()
            .ok_or_else(|| CatalogError::type_mismatch(field, "a number"))
    }

    fn id_list(&self, field: &str) -> CatalogResult<Vec<CatalogId>> {
        let items = self
            .required(field)?
            .as_array()
            .ok_or_else(|| CatalogError::type_mismatch(field, "an array"))?;
        items.iter().map(|item| as_id(field, item)).collect()
    }
}

fn as_id(field: &str, value: &Value) -> CatalogResult<CatalogId> {
    match value {
        Value::String(s) => Ok(CatalogId::Text(s.clone())),
        Value::Number(n) => n
            .as_i64()
            .map(CatalogId::Int)
            .ok_or_else(|| CatalogError::type_mismatch(field, "a string or integer id")),
        _ => Err(CatalogError::type_mismatch(
            field,
            "a string or integer id",
        )),
    }
}

fn as_string(field: &str, value: &Value) -> CatalogResult<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| CatalogError::type_mismatch(field, "a string"))
}

pub fn parse_artist(body: &Value) -> CatalogResult<Artist> {
    let body = Body::new(body)?;
    Ok(Artist {
        artist_id: body.id("artist_id")?,
        artist_name: body.string("artist_name")?,
        country: body.optional_string("country")?,
    })
}

pub fn parse_album(body: &Value) -> CatalogResult<NewAlbum> {
    let body = Body::new(body)?;
    Ok(NewAlbum {
        album: Album {
            album_id: body.id("album_id")?,
            album_name: body.string("album_name")?,
            release_year: body.integer("release_year")?,
        },
        artist_ids: body.id_list("artist_ids")?,
        song_ids: body.id_list("song_ids")?,
    })
}

pub fn parse_song(body: &Value) -> CatalogResult<NewSong> {
    let body = Body::new(body)?;
    let length = body.number("length")?;
    if !length.is_finite() || length < 0.0 {
        return Err(CatalogError::invalid_value(
            "length",
            "must be a non-negative number of seconds",
        ));
    }
    Ok(NewSong {
        song: Song {
            song_id: body.id("song_id")?,
            song_name: body.string("song_name")?,
            length,
        },
        artist_ids: body.id_list("artist_ids")?,
    })
}

pub fn parse_playlist(body: &Value) -> CatalogResult<NewPlaylist> {
    let body = Body::new(body)?;
    Ok(NewPlaylist {
        playlist: Playlist {
            playlist_id: body.id("playlist_id")?,
            playlist_name: body.string("playlist_name")?,
            author_name: body.string("author_name")?,
        },
        song_ids: body.id_list("song_ids")?,
    })
}

pub fn parse_play(body: &Value) -> CatalogResult<PlayEvent> {
    let body = Body::new(body)?;

    let date = parse_date("date", &body.string("date")?)?;
    let song_id = body.id("song_id")?;
    let play_count = body.integer("play_count")?;
    if play_count < 0 {
        return Err(CatalogError::invalid_value(
            "play_count",
            "must not be negative",
        ));
    }

    let source = match (
        body.optional_id("playlist_id")?,
        body.optional_id("album_id")?,
    ) {
        (Some(_), Some(_)) => return Err(CatalogError::ConflictingSource),
        (Some(playlist_id), None) => PlaySource::Playlist(playlist_id),
        (None, Some(album_id)) => PlaySource::Album(album_id),
        (None, None) => PlaySource::Direct,
    };

    Ok(PlayEvent {
        date,
        song_id,
        play_count,
        source,
    })
}

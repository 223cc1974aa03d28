//! SQLite-backed catalog store.
//!
//! One write connection serializes every mutation; reads are spread over a
//! small pool of read-only connections. Each operation borrows exactly one
//! connection for its duration and hands it to the component functions in
//! `mutations`, `lookup`, `analytics` and `raw_query`.

use super::error::{CatalogError, CatalogResult};
use super::models::*;
use super::raw_query::{self, RawRow};
use super::schema::CATALOG_VERSIONED_SCHEMAS;
use super::trait_def::CatalogStore;
use super::{analytics, lookup, mutations, validation};
use crate::server::metrics;
use crate::sqlite_persistence::{VersionedSchema, BASE_DB_VERSION};
use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{info, warn};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SqliteCatalogStore {
    db_path: PathBuf,
    read_pool: Vec<Arc<Mutex<Connection>>>,
    write_conn: Arc<Mutex<Connection>>,
    read_index: Arc<AtomicUsize>,
}

fn latest_schema() -> &'static VersionedSchema {
    &CATALOG_VERSIONED_SCHEMAS[CATALOG_VERSIONED_SCHEMAS.len() - 1]
}

/// Creates the schema on an empty database, validates it otherwise.
fn prepare_schema(conn: &Connection) -> Result<()> {
    let schema = latest_schema();

    let table_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |r| r.get(0),
    )?;

    if table_count == 0 {
        info!("Creating catalog db schema at version {}", schema.version);
        schema.create(conn)?;
        return Ok(());
    }

    let db_version = conn.query_row("PRAGMA user_version", [], |r| r.get::<usize, i64>(0))?;
    let expected_version = (BASE_DB_VERSION + schema.version) as i64;
    if db_version != expected_version {
        bail!(
            "Catalog db is at version {}, expected {}",
            db_version - BASE_DB_VERSION as i64,
            schema.version
        );
    }

    schema
        .validate(conn)
        .context("Catalog db schema validation failed")
}

fn catalog_counts(conn: &Connection) -> CatalogResult<CatalogCounts> {
    let counts = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM artist),
                (SELECT COUNT(*) FROM album),
                (SELECT COUNT(*) FROM song),
                (SELECT COUNT(*) FROM playlist),
                (SELECT COALESCE(SUM(play_count), 0) FROM play)",
        [],
        |r| {
            Ok(CatalogCounts {
                artists: r.get(0)?,
                albums: r.get(1)?,
                songs: r.get(2)?,
                playlists: r.get(3)?,
                plays: r.get(4)?,
            })
        },
    )?;
    Ok(counts)
}

/// Republishes the item gauges after the catalog changed. A failure only
/// leaves the gauges stale.
fn refresh_item_gauges(conn: &Connection) {
    match catalog_counts(conn) {
        Ok(counts) => metrics::set_catalog_items(&counts),
        Err(err) => warn!("Could not refresh catalog item gauges: {}", err),
    }
}

fn lock(conn: &Mutex<Connection>) -> MutexGuard<'_, Connection> {
    conn.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SqliteCatalogStore {
    /// Opens (creating if needed) the catalog database at `db_path`.
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite database file
    /// * `read_pool_size` - Number of read-only connections, at least one is opened
    pub fn new<P: AsRef<Path>>(db_path: P, read_pool_size: usize) -> Result<Self> {
        let db_path = db_path.as_ref();

        let write_conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open catalog database {:?}", db_path))?;
        write_conn.busy_timeout(BUSY_TIMEOUT)?;

        prepare_schema(&write_conn)?;
        write_conn.pragma_update(None, "journal_mode", "WAL")?;

        let mut read_pool = Vec::with_capacity(read_pool_size.max(1));
        for _ in 0..read_pool_size.max(1) {
            let read_conn = Connection::open_with_flags(
                db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .context("Failed to open catalog read connection")?;
            read_conn.busy_timeout(BUSY_TIMEOUT)?;
            read_pool.push(Arc::new(Mutex::new(read_conn)));
        }

        let store = SqliteCatalogStore {
            db_path: db_path.to_path_buf(),
            read_pool,
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_index: Arc::new(AtomicUsize::new(0)),
        };

        let counts = store.get_counts()?;
        metrics::set_catalog_items(&counts);
        info!(
            "Opened catalog {:?}: {} artists, {} albums, {} songs, {} playlists",
            store.db_path, counts.artists, counts.albums, counts.songs, counts.playlists
        );

        Ok(store)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn timed<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce() -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let start = Instant::now();
        let result = f();
        metrics::record_catalog_operation(operation, start.elapsed());
        if let Err(err) = &result {
            metrics::record_catalog_error(operation, err.kind());
        }
        result
    }

    /// Runs `f` on the next read connection of the pool.
    fn read<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Connection) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        self.timed(operation, || {
            let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.read_pool.len();
            let conn = lock(&self.read_pool[index]);
            f(&conn)
        })
    }

    /// Runs `f` inside an immediate transaction on the write connection,
    /// committing on success and rolling back on any error.
    fn write<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Connection) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        self.timed(operation, || {
            let conn = lock(&self.write_conn);
            conn.execute("BEGIN IMMEDIATE", [])?;

            match f(&conn) {
                Ok(value) => match conn.execute("COMMIT", []) {
                    Ok(_) => {
                        refresh_item_gauges(&conn);
                        Ok(value)
                    }
                    Err(e) => {
                        let _ = conn.execute("ROLLBACK", []);
                        Err(e.into())
                    }
                },
                Err(e) => {
                    let _ = conn.execute("ROLLBACK", []);
                    Err(e)
                }
            }
        })
    }

    /// Parses the body first so that a bad request never opens a transaction.
    fn validated<T>(
        &self,
        operation: &'static str,
        body: &serde_json::Value,
        parse: fn(&serde_json::Value) -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        parse(body).inspect_err(|err| metrics::record_catalog_error(operation, err.kind()))
    }
}

impl CatalogStore for SqliteCatalogStore {
    // =========================================================================
    // Mutations
    // =========================================================================

    fn add_artist(&self, body: &serde_json::Value) -> CatalogResult<()> {
        let artist = self.validated("add_artist", body, validation::parse_artist)?;
        self.write("add_artist", |conn| mutations::insert_artist(conn, &artist))
    }

    fn add_album(&self, body: &serde_json::Value) -> CatalogResult<()> {
        let album = self.validated("add_album", body, validation::parse_album)?;
        self.write("add_album", |conn| mutations::insert_album(conn, &album))
    }

    fn add_song(&self, body: &serde_json::Value) -> CatalogResult<()> {
        let song = self.validated("add_song", body, validation::parse_song)?;
        self.write("add_song", |conn| mutations::insert_song(conn, &song))
    }

    fn add_playlist(&self, body: &serde_json::Value) -> CatalogResult<()> {
        let playlist = self.validated("add_playlist", body, validation::parse_playlist)?;
        self.write("add_playlist", |conn| {
            mutations::insert_playlist(conn, &playlist)
        })
    }

    fn add_play(&self, body: &serde_json::Value) -> CatalogResult<i64> {
        let play = self.validated("add_play", body, validation::parse_play)?;
        let total = self.write("add_play", |conn| mutations::upsert_play(conn, &play))?;
        metrics::record_plays_accumulated(play.play_count);
        Ok(total)
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    fn get_song(&self, song_id: &CatalogId) -> CatalogResult<SongDetails> {
        self.read("get_song", |conn| lookup::get_song(conn, song_id))
    }

    fn get_album(&self, album_id: &CatalogId) -> CatalogResult<AlbumDetails> {
        self.read("get_album", |conn| lookup::get_album(conn, album_id))
    }

    fn get_artist(&self, artist_id: &CatalogId) -> CatalogResult<Artist> {
        self.read("get_artist", |conn| lookup::get_artist(conn, artist_id))
    }

    fn get_playlist(&self, playlist_id: &CatalogId) -> CatalogResult<PlaylistDetails> {
        self.read("get_playlist", |conn| {
            lookup::get_playlist(conn, playlist_id)
        })
    }

    fn get_songs_by_album(&self, album_id: &CatalogId) -> CatalogResult<Vec<AlbumTrack>> {
        self.read("songs_by_album", |conn| {
            lookup::songs_by_album(conn, album_id)
        })
    }

    fn get_songs_by_artist(&self, artist_id: &CatalogId) -> CatalogResult<Vec<ArtistSong>> {
        self.read("songs_by_artist", |conn| {
            lookup::songs_by_artist(conn, artist_id)
        })
    }

    fn get_albums_by_artist(&self, artist_id: &CatalogId) -> CatalogResult<Vec<ArtistAlbum>> {
        self.read("albums_by_artist", |conn| {
            lookup::albums_by_artist(conn, artist_id)
        })
    }

    // =========================================================================
    // Analytics
    // =========================================================================

    fn average_song_length(&self, artist_id: &CatalogId) -> CatalogResult<ArtistAverageLength> {
        self.read("average_song_length", |conn| {
            analytics::average_song_length(conn, artist_id)
        })
    }

    fn count_singles(&self, artist_id: &CatalogId) -> CatalogResult<ArtistSingles> {
        self.read("count_singles", |conn| {
            analytics::count_singles(conn, artist_id)
        })
    }

    fn top_artists_by_length(&self, limit: u32) -> CatalogResult<Vec<ArtistTotalLength>> {
        self.read("top_artists_by_length", |conn| {
            analytics::top_artists_by_length(conn, limit)
        })
    }

    fn solo_albums(&self) -> CatalogResult<Vec<CatalogId>> {
        self.read("solo_albums", analytics::solo_albums)
    }

    fn top_song_on_date(&self, date: NaiveDate) -> CatalogResult<SongPlayCount> {
        self.read("top_song_on_date", |conn| {
            analytics::top_song_on_date(conn, date)
        })
    }

    fn top_source_for_song(
        &self,
        song_id: &CatalogId,
        date: NaiveDate,
    ) -> CatalogResult<TopSource> {
        self.read("top_source_for_song", |conn| {
            analytics::top_source_for_song(conn, song_id, date)
        })
    }

    fn top_country_on_date(&self, date: NaiveDate) -> CatalogResult<CountryPlayCount> {
        self.read("top_country_on_date", |conn| {
            analytics::top_country_on_date(conn, date)
        })
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    fn get_counts(&self) -> CatalogResult<CatalogCounts> {
        self.read("get_counts", catalog_counts)
    }

    fn run_query(&self, sql: &str) -> CatalogResult<Vec<RawRow>> {
        // Goes through the write connection since the statement may mutate
        self.timed("run_query", || {
            let conn = lock(&self.write_conn);
            let result = raw_query::run_query(&conn, sql);

            // Every mutation shares this connection, it must be back in
            // autocommit mode before the lock is released
            if !conn.is_autocommit() {
                warn!("Ad-hoc query left a transaction open, rolling it back");
                conn.execute("ROLLBACK", [])?;
                return Err(CatalogError::invalid_value(
                    "query",
                    "statements must not leave a transaction open",
                ));
            }

            if result.is_ok() {
                refresh_item_gauges(&conn);
            }
            result
        })
    }

    fn reset(&self) -> Result<()> {
        let schema = latest_schema();
        let conn = lock(&self.write_conn);
        conn.execute("BEGIN IMMEDIATE", [])?;

        let result = (|| -> Result<()> {
            schema.drop(&conn)?;
            schema.create(&conn)?;
            Ok(())
        })();

        match result {
            Ok(()) => {
                conn.execute("COMMIT", [])?;
                refresh_item_gauges(&conn);
                info!("Catalog db reset to an empty schema v{}", schema.version);
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }
}

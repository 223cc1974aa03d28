use anyhow::{Context, Result};
use std::time::{Duration, Instant};

use tracing::{error, info};

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{log_requests, metrics, state::*, ServerConfig};
use crate::catalog_store::{validation, CatalogError, CatalogId, CatalogResult};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub version: String,
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

#[derive(Deserialize, Debug)]
struct QueryBody {
    pub query: String,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

fn message_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            message: message.into(),
        }),
    )
        .into_response()
}

fn error_response(err: CatalogError) -> Response {
    match err {
        CatalogError::NotFound(_) => message_response(StatusCode::NOT_FOUND, err.to_string()),
        err if err.is_validation() => message_response(StatusCode::BAD_REQUEST, err.to_string()),
        err => {
            error!("Catalog store failure: {}", err);
            message_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

/// Wraps a single result the way the point lookups answer: `[ {...} ]`.
fn single<T: Serialize>(result: CatalogResult<T>) -> Response {
    match result {
        Ok(value) => Json(vec![value]).into_response(),
        Err(err) => error_response(err),
    }
}

fn many<T: Serialize>(result: CatalogResult<Vec<T>>) -> Response {
    match result {
        Ok(values) => Json(values).into_response(),
        Err(err) => error_response(err),
    }
}

fn created(result: CatalogResult<()>) -> Response {
    match result {
        Ok(()) => StatusCode::CREATED.into_response(),
        Err(err) => error_response(err),
    }
}

fn parse_path_date(value: &str) -> CatalogResult<NaiveDate> {
    validation::parse_date("date", value)
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        version: state.version.clone(),
    };
    Json(stats)
}

// =============================================================================
// Mutations
// =============================================================================

async fn post_artist(
    State(catalog_store): State<GuardedCatalogStore>,
    Json(body): Json<Value>,
) -> Response {
    created(catalog_store.add_artist(&body))
}

async fn post_album(
    State(catalog_store): State<GuardedCatalogStore>,
    Json(body): Json<Value>,
) -> Response {
    created(catalog_store.add_album(&body))
}

async fn post_song(
    State(catalog_store): State<GuardedCatalogStore>,
    Json(body): Json<Value>,
) -> Response {
    created(catalog_store.add_song(&body))
}

async fn post_playlist(
    State(catalog_store): State<GuardedCatalogStore>,
    Json(body): Json<Value>,
) -> Response {
    created(catalog_store.add_playlist(&body))
}

async fn post_playcount(
    State(catalog_store): State<GuardedCatalogStore>,
    Json(body): Json<Value>,
) -> Response {
    match catalog_store.add_play(&body) {
        Ok(play_count) => (
            StatusCode::CREATED,
            Json(serde_json::json!({ "play_count": play_count })),
        )
            .into_response(),
        Err(err) => error_response(err),
    }
}

// =============================================================================
// Lookups
// =============================================================================

async fn get_song(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    single(catalog_store.get_song(&CatalogId::from_path_segment(&id)))
}

async fn get_album(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    single(catalog_store.get_album(&CatalogId::from_path_segment(&id)))
}

async fn get_artist(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    single(catalog_store.get_artist(&CatalogId::from_path_segment(&id)))
}

async fn get_playlist(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    single(catalog_store.get_playlist(&CatalogId::from_path_segment(&id)))
}

async fn get_songs_by_album(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    many(catalog_store.get_songs_by_album(&CatalogId::from_path_segment(&id)))
}

async fn get_songs_by_artist(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    many(catalog_store.get_songs_by_artist(&CatalogId::from_path_segment(&id)))
}

async fn get_albums_by_artist(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    many(catalog_store.get_albums_by_artist(&CatalogId::from_path_segment(&id)))
}

// =============================================================================
// Analytics
// =============================================================================

async fn get_average_song_length(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    single(catalog_store.average_song_length(&CatalogId::from_path_segment(&id)))
}

async fn get_count_singles(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(id): Path<String>,
) -> Response {
    single(catalog_store.count_singles(&CatalogId::from_path_segment(&id)))
}

async fn get_top_artists_by_length(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(limit): Path<String>,
) -> Response {
    let limit = match limit.parse::<u32>() {
        Ok(limit) => limit,
        Err(_) => {
            return error_response(CatalogError::invalid_value(
                "n",
                format!("'{}' is not a non-negative integer", limit),
            ))
        }
    };
    many(catalog_store.top_artists_by_length(limit))
}

async fn get_solo_albums(State(catalog_store): State<GuardedCatalogStore>) -> Response {
    many(catalog_store.solo_albums())
}

async fn get_top_song_on_date(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(date): Path<String>,
) -> Response {
    single(parse_path_date(&date).and_then(|date| catalog_store.top_song_on_date(date)))
}

async fn get_top_source_for_song(
    State(catalog_store): State<GuardedCatalogStore>,
    Path((song_id, date)): Path<(String, String)>,
) -> Response {
    let song_id = CatalogId::from_path_segment(&song_id);
    single(
        parse_path_date(&date)
            .and_then(|date| catalog_store.top_source_for_song(&song_id, date)),
    )
}

async fn get_top_country_on_date(
    State(catalog_store): State<GuardedCatalogStore>,
    Path(date): Path<String>,
) -> Response {
    single(parse_path_date(&date).and_then(|date| catalog_store.top_country_on_date(date)))
}

// =============================================================================
// Debug
// =============================================================================

async fn post_debug_query(
    State(catalog_store): State<GuardedCatalogStore>,
    Json(body): Json<QueryBody>,
) -> Response {
    match catalog_store.run_query(&body.query) {
        Ok(rows) => Json(rows).into_response(),
        Err(CatalogError::Store(err)) => message_response(StatusCode::BAD_REQUEST, err.to_string()),
        Err(err) => error_response(err),
    }
}

async fn post_debug_reset(State(catalog_store): State<GuardedCatalogStore>) -> Response {
    match catalog_store.reset() {
        Ok(()) => message_response(StatusCode::OK, "Catalog reset"),
        Err(err) => {
            error!("Catalog reset failed: {:#}", err);
            message_response(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", err))
        }
    }
}

pub fn make_app(config: ServerConfig, catalog_store: GuardedCatalogStore) -> Router {
    let state = ServerState {
        config: config.clone(),
        start_time: Instant::now(),
        catalog_store,
        version: format!("{}-{}", env!("CARGO_PKG_VERSION"), env!("GIT_HASH")),
    };

    let mutation_routes: Router = Router::new()
        .route("/artist", post(post_artist))
        .route("/album", post(post_album))
        .route("/songs", post(post_song))
        .route("/playlists", post(post_playlist))
        .route("/playcount", post(post_playcount))
        .with_state(state.clone());

    let lookup_routes: Router = Router::new()
        .route("/songs/{id}", get(get_song))
        .route("/albums/{id}", get(get_album))
        .route("/artists/{id}", get(get_artist))
        .route("/playlists/{id}", get(get_playlist))
        .route("/songs/by_album/{id}", get(get_songs_by_album))
        .route("/songs/by_artist/{id}", get(get_songs_by_artist))
        .route("/albums/by_artist/{id}", get(get_albums_by_artist))
        .with_state(state.clone());

    let analytics_routes: Router = Router::new()
        .route("/artists/avg_song_length/{id}", get(get_average_song_length))
        .route("/artists/cnt_singles/{id}", get(get_count_singles))
        .route("/artists/top_length/{n}", get(get_top_artists_by_length))
        .route("/solo_albums", get(get_solo_albums))
        .route("/playcount/top_song/{date}", get(get_top_song_on_date))
        .route(
            "/playcount/top_source/{song_id}/{date}",
            get(get_top_source_for_song),
        )
        .route("/playcount/top_country/{date}", get(get_top_country_on_date))
        .with_state(state.clone());

    let mut app: Router = Router::new()
        .route("/", get(home))
        .with_state(state.clone())
        .merge(mutation_routes)
        .merge(lookup_routes)
        .nest("/analytics", analytics_routes);

    if config.enable_debug_routes {
        let debug_routes: Router = Router::new()
            .route("/query", post(post_debug_query))
            .route("/reset", post(post_debug_reset))
            .with_state(state.clone());
        app = app.nest("/debug", debug_routes);
    }

    app.layer(middleware::from_fn_with_state(state, log_requests))
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics::metrics_handler))
}

pub async fn run_server(config: ServerConfig, catalog_store: GuardedCatalogStore) -> Result<()> {
    let port = config.port;
    let metrics_port = config.metrics_port;
    let app = make_app(config, catalog_store);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;
    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;

    info!("Ready to serve at port {}!", port);
    info!("Metrics available at port {}!", metrics_port);

    tokio::select! {
        result = axum::serve(listener, app) => {
            info!("HTTP server stopped: {:?}", result);
            Ok(result?)
        }
        result = axum::serve(metrics_listener, make_metrics_app()) => {
            info!("Metrics server stopped: {:?}", result);
            Ok(result?)
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
            Ok(())
        }
    }
}

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    Json,
};
use common::{SearchHit, Song};
use tracing::debug;

use crate::state::{AppState, JsonResult, PlayResponse, SearchQuery};
use crate::utils::{catalog_error, clamp_limit, json_error};

const MAX_SEARCH_LIMIT: usize = 100;
const FEATURED_SIZE: usize = 6;
const SHELF_SIZE: usize = 4;

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> JsonResult<Vec<SearchHit>> {
    let default_limit = state.config.read().search_limit;
    let limit = clamp_limit(params.limit, default_limit, MAX_SEARCH_LIMIT);
    let mut hits = state.catalog.search(&params.query).map_err(catalog_error)?;
    debug!("Search {:?}: {} hits", params.query, hits.len());
    hits.truncate(limit);
    Ok(Json(hits))
}

pub async fn featured(State(state): State<AppState>) -> JsonResult<Vec<Song>> {
    sample(&state, FEATURED_SIZE)
}

pub async fn made_for_you(State(state): State<AppState>) -> JsonResult<Vec<Song>> {
    sample(&state, SHELF_SIZE)
}

pub async fn trending(State(state): State<AppState>) -> JsonResult<Vec<Song>> {
    sample(&state, SHELF_SIZE)
}

fn sample(state: &AppState, size: usize) -> JsonResult<Vec<Song>> {
    let songs = state.catalog.sample_songs(size).map_err(catalog_error)?;
    Ok(Json(songs))
}

pub async fn get_song(
    State(state): State<AppState>,
    AxumPath(song_id): AxumPath<String>,
) -> JsonResult<Song> {
    match state.catalog.get_song(&song_id).map_err(catalog_error)? {
        Some(song) => Ok(Json(song)),
        None => Err(json_error(StatusCode::NOT_FOUND, "song not found")),
    }
}

pub async fn record_play(
    State(state): State<AppState>,
    AxumPath(song_id): AxumPath<String>,
) -> JsonResult<PlayResponse> {
    let song = state
        .catalog
        .increment_play(&song_id)
        .map_err(catalog_error)?;
    Ok(Json(PlayResponse {
        success: true,
        message: "Play count updated",
        total_plays: song.plays.total,
        song,
    }))
}

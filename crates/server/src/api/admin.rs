use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    Extension, Json,
};
use common::{NewSong, Song};
use tracing::warn;

use crate::activity_store::{ActivityEntry, ActivityKind};
use crate::auth::{AuthError, UserRole};
use crate::state::{
    ActivityQuery, AdminStatsResponse, AppState, AuthContext, CreateUserRequest, HealthResponse,
    JsonResult, ListResponse, UserView,
};
use crate::utils::{catalog_error, json_error};

const DEFAULT_ACTIVITY_LIMIT: usize = 50;
const MAX_ACTIVITY_LIMIT: usize = 200;

pub async fn list_songs(State(state): State<AppState>) -> JsonResult<ListResponse<Song>> {
    let items = state.catalog.list_songs().map_err(catalog_error)?;
    let total = items.len();
    Ok(Json(ListResponse { items, total }))
}

pub async fn create_song(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<NewSong>,
) -> JsonResult<Song> {
    let song = state.catalog.create_song(payload).map_err(catalog_error)?;
    record(
        &state,
        ActivityKind::Catalog,
        &ctx,
        format!("Added song \"{}\" by {}", song.title, song.artist),
    );
    Ok(Json(song))
}

pub async fn delete_song(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    AxumPath(song_id): AxumPath<String>,
) -> JsonResult<HealthResponse> {
    let deleted = state.catalog.delete_song(&song_id).map_err(catalog_error)?;
    if !deleted {
        return Err(json_error(StatusCode::NOT_FOUND, "song not found"));
    }
    record(
        &state,
        ActivityKind::Catalog,
        &ctx,
        format!("Deleted song {}", song_id),
    );
    Ok(Json(HealthResponse { status: "ok" }))
}

pub async fn create_user(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<CreateUserRequest>,
) -> JsonResult<UserView> {
    let role = match payload.role.as_deref() {
        None => UserRole::User,
        Some(value) => UserRole::parse(value).ok_or_else(|| {
            json_error(StatusCode::BAD_REQUEST, "role must be admin or user")
        })?,
    };
    let user = match state
        .auth
        .create_user(&payload.username, &payload.password, role)
    {
        Ok(user) => user,
        Err(AuthError::UserExists) => {
            return Err(json_error(StatusCode::CONFLICT, "username already taken"))
        }
        Err(err @ (AuthError::InvalidUsername | AuthError::InvalidPassword)) => {
            return Err(json_error(StatusCode::BAD_REQUEST, err.to_string()))
        }
        Err(err) => {
            return Err(json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("auth error: {}", err),
            ))
        }
    };
    record(
        &state,
        ActivityKind::Users,
        &ctx,
        format!("Created user {}", user.username),
    );
    Ok(Json(user.into()))
}

pub async fn catalog_stats(State(state): State<AppState>) -> JsonResult<AdminStatsResponse> {
    let counts = state.catalog.counts().map_err(catalog_error)?;
    let total_users = state.auth.user_count().map_err(|err| {
        json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("auth error: {}", err),
        )
    })?;
    Ok(Json(AdminStatsResponse {
        total_songs: counts.songs,
        total_artists: counts.artists,
        total_users,
    }))
}

pub async fn list_activity(
    State(state): State<AppState>,
    Query(query): Query<ActivityQuery>,
) -> JsonResult<ListResponse<ActivityEntry>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let (items, total) = state
        .activity
        .list_events(limit, offset)
        .map_err(|err| json_error(StatusCode::INTERNAL_SERVER_ERROR, err))?;
    Ok(Json(ListResponse { items, total }))
}

fn record(state: &AppState, kind: ActivityKind, ctx: &AuthContext, message: String) {
    if let Err(err) = state.activity.add_event(kind, &ctx.user.username, message) {
        warn!("Failed to record activity: {}", err);
    }
}

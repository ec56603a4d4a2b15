pub mod admin;
pub mod auth;
pub mod songs;
pub mod stats;

use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};

use crate::auth::AuthUser;
use crate::state::{AppState, AuthContext, HealthResponse};
use crate::utils::{extract_token, json_error_response};

pub fn api_router(state: AppState) -> Router {
    let auth = Router::new()
        .route("/auth/setup", post(auth::auth_setup))
        .route("/auth/login", post(auth::auth_login))
        .route("/auth/logout", post(auth::auth_logout));

    let songs = Router::new()
        .route("/songs/search", get(songs::search))
        .route("/songs/featured", get(songs::featured))
        .route("/songs/made-for-you", get(songs::made_for_you))
        .route("/songs/trending", get(songs::trending))
        .route("/songs/:song_id", get(songs::get_song))
        .route("/songs/:song_id/play", post(songs::record_play));

    let rankings = Router::new()
        .route("/stats/top/:window", get(stats::top_by_window))
        .route("/stats/totals", get(stats::global_totals))
        .route("/stats/recent", get(stats::recently_played))
        .layer(middleware::from_fn_with_state(state.clone(), rankings_gate));

    let admin = Router::new()
        .route("/admin/songs", get(admin::list_songs).post(admin::create_song))
        .route("/admin/songs/:song_id", delete(admin::delete_song))
        .route("/admin/users", post(admin::create_user))
        .route("/admin/stats", get(admin::catalog_stats))
        .route("/admin/play-stats", get(stats::dashboard))
        .route("/admin/reset-stats", post(stats::reset_stats))
        .route("/admin/activity", get(admin::list_activity))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/health", get(health))
        .merge(auth)
        .merge(songs)
        .merge(rankings)
        .merge(admin)
        .with_state(state)
}

async fn require_admin(
    State(state): State<AppState>,
    mut req: axum::http::Request<Body>,
    next: Next,
) -> Response {
    match admin_from_request(&state, &req) {
        Ok(user) => {
            req.extensions_mut().insert(AuthContext { user });
            next.run(req).await
        }
        Err(response) => response,
    }
}

/// Rankings are public unless the config says otherwise, then admin-only.
async fn rankings_gate(
    State(state): State<AppState>,
    mut req: axum::http::Request<Body>,
    next: Next,
) -> Response {
    let public = state.config.read().public_rankings;
    if public {
        return next.run(req).await;
    }
    match admin_from_request(&state, &req) {
        Ok(user) => {
            req.extensions_mut().insert(AuthContext { user });
            next.run(req).await
        }
        Err(response) => response,
    }
}

fn admin_from_request(
    state: &AppState,
    req: &axum::http::Request<Body>,
) -> Result<AuthUser, Response> {
    let token = match extract_token(req.headers()) {
        Some(token) => token,
        None => return Err(json_error_response(StatusCode::UNAUTHORIZED, "unauthorized")),
    };
    match state.auth.user_from_token(&token) {
        Ok(Some(user)) if user.is_admin() => Ok(user),
        Ok(Some(_)) => Err(json_error_response(
            StatusCode::FORBIDDEN,
            "admin access required",
        )),
        Ok(None) => Err(json_error_response(StatusCode::UNAUTHORIZED, "unauthorized")),
        Err(err) => Err(json_error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("auth error: {}", err),
        )),
    }
}

async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

#[cfg(test)]
mod tests;

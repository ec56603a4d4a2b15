use axum::{
    extract::{Path as AxumPath, Query, State},
    Extension, Json,
};
use common::{PlayDashboard, PlayTotals, PlayWindow, RecentSong, SongSummary};
use tracing::{info, warn};

use crate::activity_store::ActivityKind;
use crate::state::{AppState, AuthContext, JsonResult, LimitQuery, ResetRequest, ResetResponse};
use crate::utils::{catalog_error, clamp_limit};

const MAX_RANKING_LIMIT: usize = 100;

pub async fn top_by_window(
    State(state): State<AppState>,
    AxumPath(window): AxumPath<String>,
    Query(query): Query<LimitQuery>,
) -> JsonResult<Vec<SongSummary>> {
    let window: PlayWindow = window
        .parse()
        .map_err(|err: common::UnknownWindow| catalog_error(err.into()))?;
    let limit = clamp_limit(query.limit, catalog::DEFAULT_DASHBOARD_LIMIT, MAX_RANKING_LIMIT);
    let items = state
        .catalog
        .top_by_window(window, limit)
        .map_err(catalog_error)?;
    Ok(Json(items))
}

pub async fn global_totals(State(state): State<AppState>) -> JsonResult<PlayTotals> {
    let totals = state.catalog.global_totals().map_err(catalog_error)?;
    Ok(Json(totals))
}

pub async fn recently_played(
    State(state): State<AppState>,
    Query(query): Query<LimitQuery>,
) -> JsonResult<Vec<RecentSong>> {
    let limit = clamp_limit(query.limit, catalog::DEFAULT_DASHBOARD_LIMIT, MAX_RANKING_LIMIT);
    let items = state
        .catalog
        .recently_played(limit)
        .map_err(catalog_error)?;
    Ok(Json(items))
}

pub async fn dashboard(State(state): State<AppState>) -> JsonResult<PlayDashboard> {
    let limit = state.config.read().dashboard_limit;
    let dashboard = state.catalog.dashboard(limit).map_err(catalog_error)?;
    Ok(Json(dashboard))
}

pub async fn reset_stats(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<ResetRequest>,
) -> JsonResult<ResetResponse> {
    let outcome = state
        .catalog
        .reset_window_named(&payload.period)
        .map_err(catalog_error)?;
    info!(
        "{} reset {} plays ({} songs)",
        ctx.user.username, outcome.window, outcome.matched
    );
    if let Err(err) = state.activity.add_event(
        ActivityKind::Reset,
        &ctx.user.username,
        format!(
            "Reset {} plays on {} songs ({} changed)",
            outcome.window, outcome.matched, outcome.modified
        ),
    ) {
        warn!("Failed to record reset activity: {}", err);
    }
    Ok(Json(ResetResponse {
        success: true,
        message: format!("Reset {} play stats successfully", outcome.window),
        outcome,
    }))
}

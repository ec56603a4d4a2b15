use std::sync::Arc;

use axum::http::StatusCode;
use axum::Json;
use catalog::Catalog;
use common::{ResetOutcome, Song};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::activity_store::ActivityStore;
use crate::auth::{AuthStore, AuthUser};
use crate::config::ServerConfig;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub auth: AuthStore,
    pub activity: ActivityStore,
    pub config: Arc<RwLock<ServerConfig>>,
}

#[derive(Clone)]
pub struct AuthContext {
    pub user: AuthUser,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: u64,
    pub token_type: &'static str,
}

#[derive(Deserialize)]
pub struct SetupRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: Option<String>,
}

#[derive(Serialize)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub role: crate::auth::UserRole,
}

impl From<AuthUser> for UserView {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    pub period: String,
}

#[derive(Serialize)]
pub struct ResetResponse {
    pub success: bool,
    pub message: String,
    #[serde(flatten)]
    pub outcome: ResetOutcome,
}

#[derive(Serialize)]
pub struct PlayResponse {
    pub success: bool,
    pub message: &'static str,
    pub total_plays: u64,
    pub song: Song,
}

#[derive(Serialize)]
pub struct AdminStatsResponse {
    pub total_songs: u64,
    pub total_artists: u64,
    pub total_users: u64,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type JsonResult<T> = Result<Json<T>, ApiError>;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use catalog::Catalog;
use common::NewSong;
use parking_lot::RwLock;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use super::api_router;
use crate::activity_store::ActivityStore;
use crate::auth::{AuthStore, UserRole};
use crate::config::ServerConfig;
use crate::state::AppState;

struct Harness {
    _dir: TempDir,
    state: AppState,
    app: Router,
}

impl Harness {
    fn new(config: ServerConfig) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let db = Catalog::open_db(&dir.path().join("catalog.redb")).unwrap();
        let catalog = Catalog::with_db(Arc::clone(&db));
        catalog.init_tables().unwrap();
        let auth = AuthStore::new(Arc::clone(&db), Duration::from_secs(3600));
        auth.init_tables().unwrap();
        let activity = ActivityStore::new(Arc::clone(&db));
        activity.init_tables().unwrap();
        let state = AppState {
            catalog,
            auth,
            activity,
            config: Arc::new(RwLock::new(config)),
        };
        let app = Router::new().nest("/api/v1", api_router(state.clone()));
        Self {
            _dir: dir,
            state,
            app,
        }
    }

    fn token_for(&self, username: &str, role: UserRole) -> String {
        let user = self.state.auth.create_user(username, "pw", role).unwrap();
        self.state.auth.create_session(&user.id).unwrap().token
    }

    fn add_song(&self, title: &str, artist: &str) -> String {
        self.state
            .catalog
            .create_song(NewSong {
                title: title.to_string(),
                artist: artist.to_string(),
                image_url: "cover.jpg".to_string(),
                audio_url: "song.mp3".to_string(),
                duration_secs: 120,
                album_id: None,
            })
            .unwrap()
            .id
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

#[tokio::test]
async fn play_route_counts_and_reports_missing_songs() {
    let harness = Harness::new(ServerConfig::default());
    let id = harness.add_song("Blue Moon", "A");

    let uri = format!("/api/v1/songs/{}/play", id);
    harness.send("POST", &uri, None, None).await;
    let (status, body) = harness.send("POST", &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_plays"], 2);
    assert_eq!(body["song"]["plays"]["weekly"], 2);

    let (status, body) = harness
        .send("POST", "/api/v1/songs/missing/play", None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "song not found");
}

#[tokio::test]
async fn admin_routes_need_an_admin_session() {
    let harness = Harness::new(ServerConfig::default());
    let user = harness.token_for("listener", UserRole::User);
    let admin = harness.token_for("root", UserRole::Admin);

    let (status, _) = harness.send("GET", "/api/v1/admin/play-stats", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = harness
        .send("GET", "/api/v1/admin/play-stats", Some("bogus"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = harness
        .send("GET", "/api/v1/admin/play-stats", Some(&user), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = harness
        .send("GET", "/api/v1/admin/play-stats", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totals"]["total_plays"], 0);
    assert_eq!(body["top_songs"], json!([]));
}

#[tokio::test]
async fn dashboard_reflects_plays() {
    let harness = Harness::new(ServerConfig::default());
    let admin = harness.token_for("root", UserRole::Admin);
    let quiet = harness.add_song("Quiet", "A");
    let loud = harness.add_song("Loud", "B");
    harness.add_song("Never", "C");
    for _ in 0..3 {
        harness.state.catalog.increment_play(&loud).unwrap();
    }
    harness.state.catalog.increment_play(&quiet).unwrap();

    let (status, body) = harness
        .send("GET", "/api/v1/admin/play-stats", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["top_songs"][0]["id"], loud.as_str());
    assert_eq!(body["top_songs"][0]["plays"], 3);
    assert_eq!(body["weekly_top_songs"].as_array().unwrap().len(), 3);
    assert_eq!(body["totals"]["yearly_plays"], 4);
    assert_eq!(body["recently_played"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn reset_validates_period_and_logs_activity() {
    let harness = Harness::new(ServerConfig::default());
    let admin = harness.token_for("root", UserRole::Admin);
    let id = harness.add_song("Blue Moon", "A");
    harness.state.catalog.increment_play(&id).unwrap();

    for period in ["daily", "total"] {
        let (status, _) = harness
            .send(
                "POST",
                "/api/v1/admin/reset-stats",
                Some(&admin),
                Some(json!({ "period": period })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "period {}", period);
    }

    let (status, body) = harness
        .send(
            "POST",
            "/api/v1/admin/reset-stats",
            Some(&admin),
            Some(json!({ "period": "weekly" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["window"], "weekly");
    assert_eq!(body["matched"], 1);

    let (_, totals) = harness.send("GET", "/api/v1/stats/totals", None, None).await;
    assert_eq!(totals["weekly_plays"], 0);
    assert_eq!(totals["total_plays"], 1);
    assert_eq!(totals["monthly_plays"], 1);

    let (status, activity) = harness
        .send("GET", "/api/v1/admin/activity", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(activity["total"], 1);
    assert_eq!(activity["items"][0]["kind"], "reset");
    assert_eq!(activity["items"][0]["actor"], "root");
}

#[tokio::test]
async fn search_requires_a_query() {
    let harness = Harness::new(ServerConfig::default());
    harness.add_song("Blue Moon", "A");
    harness.add_song("Moonlight", "B");
    harness.add_song("Sun", "C");

    let (status, _) = harness.send("GET", "/api/v1/songs/search", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = harness
        .send("GET", "/api/v1/songs/search?query=%20%20", None, None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = harness
        .send("GET", "/api/v1/songs/search?query=moon", None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|hit| hit["song"]["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Blue Moon", "Moonlight"]);
}

#[tokio::test]
async fn rankings_follow_public_flag() {
    let harness = Harness::new(ServerConfig {
        public_rankings: false,
        ..ServerConfig::default()
    });
    let admin = harness.token_for("root", UserRole::Admin);
    harness.add_song("Blue Moon", "A");

    let (status, _) = harness.send("GET", "/api/v1/stats/top/total", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = harness
        .send("GET", "/api/v1/stats/top/total?limit=3", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    let (status, _) = harness
        .send("GET", "/api/v1/stats/top/hourly", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, body) = harness
        .send("GET", "/api/v1/stats/recent", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn setup_then_login() {
    let harness = Harness::new(ServerConfig::default());
    let credentials = json!({ "username": "root", "password": "secret" });

    let (status, _) = harness
        .send("POST", "/api/v1/auth/login", None, Some(credentials.clone()))
        .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, body) = harness
        .send("POST", "/api/v1/auth/setup", None, Some(credentials.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "admin");
    let (status, _) = harness
        .send("POST", "/api/v1/auth/setup", None, Some(credentials.clone()))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = harness
        .send("POST", "/api/v1/auth/login", None, Some(credentials))
        .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["token"].as_str().unwrap().to_string();

    let (status, body) = harness
        .send(
            "POST",
            "/api/v1/admin/songs",
            Some(&token),
            Some(json!({
                "title": "Fresh",
                "artist": "Z",
                "image_url": "z.jpg",
                "audio_url": "z.mp3",
                "duration_secs": 99
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["plays"]["total"], 0);

    let (_, stats) = harness
        .send("GET", "/api/v1/admin/stats", Some(&token), None)
        .await;
    assert_eq!(stats["total_songs"], 1);
    assert_eq!(stats["total_users"], 1);

    let (status, _) = harness
        .send("POST", "/api/v1/auth/logout", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = harness
        .send("GET", "/api/v1/admin/stats", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

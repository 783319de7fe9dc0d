use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum_test::TestServer;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use medley_api::api::{create_router, AppState};
use medley_api::db::PreferenceStore;
use medley_api::error::{AppError, AppResult};
use medley_api::models::{MediaItem, MediaType, PreferenceRecord, SignalKind};
use medley_api::services::catalog::{CatalogProvider, Catalogs, TrendingWindow};
use medley_api::services::oracle::PromptOracle;

fn item(id: &str, title: &str, media_type: MediaType) -> MediaItem {
    MediaItem {
        id: id.to_string(),
        title: title.to_string(),
        cover: None,
        media_type,
        release_date: None,
        genres: vec!["Genre".to_string()],
        overview: None,
        platforms: Vec::new(),
        author: None,
        rating: None,
    }
}

/// Scripted catalog fake: every lookup answers from fixed tables.
#[derive(Default)]
struct StubCatalog {
    by_id: HashMap<String, MediaItem>,
    by_title: HashMap<String, MediaItem>,
    similar: HashMap<String, Vec<MediaItem>>,
    trending: Vec<MediaItem>,
}

#[async_trait::async_trait]
impl CatalogProvider for StubCatalog {
    async fn search_by_title(&self, title: &str) -> AppResult<Option<MediaItem>> {
        Ok(self.by_title.get(title).cloned())
    }

    async fn get_by_id(&self, id: &str) -> AppResult<MediaItem> {
        self.by_id
            .get(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("{} not in stub catalog", id)))
    }

    async fn get_similar(&self, id: &str, limit: usize) -> AppResult<Vec<MediaItem>> {
        Ok(self
            .similar
            .get(id)
            .map(|items| items.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_trending(
        &self,
        _window: TrendingWindow,
        limit: usize,
    ) -> AppResult<Vec<MediaItem>> {
        Ok(self.trending.iter().take(limit).cloned().collect())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Oracle fake: one canned completion, or an upstream failure.
struct StubOracle {
    completion: Option<String>,
}

impl StubOracle {
    fn answering(completion: &str) -> Self {
        Self {
            completion: Some(completion.to_string()),
        }
    }

    fn failing() -> Self {
        Self { completion: None }
    }
}

#[async_trait::async_trait]
impl PromptOracle for StubOracle {
    async fn complete(&self, _prompt: &str) -> AppResult<String> {
        self.completion
            .clone()
            .ok_or_else(|| AppError::Upstream("stub oracle offline".to_string()))
    }
}

/// In-memory preference store with the real store's contract.
#[derive(Default)]
struct MemoryPreferenceStore {
    records: Mutex<HashMap<String, PreferenceRecord>>,
}

#[async_trait::async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn get(&self, user_id: &str) -> AppResult<Option<PreferenceRecord>> {
        Ok(self.records.lock().await.get(user_id).cloned())
    }

    async fn put(&self, user_id: &str, record: &PreferenceRecord) -> AppResult<()> {
        self.records
            .lock()
            .await
            .insert(user_id.to_string(), record.clone());
        Ok(())
    }

    async fn append_if_new(
        &self,
        user_id: &str,
        kind: SignalKind,
        media_type: MediaType,
        media_id: &str,
    ) -> AppResult<bool> {
        let mut records = self.records.lock().await;
        let record = records.entry(user_id.to_string()).or_default();
        Ok(record.add(kind, media_type, media_id))
    }
}

struct TestHarness {
    movie: StubCatalog,
    tv: StubCatalog,
    game: StubCatalog,
    book: StubCatalog,
    oracle: StubOracle,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self {
            movie: StubCatalog::default(),
            tv: StubCatalog::default(),
            game: StubCatalog::default(),
            book: StubCatalog::default(),
            oracle: StubOracle::failing(),
        }
    }
}

impl TestHarness {
    fn into_server(self) -> TestServer {
        let catalogs = Catalogs::new(
            Arc::new(self.movie),
            Arc::new(self.tv),
            Arc::new(self.game),
            Arc::new(self.book),
        );
        let state = AppState::new(
            catalogs,
            Arc::new(self.oracle),
            Arc::new(MemoryPreferenceStore::default()),
            Duration::from_secs(2),
            Duration::from_secs(2),
        );
        TestServer::new(create_router(state)).unwrap()
    }
}

#[tokio::test]
async fn test_health_check() {
    let server = TestHarness::default().into_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_like_then_recommend_games() {
    let mut harness = TestHarness::default();
    harness.game.similar.insert(
        "g1".to_string(),
        vec![
            item("s1", "Native One", MediaType::Game),
            item("s2", "Native Two", MediaType::Game),
        ],
    );
    harness
        .game
        .by_id
        .insert("g1".to_string(), item("g1", "Liked Game", MediaType::Game));
    harness.game.by_title.insert(
        "Suggested Game".to_string(),
        item("o1", "Suggested Game", MediaType::Game),
    );
    harness.oracle = StubOracle::answering("```json\n[\"Suggested Game\"]\n```");
    let server = harness.into_server();

    let response = server
        .post("/api/likes")
        .json(&json!({
            "user_id": "u1",
            "media_type": "game",
            "media_id": "g1"
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["added"], true);

    let response = server
        .post("/api/recommendations")
        .json(&json!({
            "user_id": "u1",
            "media_type": "game"
        }))
        .await;
    response.assert_status_ok();

    let items: Vec<Value> = response.json();
    let ids: Vec<&str> = items.iter().map(|i| i["id"].as_str().unwrap()).collect();
    // Catalog-native suggestions first, oracle-derived after
    assert_eq!(ids, vec!["s1", "s2", "o1"]);
    assert!(items.iter().all(|i| i["mediaType"] == "game"));
}

#[tokio::test]
async fn test_recommend_without_signal_is_not_found() {
    let server = TestHarness::default().into_server();

    let response = server
        .post("/api/recommendations")
        .json(&json!({
            "user_id": "nobody",
            "media_type": "game"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NoSignal");
    assert!(body["message"].as_str().unwrap().contains("liked"));
}

#[tokio::test]
async fn test_recommend_defaults_to_movie() {
    // The user has liked a game, but the request names no media type, so
    // the movie strategy runs and finds no signal.
    let server = TestHarness::default().into_server();

    server
        .post("/api/likes")
        .json(&json!({
            "user_id": "u1",
            "media_type": "game",
            "media_id": "g1"
        }))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/recommendations")
        .json(&json!({"user_id": "u1"}))
        .await;

    response.assert_status(axum::http::StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NoSignal");
}

#[tokio::test]
async fn test_movie_oracle_failure_maps_to_bad_gateway() {
    let mut harness = TestHarness::default();
    harness
        .movie
        .by_id
        .insert("m1".to_string(), item("m1", "Liked Movie", MediaType::Movie));
    harness.oracle = StubOracle::failing();
    let server = harness.into_server();

    server
        .post("/api/likes")
        .json(&json!({
            "user_id": "u1",
            "media_type": "movie",
            "media_id": "m1"
        }))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/recommendations")
        .json(&json!({"user_id": "u1", "media_type": "movie"}))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
    let body: Value = response.json();
    assert_eq!(body["code"], "UpstreamUnavailable");
}

#[tokio::test]
async fn test_multi_view_always_has_all_four_types() {
    let mut harness = TestHarness::default();
    harness.movie.trending = vec![
        item("m1", "Movie One", MediaType::Movie),
        item("m2", "Movie Two", MediaType::Movie),
        item("m3", "Movie Three", MediaType::Movie),
    ];
    harness.tv.trending = vec![item("t1", "Show One", MediaType::Tv)];
    harness.game.trending = vec![
        item("g1", "Game One", MediaType::Game),
        item("g2", "Game Two", MediaType::Game),
    ];
    // Book catalog yields nothing at all: the static fallback takes over
    let server = harness.into_server();

    let response = server
        .post("/api/recommendations/multi")
        .json(&json!({"user_id": "fresh-user"}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    for key in ["movie", "tv", "game", "book"] {
        assert!(body.get(key).is_some(), "missing {} entry", key);
    }
    assert_eq!(body["movie"].as_array().unwrap().len(), 3);
    assert_eq!(body["tv"].as_array().unwrap().len(), 1);
    assert_eq!(body["game"].as_array().unwrap().len(), 2);

    let books = body["book"].as_array().unwrap();
    assert_eq!(books.len(), 3);
    assert_eq!(books[0]["title"], "Pride and Prejudice");
}

#[tokio::test]
async fn test_like_is_idempotent_over_http() {
    let server = TestHarness::default().into_server();

    let first = server
        .post("/api/likes")
        .json(&json!({
            "user_id": "u1",
            "media_type": "game",
            "media_id": "g1"
        }))
        .await;
    first.assert_status_ok();
    let body: Value = first.json();
    assert_eq!(body["added"], true);

    let second = server
        .post("/api/likes")
        .json(&json!({
            "user_id": "u1",
            "media_type": "game",
            "media_id": "g1"
        }))
        .await;
    second.assert_status_ok();
    let body: Value = second.json();
    assert_eq!(body["added"], false);

    let prefs = server.get("/api/preferences/u1").await;
    prefs.assert_status_ok();
    let record: Value = prefs.json();
    assert_eq!(record["liked"]["game"], json!(["g1"]));
}

#[tokio::test]
async fn test_unlike_missing_reports_nothing_removed() {
    let server = TestHarness::default().into_server();

    let response = server
        .delete("/api/likes")
        .json(&json!({
            "user_id": "u1",
            "media_type": "movie",
            "media_id": "never-liked"
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["removed"], false);
}

#[tokio::test]
async fn test_dislike_and_undislike_round_trip() {
    let server = TestHarness::default().into_server();

    server
        .post("/api/dislikes")
        .json(&json!({
            "user_id": "u1",
            "media_type": "tv",
            "media_id": "t9"
        }))
        .await
        .assert_status_ok();

    let response = server
        .delete("/api/dislikes")
        .json(&json!({
            "user_id": "u1",
            "media_type": "tv",
            "media_id": "t9"
        }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["removed"], true);

    let prefs = server.get("/api/preferences/u1").await;
    let record: Value = prefs.json();
    assert_eq!(record["disliked"]["tv"], json!([]));
}

#[tokio::test]
async fn test_trending_endpoint() {
    let mut harness = TestHarness::default();
    harness.game.trending = (1..=5)
        .map(|i| item(&format!("g{}", i), &format!("Game {}", i), MediaType::Game))
        .collect();
    let server = harness.into_server();

    let response = server.get("/api/trending?media_type=game&limit=3").await;
    response.assert_status_ok();

    let items: Vec<Value> = response.json();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0]["id"], "g1");
}

#[tokio::test]
async fn test_blank_user_id_is_rejected() {
    let server = TestHarness::default().into_server();

    let response = server
        .post("/api/recommendations")
        .json(&json!({"user_id": "  "}))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "InvalidInput");
}

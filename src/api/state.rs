use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::db::{create_redis_client, Cache, PreferenceStore, RedisPreferenceStore};
use crate::services::aggregator::Aggregator;
use crate::services::catalog::{Catalogs, OpenLibraryCatalog, RawgCatalog, TmdbCatalog};
use crate::services::engine::RecommendationEngine;
use crate::services::oracle::{OpenRouterOracle, PromptOracle};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
    pub aggregator: Arc<Aggregator>,
    pub catalogs: Catalogs,
    pub preferences: Arc<dyn PreferenceStore>,
    pub request_timeout: Duration,
}

impl AppState {
    /// Wires the production adapters from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let redis_client = create_redis_client(&config.redis_url)?;
        let cache = Cache::new(redis_client.clone());

        let movie = Arc::new(TmdbCatalog::movies(
            cache.clone(),
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_language.clone(),
        ));
        let tv = Arc::new(TmdbCatalog::series(
            cache.clone(),
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_language.clone(),
        ));
        let game = Arc::new(RawgCatalog::new(
            cache.clone(),
            config.rawg_api_key.clone(),
            config.rawg_api_url.clone(),
        ));
        let book = Arc::new(OpenLibraryCatalog::new(
            cache,
            config.openlibrary_api_url.clone(),
        ));
        let catalogs = Catalogs::new(movie, tv, game, book);

        let oracle: Arc<dyn PromptOracle> = Arc::new(OpenRouterOracle::new(
            config.openrouter_api_key.clone(),
            config.openrouter_api_url.clone(),
            config.oracle_model.clone(),
        ));
        let preferences: Arc<dyn PreferenceStore> =
            Arc::new(RedisPreferenceStore::new(redis_client));

        Ok(Self::new(
            catalogs,
            oracle,
            preferences,
            Duration::from_secs(config.per_type_timeout_secs),
            Duration::from_secs(config.request_timeout_secs),
        ))
    }

    /// Assembles state from injected adapters; tests swap in fakes here.
    pub fn new(
        catalogs: Catalogs,
        oracle: Arc<dyn PromptOracle>,
        preferences: Arc<dyn PreferenceStore>,
        per_type_timeout: Duration,
        request_timeout: Duration,
    ) -> Self {
        let engine = Arc::new(RecommendationEngine::new(
            &catalogs,
            oracle,
            preferences.clone(),
        ));
        let aggregator = Arc::new(Aggregator::new(
            engine.clone(),
            catalogs.clone(),
            per_type_timeout,
        ));

        Self {
            engine,
            aggregator,
            catalogs,
            preferences,
            request_timeout,
        }
    }
}

/// RAWG catalog provider (video games)
///
/// The only catalog with a native similar-items endpoint
/// (`/games/{id}/suggested`), which is why the game recommendation path can
/// lead with catalog signals before touching the oracle. Trending is the
/// most-added games of the current calendar year.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MediaItem, MediaType},
    services::catalog::{CatalogProvider, TrendingWindow},
};
use chrono::Datelike;
use reqwest::Client as HttpClient;
use reqwest::StatusCode;
use serde::Deserialize;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const DETAIL_CACHE_TTL: u64 = 86400; // 1 day
const SIMILAR_CACHE_TTL: u64 = 86400; // 1 day
const TRENDING_CACHE_TTL: u64 = 3600; // 1 hour
const TRENDING_ORDERING: &str = "-added";

/// A game as RAWG returns it from search, suggested and detail endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct RawgGame {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub background_image: Option<String>,
    #[serde(default)]
    pub released: Option<String>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub genres: Vec<RawgNamed>,
    #[serde(default)]
    pub platforms: Vec<RawgPlatformEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawgNamed {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawgPlatformEntry {
    pub platform: RawgNamed,
}

#[derive(Debug, Deserialize)]
struct RawgPage {
    #[serde(default)]
    results: Vec<RawgGame>,
}

impl From<RawgGame> for MediaItem {
    fn from(game: RawgGame) -> Self {
        MediaItem {
            id: game.id.to_string(),
            title: game.name,
            cover: game.background_image,
            media_type: MediaType::Game,
            release_date: game.released.filter(|d| !d.is_empty()),
            genres: game.genres.into_iter().map(|g| g.name).collect(),
            overview: None,
            platforms: game
                .platforms
                .into_iter()
                .map(|p| p.platform.name)
                .collect(),
            author: None,
            rating: game.rating,
        }
    }
}

#[derive(Clone)]
pub struct RawgCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl RawgCatalog {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            cache,
        }
    }

    async fn fetch_page(&self, url: &str, query: &[(&str, &str)]) -> AppResult<RawgPage> {
        let response = self.http_client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "RAWG API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for RawgCatalog {
    async fn search_by_title(&self, title: &str) -> AppResult<Option<MediaItem>> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search title cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Search(MediaType::Game, title.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let url = format!("{}/games", self.api_url);
                let page = self
                    .fetch_page(
                        &url,
                        &[("key", self.api_key.as_str()), ("search", title)],
                    )
                    .await?;

                let item = page.results.into_iter().next().map(MediaItem::from);

                tracing::debug!(
                    title = %title,
                    found = item.is_some(),
                    provider = "rawg",
                    "Title search completed"
                );

                Ok(item)
            }
        )
    }

    async fn get_by_id(&self, id: &str) -> AppResult<MediaItem> {
        cached!(
            self.cache,
            CacheKey::Detail(MediaType::Game, id.to_string()),
            DETAIL_CACHE_TTL,
            async move {
                let url = format!("{}/games/{}", self.api_url, id);
                let response = self
                    .http_client
                    .get(&url)
                    .query(&[("key", self.api_key.as_str())])
                    .send()
                    .await?;

                if response.status() == StatusCode::NOT_FOUND {
                    return Err(AppError::NotFound(format!(
                        "game {} does not exist upstream",
                        id
                    )));
                }

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::Upstream(format!(
                        "RAWG API returned status {}: {}",
                        status, body
                    )));
                }

                let game: RawgGame = response.json().await?;
                Ok(MediaItem::from(game))
            }
        )
    }

    async fn get_similar(&self, id: &str, limit: usize) -> AppResult<Vec<MediaItem>> {
        cached!(
            self.cache,
            CacheKey::Similar(MediaType::Game, id.to_string(), limit),
            SIMILAR_CACHE_TTL,
            async move {
                let url = format!("{}/games/{}/suggested", self.api_url, id);
                let page_size = limit.to_string();
                let page = self
                    .fetch_page(
                        &url,
                        &[
                            ("key", self.api_key.as_str()),
                            ("page_size", page_size.as_str()),
                        ],
                    )
                    .await?;

                let items: Vec<MediaItem> =
                    page.results.into_iter().map(MediaItem::from).collect();

                tracing::debug!(
                    game_id = %id,
                    results = items.len(),
                    provider = "rawg",
                    "Similar-games fetch completed"
                );

                Ok(items)
            }
        )
    }

    async fn get_trending(&self, window: TrendingWindow, limit: usize) -> AppResult<Vec<MediaItem>> {
        cached!(
            self.cache,
            CacheKey::Trending(MediaType::Game, window.as_str().to_string(), limit),
            TRENDING_CACHE_TTL,
            async move {
                let year = chrono::Utc::now().year();
                let dates = format!("{year}-01-01,{year}-12-31");
                let page_size = limit.to_string();

                let url = format!("{}/games", self.api_url);
                let page = self
                    .fetch_page(
                        &url,
                        &[
                            ("key", self.api_key.as_str()),
                            ("dates", dates.as_str()),
                            ("ordering", TRENDING_ORDERING),
                            ("page_size", page_size.as_str()),
                        ],
                    )
                    .await?;

                let items: Vec<MediaItem> =
                    page.results.into_iter().map(MediaItem::from).collect();

                tracing::info!(
                    results = items.len(),
                    provider = "rawg",
                    "Top-games fetch completed"
                );

                Ok(items)
            }
        )
    }

    fn name(&self) -> &'static str {
        "rawg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_deserialization_and_normalization() {
        let json = r#"{
            "id": 3498,
            "name": "Grand Theft Auto V",
            "background_image": "https://media.rawg.io/gta5.jpg",
            "released": "2013-09-17",
            "rating": 4.47,
            "genres": [{"name": "Action"}, {"name": "Adventure"}],
            "platforms": [
                {"platform": {"name": "PC"}},
                {"platform": {"name": "PlayStation 5"}}
            ]
        }"#;

        let game: RawgGame = serde_json::from_str(json).unwrap();
        let item = MediaItem::from(game);

        assert_eq!(item.id, "3498");
        assert_eq!(item.title, "Grand Theft Auto V");
        assert_eq!(item.media_type, MediaType::Game);
        assert_eq!(item.release_date.as_deref(), Some("2013-09-17"));
        assert_eq!(item.genres, vec!["Action", "Adventure"]);
        assert_eq!(item.platforms, vec!["PC", "PlayStation 5"]);
        assert_eq!(item.rating, Some(4.47));
        assert!(item.overview.is_none());
        assert!(item.author.is_none());
    }

    #[test]
    fn test_sparse_game_row_normalizes() {
        let game: RawgGame = serde_json::from_str(r#"{"id": 1, "name": "Obscure Indie"}"#).unwrap();
        let item = MediaItem::from(game);

        assert_eq!(item.id, "1");
        assert!(item.cover.is_none());
        assert!(item.release_date.is_none());
        assert!(item.genres.is_empty());
        assert!(item.platforms.is_empty());
    }
}

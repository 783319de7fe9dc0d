/// TMDB catalog provider (movies and TV series)
///
/// One instance serves exactly one media type; the movie and tv variants
/// share the struct and differ only in the path segment and which title /
/// date fields TMDB populates (`title`/`release_date` for movies,
/// `name`/`first_air_date` for series).
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{MediaItem, MediaType},
    services::catalog::{CatalogProvider, TrendingWindow},
};
use reqwest::Client as HttpClient;
use reqwest::StatusCode;
use serde::Deserialize;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const DETAIL_CACHE_TTL: u64 = 86400; // 1 day
const TRENDING_CACHE_TTL: u64 = 3600; // 1 hour
const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

/// A movie or tv row as TMDB returns it from search, trending and detail
/// endpoints. Search and trending rows carry no `genres`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbEntry {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TmdbPage {
    #[serde(default)]
    results: Vec<TmdbEntry>,
}

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    language: String,
    cache: Cache,
    media_type: MediaType,
}

impl TmdbCatalog {
    /// Movie-catalog view of TMDB
    pub fn movies(cache: Cache, api_key: String, api_url: String, language: String) -> Self {
        Self::for_media_type(cache, api_key, api_url, language, MediaType::Movie)
    }

    /// Series-catalog view of TMDB
    pub fn series(cache: Cache, api_key: String, api_url: String, language: String) -> Self {
        Self::for_media_type(cache, api_key, api_url, language, MediaType::Tv)
    }

    fn for_media_type(
        cache: Cache,
        api_key: String,
        api_url: String,
        language: String,
        media_type: MediaType,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            language,
            cache,
            media_type,
        }
    }

    /// TMDB path segment for this instance's media type
    fn path_kind(&self) -> &'static str {
        match self.media_type {
            MediaType::Tv => "tv",
            _ => "movie",
        }
    }

    /// Normalizes a TMDB row; rows without any usable title are dropped.
    fn normalize(&self, entry: TmdbEntry) -> Option<MediaItem> {
        let title = entry.title.or(entry.name).filter(|t| !t.is_empty())?;
        let release_date = entry
            .release_date
            .or(entry.first_air_date)
            .filter(|d| !d.is_empty());

        Some(MediaItem {
            id: entry.id.to_string(),
            title,
            cover: entry
                .poster_path
                .map(|path| format!("{}{}", IMAGE_BASE_URL, path)),
            media_type: self.media_type,
            release_date,
            genres: entry.genres.into_iter().map(|g| g.name).collect(),
            overview: entry.overview.filter(|o| !o.is_empty()),
            platforms: Vec::new(),
            author: None,
            rating: None,
        })
    }

    async fn fetch_page(&self, url: &str, query: &[(&str, &str)]) -> AppResult<TmdbPage> {
        let response = self.http_client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "TMDB API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbCatalog {
    async fn search_by_title(&self, title: &str) -> AppResult<Option<MediaItem>> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search title cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Search(self.media_type, title.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let url = format!("{}/search/{}", self.api_url, self.path_kind());
                let page = self
                    .fetch_page(
                        &url,
                        &[
                            ("api_key", self.api_key.as_str()),
                            ("language", self.language.as_str()),
                            ("query", title),
                        ],
                    )
                    .await?;

                let item = page
                    .results
                    .into_iter()
                    .find_map(|entry| self.normalize(entry));

                tracing::debug!(
                    title = %title,
                    found = item.is_some(),
                    provider = "tmdb",
                    media_type = %self.media_type,
                    "Title search completed"
                );

                Ok(item)
            }
        )
    }

    async fn get_by_id(&self, id: &str) -> AppResult<MediaItem> {
        cached!(
            self.cache,
            CacheKey::Detail(self.media_type, id.to_string()),
            DETAIL_CACHE_TTL,
            async move {
                let url = format!("{}/{}/{}", self.api_url, self.path_kind(), id);
                let response = self
                    .http_client
                    .get(&url)
                    .query(&[
                        ("api_key", self.api_key.as_str()),
                        ("language", self.language.as_str()),
                    ])
                    .send()
                    .await?;

                if response.status() == StatusCode::NOT_FOUND {
                    return Err(AppError::NotFound(format!(
                        "{} {} does not exist upstream",
                        self.media_type, id
                    )));
                }

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::Upstream(format!(
                        "TMDB API returned status {}: {}",
                        status, body
                    )));
                }

                let entry: TmdbEntry = response.json().await?;
                self.normalize(entry).ok_or_else(|| {
                    AppError::Upstream(format!("TMDB returned an untitled record for id {}", id))
                })
            }
        )
    }

    async fn get_trending(&self, window: TrendingWindow, limit: usize) -> AppResult<Vec<MediaItem>> {
        cached!(
            self.cache,
            CacheKey::Trending(self.media_type, window.as_str().to_string(), limit),
            TRENDING_CACHE_TTL,
            async move {
                let url = format!(
                    "{}/trending/{}/{}",
                    self.api_url,
                    self.path_kind(),
                    window.as_str()
                );
                let page = self
                    .fetch_page(
                        &url,
                        &[
                            ("api_key", self.api_key.as_str()),
                            ("language", self.language.as_str()),
                        ],
                    )
                    .await?;

                let items: Vec<MediaItem> = page
                    .results
                    .into_iter()
                    .filter_map(|entry| self.normalize(entry))
                    .take(limit)
                    .collect();

                tracing::info!(
                    results = items.len(),
                    provider = "tmdb",
                    media_type = %self.media_type,
                    window = window.as_str(),
                    "Trending fetch completed"
                );

                Ok(items)
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

/// OpenLibrary catalog provider (books)
///
/// No API key required. Ids are work OLIDs (the `/works/` key with the
/// prefix stripped). Author names on detail lookups live behind a second
/// request to the authors endpoint; when that fails the item simply has no
/// author. OpenLibrary has no trending endpoint, so trending is a plain
/// text search over a fixed list of generic queries.
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
const COVER_BASE_URL: &str = "https://covers.openlibrary.org/b/id";
const WORKS_PREFIX: &str = "/works/";

/// Queries tried in order when asked for "trending" books
const FILLER_QUERIES: [&str; 3] = ["classic literature", "bestseller", "award winning fiction"];

/// A document from the search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct BookDoc {
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub author_name: Vec<String>,
    #[serde(default)]
    pub first_publish_year: Option<i64>,
    #[serde(default)]
    pub cover_i: Option<i64>,
    #[serde(default)]
    pub subject: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    docs: Vec<BookDoc>,
}

/// A work record from `/works/{olid}.json`
#[derive(Debug, Clone, Deserialize)]
pub struct Work {
    pub title: String,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub covers: Vec<i64>,
    #[serde(default)]
    pub authors: Vec<WorkAuthorEntry>,
    #[serde(default)]
    pub first_publish_date: Option<String>,
    #[serde(default)]
    pub description: Option<WorkDescription>,
}

/// Work descriptions come back either as a bare string or a typed object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkDescription {
    Text(String),
    Typed { value: String },
}

impl WorkDescription {
    fn into_text(self) -> String {
        match self {
            WorkDescription::Text(text) => text,
            WorkDescription::Typed { value } => value,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkAuthorEntry {
    #[serde(default)]
    pub author: Option<KeyRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct KeyRef {
    pub key: String,
}

#[derive(Debug, Deserialize)]
struct AuthorRecord {
    name: String,
}

impl From<BookDoc> for MediaItem {
    fn from(doc: BookDoc) -> Self {
        let author = doc.author_name.into_iter().next();
        MediaItem {
            id: doc.key.replace(WORKS_PREFIX, ""),
            title: doc.title,
            cover: doc
                .cover_i
                .map(|cover| format!("{}/{}-M.jpg", COVER_BASE_URL, cover)),
            media_type: MediaType::Book,
            release_date: doc.first_publish_year.map(|year| year.to_string()),
            genres: doc.subject,
            overview: None,
            platforms: Vec::new(),
            author,
            rating: None,
        }
    }
}

#[derive(Clone)]
pub struct OpenLibraryCatalog {
    http_client: HttpClient,
    api_url: String,
    cache: Cache,
}

impl OpenLibraryCatalog {
    pub fn new(cache: Cache, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            cache,
        }
    }

    async fn search_docs(&self, query: &[(&str, &str)]) -> AppResult<Vec<BookDoc>> {
        let url = format!("{}/search.json", self.api_url);
        let response = self.http_client.get(&url).query(query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "OpenLibrary API returned status {}: {}",
                status, body
            )));
        }

        let search: SearchResponse = response.json().await?;
        Ok(search.docs)
    }

    /// Resolves an author name via the authors endpoint; absent on failure.
    async fn author_name(&self, author_key: &str) -> Option<String> {
        let url = format!("{}{}.json", self.api_url, author_key);
        let result: AppResult<AuthorRecord> = async {
            let response = self.http_client.get(&url).send().await?;
            if !response.status().is_success() {
                return Err(AppError::Upstream(format!(
                    "OpenLibrary authors endpoint returned status {}",
                    response.status()
                )));
            }
            Ok(response.json().await?)
        }
        .await;

        match result {
            Ok(record) => Some(record.name),
            Err(e) => {
                tracing::debug!(author_key = %author_key, error = %e, "Author lookup failed");
                None
            }
        }
    }

    fn normalize_work(&self, olid: &str, work: Work, author: Option<String>) -> MediaItem {
        MediaItem {
            id: olid.to_string(),
            title: work.title,
            cover: work
                .covers
                .first()
                .map(|cover| format!("{}/{}-M.jpg", COVER_BASE_URL, cover)),
            media_type: MediaType::Book,
            release_date: work.first_publish_date.filter(|d| !d.is_empty()),
            genres: work.subjects,
            overview: work.description.map(WorkDescription::into_text),
            platforms: Vec::new(),
            author,
            rating: None,
        }
    }
}

#[async_trait::async_trait]
impl CatalogProvider for OpenLibraryCatalog {
    async fn search_by_title(&self, title: &str) -> AppResult<Option<MediaItem>> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search title cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::Search(MediaType::Book, title.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let docs = self.search_docs(&[("q", title), ("limit", "5")]).await?;
                let item = docs.into_iter().next().map(MediaItem::from);

                tracing::debug!(
                    title = %title,
                    found = item.is_some(),
                    provider = "openlibrary",
                    "Title search completed"
                );

                Ok::<_, AppError>(item)
            }
        )
    }

    async fn get_by_id(&self, id: &str) -> AppResult<MediaItem> {
        cached!(
            self.cache,
            CacheKey::Detail(MediaType::Book, id.to_string()),
            DETAIL_CACHE_TTL,
            async move {
                let url = format!("{}{}{}.json", self.api_url, WORKS_PREFIX, id);
                let response = self.http_client.get(&url).send().await?;

                if response.status() == StatusCode::NOT_FOUND {
                    return Err(AppError::NotFound(format!(
                        "book {} does not exist upstream",
                        id
                    )));
                }

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::Upstream(format!(
                        "OpenLibrary API returned status {}: {}",
                        status, body
                    )));
                }

                let work: Work = response.json().await?;

                let author = match work
                    .authors
                    .first()
                    .and_then(|entry| entry.author.as_ref())
                {
                    Some(key_ref) => self.author_name(&key_ref.key).await,
                    None => None,
                };

                Ok(self.normalize_work(id, work, author))
            }
        )
    }

    async fn get_trending(&self, window: TrendingWindow, limit: usize) -> AppResult<Vec<MediaItem>> {
        cached!(
            self.cache,
            CacheKey::Trending(MediaType::Book, window.as_str().to_string(), limit),
            TRENDING_CACHE_TTL,
            async move {
                let limit_param = limit.to_string();

                for query in FILLER_QUERIES {
                    match self
                        .search_docs(&[("q", query), ("limit", limit_param.as_str())])
                        .await
                    {
                        Ok(docs) if !docs.is_empty() => {
                            let items: Vec<MediaItem> =
                                docs.into_iter().take(limit).map(MediaItem::from).collect();
                            return Ok(items);
                        }
                        Ok(_) => {
                            tracing::debug!(query = %query, "Filler query returned no books");
                        }
                        Err(e) => {
                            tracing::warn!(query = %query, error = %e, "Filler query failed, trying next");
                        }
                    }
                }

                Ok::<_, AppError>(Vec::new())
            }
        )
    }

    async fn search_by_author(&self, author: &str, limit: usize) -> AppResult<Vec<MediaItem>> {
        cached!(
            self.cache,
            CacheKey::AuthorSearch(author.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let limit_param = limit.to_string();
                let docs = self
                    .search_docs(&[("author", author), ("limit", limit_param.as_str())])
                    .await?;

                Ok(docs
                    .into_iter()
                    .take(limit)
                    .map(MediaItem::from)
                    .collect::<Vec<_>>())
            }
        )
    }

    async fn search_by_subject(&self, subject: &str, limit: usize) -> AppResult<Vec<MediaItem>> {
        cached!(
            self.cache,
            CacheKey::SubjectSearch(subject.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let limit_param = limit.to_string();
                let docs = self
                    .search_docs(&[("subject", subject), ("limit", limit_param.as_str())])
                    .await?;

                Ok(docs
                    .into_iter()
                    .take(limit)
                    .map(MediaItem::from)
                    .collect::<Vec<_>>())
            }
        )
    }

    fn name(&self) -> &'static str {
        "openlibrary"
    }
}

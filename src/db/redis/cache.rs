use redis::AsyncCommands;
use redis::Client;
use std::fmt::Display;

use crate::error::AppError;
use crate::error::AppResult;
use crate::models::MediaType;

/// Keys for cached upstream catalog responses
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Search(MediaType, String),
    Detail(MediaType, String),
    Similar(MediaType, String, usize),
    Trending(MediaType, String, usize),
    AuthorSearch(String),
    SubjectSearch(String),
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheKey::Search(media_type, query) => {
                write!(f, "search:{}:{}", media_type, query.to_lowercase())
            }
            CacheKey::Detail(media_type, id) => write!(f, "detail:{}:{}", media_type, id),
            CacheKey::Similar(media_type, id, limit) => {
                write!(f, "similar:{}:{}:{}", media_type, id, limit)
            }
            CacheKey::Trending(media_type, window, limit) => {
                write!(f, "trending:{}:{}:{}", media_type, window, limit)
            }
            CacheKey::AuthorSearch(author) => write!(f, "author:{}", author.to_lowercase()),
            CacheKey::SubjectSearch(subject) => write!(f, "subject:{}", subject.to_lowercase()),
        }
    }
}

/// Creates a Redis client shared by the cache and the preference store
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}

/// Read-through cache for upstream catalog responses.
///
/// Reads are on the request path and their failures propagate; writes are
/// advisory and only logged, so a flaky Redis degrades hit rate rather
/// than failing lookups that already have a value in hand.
#[derive(Clone)]
pub struct Cache {
    redis_client: Client,
}

impl Cache {
    pub fn new(redis_client: Client) -> Self {
        Self { redis_client }
    }

    /// Retrieves a cached value by key, `None` on miss.
    pub async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        key: &CacheKey,
    ) -> AppResult<Option<T>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let cached: Option<String> = conn.get(format!("{}", key)).await?;

        match cached {
            Some(json) => {
                let data = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(data))
            }
            None => Ok(None),
        }
    }

    /// Stores a value with a TTL. Failures are logged, never surfaced.
    pub async fn store<T: serde::Serialize>(&self, key: &CacheKey, value: &T, ttl: u64) {
        let json = match serde_json::to_string(value) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Cache serialization error");
                return;
            }
        };

        let result: AppResult<()> = async {
            let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
            let _: () = conn.set_ex(format!("{}", key), json, ttl).await?;
            Ok(())
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
        }
    }
}

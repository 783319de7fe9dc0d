use redis::AsyncCommands;
use redis::Client;
use tokio::sync::Mutex;

use crate::error::{AppError, AppResult};
use crate::models::{MediaType, PreferenceRecord, SignalKind, StoredPreferences};

/// Durable per-user preference records keyed by opaque user identifier.
///
/// `get` upgrades any legacy stored shape; `put` always persists the
/// current per-type shape. `append_if_new` is the alternate single-signal
/// persistence strategy: one atomic read-modify-write instead of a caller
/// driven read/mutate/replace cycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn get(&self, user_id: &str) -> AppResult<Option<PreferenceRecord>>;

    /// Full-record replace.
    async fn put(&self, user_id: &str, record: &PreferenceRecord) -> AppResult<()>;

    /// Atomically appends `media_id` to the bucket unless already present.
    /// Returns whether the id was newly appended.
    async fn append_if_new(
        &self,
        user_id: &str,
        kind: SignalKind,
        media_type: MediaType,
        media_id: &str,
    ) -> AppResult<bool>;
}

/// Redis-backed preference store. Records live forever (no TTL).
pub struct RedisPreferenceStore {
    redis_client: Client,
    // Serializes append_if_new read-modify-write cycles within this process
    write_lock: Mutex<()>,
}

impl RedisPreferenceStore {
    pub fn new(redis_client: Client) -> Self {
        Self {
            redis_client,
            write_lock: Mutex::new(()),
        }
    }

    fn storage_key(user_id: &str) -> String {
        format!("prefs:{}", user_id)
    }

    async fn read_record(&self, user_id: &str) -> AppResult<Option<PreferenceRecord>> {
        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let stored: Option<String> = conn.get(Self::storage_key(user_id)).await?;

        match stored {
            Some(json) => {
                let record: StoredPreferences = serde_json::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Preference record deserialization error: {}", e))
                })?;
                Ok(Some(record.upgrade()))
            }
            None => Ok(None),
        }
    }

    async fn write_record(&self, user_id: &str, record: &PreferenceRecord) -> AppResult<()> {
        let json = serde_json::to_string(record)
            .map_err(|e| AppError::Internal(format!("Preference record serialization error: {}", e)))?;

        let mut conn = self.redis_client.get_multiplexed_async_connection().await?;
        let _: () = conn.set(Self::storage_key(user_id), json).await?;

        tracing::debug!(user_id = %user_id, "Preference record persisted");

        Ok(())
    }
}

#[async_trait::async_trait]
impl PreferenceStore for RedisPreferenceStore {
    async fn get(&self, user_id: &str) -> AppResult<Option<PreferenceRecord>> {
        self.read_record(user_id).await
    }

    async fn put(&self, user_id: &str, record: &PreferenceRecord) -> AppResult<()> {
        self.write_record(user_id, record).await
    }

    async fn append_if_new(
        &self,
        user_id: &str,
        kind: SignalKind,
        media_type: MediaType,
        media_id: &str,
    ) -> AppResult<bool> {
        let _guard = self.write_lock.lock().await;

        let mut record = self.read_record(user_id).await?.unwrap_or_default();
        let added = record.add(kind, media_type, media_id);
        if added {
            self.write_record(user_id, &record).await?;
        }

        tracing::debug!(
            user_id = %user_id,
            media_type = %media_type,
            media_id = %media_id,
            bucket = kind.as_str(),
            added = added,
            "append_if_new completed"
        );

        Ok(added)
    }
}

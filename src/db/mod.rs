pub mod preferences;
pub mod redis;

pub use preferences::{PreferenceStore, RedisPreferenceStore};
pub use redis::create_redis_client;
pub use redis::Cache;
pub use redis::CacheKey;

/// Read-through caching for upstream catalog calls.
///
/// Checks the cache for `$key`; on a hit the cached value is returned, on a
/// miss `$block` is awaited, its value stored under `$key` with `$ttl`
/// seconds, and returned. Cache read errors propagate; write errors are
/// swallowed by [`Cache::store`](crate::db::Cache::store).
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache, CacheKey::Detail(MediaType::Game, id.into()), DETAIL_CACHE_TTL, async move {
///     self.fetch_game(id).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        if let Some(cached) = $cache.fetch(&key).await? {
            Ok(cached)
        } else {
            let value = { let __r: $crate::error::AppResult<_> = $block.await; __r }?;
            $cache.store(&key, &value, $ttl).await;
            Ok(value)
        }
    }};
}

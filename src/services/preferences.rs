use std::sync::Arc;

/// Like/dislike mutation operations
///
/// All four operations are idempotent: re-liking an already-liked id and
/// unliking an id that was never there both succeed and report that
/// nothing changed. The first signal for a user goes through the store's
/// atomic append; later mutations read the whole record, upgrade any
/// legacy shape in the process, and replace it.
use crate::{
    db::PreferenceStore,
    error::AppResult,
    models::{MediaType, SignalKind},
};

/// Records a like or dislike. Returns whether the id was newly added.
pub async fn record_signal(
    store: &Arc<dyn PreferenceStore>,
    user_id: &str,
    kind: SignalKind,
    media_type: MediaType,
    media_id: &str,
) -> AppResult<bool> {
    let added = match store.get(user_id).await? {
        None => {
            store
                .append_if_new(user_id, kind, media_type, media_id)
                .await?
        }
        Some(mut record) => {
            let added = record.add(kind, media_type, media_id);
            if added {
                store.put(user_id, &record).await?;
            }
            added
        }
    };

    tracing::info!(
        user_id = %user_id,
        media_type = %media_type,
        media_id = %media_id,
        bucket = kind.as_str(),
        added = added,
        "Preference signal recorded"
    );

    Ok(added)
}

/// Removes a like or dislike. Returns whether anything was removed; a
/// missing id or record is a no-op, not an error.
pub async fn clear_signal(
    store: &Arc<dyn PreferenceStore>,
    user_id: &str,
    kind: SignalKind,
    media_type: MediaType,
    media_id: &str,
) -> AppResult<bool> {
    let removed = match store.get(user_id).await? {
        None => false,
        Some(mut record) => {
            let removed = record.remove(kind, media_type, media_id);
            if removed {
                store.put(user_id, &record).await?;
            }
            removed
        }
    };

    tracing::info!(
        user_id = %user_id,
        media_type = %media_type,
        media_id = %media_id,
        bucket = kind.as_str(),
        removed = removed,
        "Preference signal cleared"
    );

    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::preferences::MockPreferenceStore;
    use crate::models::PreferenceRecord;

    fn record_with(kind: SignalKind, media_type: MediaType, id: &str) -> PreferenceRecord {
        let mut record = PreferenceRecord::default();
        record.add(kind, media_type, id);
        record
    }

    #[tokio::test]
    async fn test_first_signal_uses_atomic_append() {
        let mut store = MockPreferenceStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_append_if_new()
            .times(1)
            .withf(|user_id, kind, media_type, media_id| {
                user_id == "u1"
                    && *kind == SignalKind::Liked
                    && *media_type == MediaType::Game
                    && media_id == "3498"
            })
            .returning(|_, _, _, _| Ok(true));
        store.expect_put().times(0);

        let store: Arc<dyn PreferenceStore> = Arc::new(store);
        let added = record_signal(&store, "u1", SignalKind::Liked, MediaType::Game, "3498")
            .await
            .unwrap();
        assert!(added);
    }

    #[tokio::test]
    async fn test_existing_record_is_replaced_whole() {
        let mut store = MockPreferenceStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some(record_with(SignalKind::Liked, MediaType::Movie, "550"))));
        store
            .expect_put()
            .times(1)
            .withf(|user_id, record| {
                user_id == "u1"
                    && record.liked_ids(MediaType::Movie) == ["550", "27205"]
            })
            .returning(|_, _| Ok(()));

        let store: Arc<dyn PreferenceStore> = Arc::new(store);
        let added = record_signal(&store, "u1", SignalKind::Liked, MediaType::Movie, "27205")
            .await
            .unwrap();
        assert!(added);
    }

    #[tokio::test]
    async fn test_duplicate_like_is_a_noop() {
        let mut store = MockPreferenceStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some(record_with(SignalKind::Liked, MediaType::Movie, "550"))));
        store.expect_put().times(0);

        let store: Arc<dyn PreferenceStore> = Arc::new(store);
        let added = record_signal(&store, "u1", SignalKind::Liked, MediaType::Movie, "550")
            .await
            .unwrap();
        assert!(!added);
    }

    #[tokio::test]
    async fn test_clear_on_absent_record_is_a_noop() {
        let mut store = MockPreferenceStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_put().times(0);

        let store: Arc<dyn PreferenceStore> = Arc::new(store);
        let removed = clear_signal(&store, "u1", SignalKind::Liked, MediaType::Movie, "550")
            .await
            .unwrap();
        assert!(!removed);
    }

    #[tokio::test]
    async fn test_clear_removes_and_persists() {
        let mut store = MockPreferenceStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some(record_with(SignalKind::Disliked, MediaType::Tv, "1399"))));
        store
            .expect_put()
            .times(1)
            .withf(|_, record| record.ids(SignalKind::Disliked, MediaType::Tv).is_empty())
            .returning(|_, _| Ok(()));

        let store: Arc<dyn PreferenceStore> = Arc::new(store);
        let removed = clear_signal(&store, "u1", SignalKind::Disliked, MediaType::Tv, "1399")
            .await
            .unwrap();
        assert!(removed);
    }
}

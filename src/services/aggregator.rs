use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Multi-media aggregation
///
/// Runs the recommendation engine once per media type, concurrently and
/// independently: every type gets its own task and its own time budget,
/// and no outcome in one type can disturb another. A type with no liked
/// signal falls back to trending; books additionally fall back to a fixed
/// classics list so that entry is never empty, whatever the catalogs do.
use crate::{
    error::AppError,
    models::{MediaItem, MediaType, RecommendationList},
    services::{
        catalog::{Catalogs, TrendingWindow},
        engine::{RecommendationEngine, MULTI_TYPE_CAP},
    },
};

/// Last-resort book entries when every catalog query comes back empty
const BOOK_FALLBACK: [(&str, &str, &str); 3] = [
    ("OL66554W", "Pride and Prejudice", "Jane Austen"),
    ("OL1168083W", "Nineteen Eighty-Four", "George Orwell"),
    ("OL262758W", "The Hobbit", "J.R.R. Tolkien"),
];

pub struct Aggregator {
    engine: Arc<RecommendationEngine>,
    catalogs: Catalogs,
    per_type_timeout: Duration,
}

impl Aggregator {
    pub fn new(
        engine: Arc<RecommendationEngine>,
        catalogs: Catalogs,
        per_type_timeout: Duration,
    ) -> Self {
        Self {
            engine,
            catalogs,
            per_type_timeout,
        }
    }

    /// Builds the multi-media view. Infallible by design: every media type
    /// is always present in the result, degraded to trending, a static
    /// fallback or an empty list as its pipeline allows.
    pub async fn recommend_all(&self, user_id: &str) -> HashMap<MediaType, Vec<MediaItem>> {
        let mut tasks = Vec::with_capacity(MediaType::ALL.len());

        for media_type in MediaType::ALL {
            let engine = self.engine.clone();
            let catalogs = self.catalogs.clone();
            let user_id = user_id.to_string();
            let budget = self.per_type_timeout;

            tasks.push((
                media_type,
                tokio::spawn(async move {
                    recommend_one_type(engine, catalogs, &user_id, media_type, budget).await
                }),
            ));
        }

        let mut aggregate = HashMap::with_capacity(MediaType::ALL.len());
        for (media_type, task) in tasks {
            let mut items = match task.await {
                Ok(items) => items,
                Err(e) => {
                    tracing::error!(media_type = %media_type, error = %e, "Per-type task failed");
                    Vec::new()
                }
            };

            if media_type == MediaType::Book && items.is_empty() {
                items = static_book_fallback();
            }

            aggregate.insert(media_type, items);
        }

        aggregate
    }
}

/// One media type's entry: engine when the user has signal, trending when
/// not, empty on anything else (logged). The engine salvages partials when
/// its budget expires; the trending fallback gets the same budget.
async fn recommend_one_type(
    engine: Arc<RecommendationEngine>,
    catalogs: Catalogs,
    user_id: &str,
    media_type: MediaType,
    budget: Duration,
) -> Vec<MediaItem> {
    match engine
        .recommend_for_user(user_id, media_type, MULTI_TYPE_CAP, budget)
        .await
    {
        Ok(items) => items,
        Err(AppError::NoSignal(_)) => {
            match tokio::time::timeout(budget, trending_fallback(&catalogs, media_type)).await {
                Ok(items) => items,
                Err(_) => {
                    tracing::warn!(
                        media_type = %media_type,
                        budget_secs = budget.as_secs(),
                        "Trending fallback timed out"
                    );
                    Vec::new()
                }
            }
        }
        Err(e) => {
            tracing::warn!(
                media_type = %media_type,
                error = %e,
                "Per-type recommendation failed"
            );
            Vec::new()
        }
    }
}

async fn trending_fallback(catalogs: &Catalogs, media_type: MediaType) -> Vec<MediaItem> {
    let catalog = catalogs.for_type(media_type);

    match catalog
        .get_trending(TrendingWindow::Day, MULTI_TYPE_CAP)
        .await
    {
        Ok(items) => {
            let mut list = RecommendationList::new(MULTI_TYPE_CAP);
            for item in items {
                list.push(item);
            }
            list.into_vec()
        }
        Err(e) => {
            tracing::warn!(media_type = %media_type, error = %e, "Trending fallback failed");
            Vec::new()
        }
    }
}

fn static_book_fallback() -> Vec<MediaItem> {
    BOOK_FALLBACK
        .into_iter()
        .map(|(id, title, author)| MediaItem {
            id: id.to_string(),
            title: title.to_string(),
            cover: None,
            media_type: MediaType::Book,
            release_date: None,
            genres: Vec::new(),
            overview: None,
            platforms: Vec::new(),
            author: Some(author.to_string()),
            rating: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::preferences::MockPreferenceStore;
    use crate::models::{PreferenceRecord, SignalKind};
    use crate::services::catalog::MockCatalogProvider;
    use crate::services::oracle::MockPromptOracle;

    fn item(id: &str, media_type: MediaType) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            title: format!("Title {}", id),
            cover: None,
            media_type,
            release_date: None,
            genres: Vec::new(),
            overview: None,
            platforms: Vec::new(),
            author: None,
            rating: None,
        }
    }

    fn trending_catalog(media_type: MediaType) -> MockCatalogProvider {
        let mut catalog = MockCatalogProvider::new();
        catalog.expect_get_trending().returning(move |_, limit| {
            Ok((1..=limit)
                .map(|i| item(&format!("{}-t{}", media_type, i), media_type))
                .collect())
        });
        catalog
    }

    fn make_aggregator(
        movie: MockCatalogProvider,
        tv: MockCatalogProvider,
        game: MockCatalogProvider,
        book: MockCatalogProvider,
        oracle: MockPromptOracle,
        store: MockPreferenceStore,
    ) -> Aggregator {
        let catalogs = Catalogs::new(
            Arc::new(movie),
            Arc::new(tv),
            Arc::new(game),
            Arc::new(book),
        );
        let engine = Arc::new(RecommendationEngine::new(
            &catalogs,
            Arc::new(oracle),
            Arc::new(store),
        ));
        Aggregator::new(engine, catalogs, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_no_signal_user_gets_trending_everywhere() {
        let mut store = MockPreferenceStore::new();
        store.expect_get().returning(|_| Ok(None));

        let aggregator = make_aggregator(
            trending_catalog(MediaType::Movie),
            trending_catalog(MediaType::Tv),
            trending_catalog(MediaType::Game),
            trending_catalog(MediaType::Book),
            MockPromptOracle::new(),
            store,
        );

        let aggregate = aggregator.recommend_all("u1").await;

        assert_eq!(aggregate.len(), 4);
        for media_type in MediaType::ALL {
            let items = &aggregate[&media_type];
            assert_eq!(items.len(), MULTI_TYPE_CAP, "{} entry", media_type);
            assert!(items.iter().all(|i| i.media_type == media_type));
        }
    }

    #[tokio::test]
    async fn test_book_static_fallback_on_total_catalog_failure() {
        let mut store = MockPreferenceStore::new();
        store.expect_get().returning(|_| Ok(None));

        let mut book = MockCatalogProvider::new();
        book.expect_get_trending()
            .returning(|_, _| Err(AppError::Upstream("openlibrary down".to_string())));

        let aggregator = make_aggregator(
            trending_catalog(MediaType::Movie),
            trending_catalog(MediaType::Tv),
            trending_catalog(MediaType::Game),
            book,
            MockPromptOracle::new(),
            store,
        );

        let aggregate = aggregator.recommend_all("u1").await;

        let books = &aggregate[&MediaType::Book];
        assert_eq!(books.len(), 3);
        assert_eq!(books[0].title, "Pride and Prejudice");
        assert!(books.iter().all(|b| b.media_type == MediaType::Book));
        // The failure stayed contained to the book entry
        assert_eq!(aggregate[&MediaType::Movie].len(), MULTI_TYPE_CAP);
    }

    #[tokio::test]
    async fn test_book_static_fallback_when_catalog_returns_nothing() {
        let mut store = MockPreferenceStore::new();
        store.expect_get().returning(|_| Ok(None));

        let mut book = MockCatalogProvider::new();
        book.expect_get_trending().returning(|_, _| Ok(Vec::new()));

        let aggregator = make_aggregator(
            trending_catalog(MediaType::Movie),
            trending_catalog(MediaType::Tv),
            trending_catalog(MediaType::Game),
            book,
            MockPromptOracle::new(),
            store,
        );

        let aggregate = aggregator.recommend_all("u1").await;
        assert_eq!(aggregate[&MediaType::Book].len(), 3);
    }

    #[tokio::test]
    async fn test_one_failing_type_does_not_affect_others() {
        // The user liked one game; that pipeline yields nothing because
        // every catalog call fails. Other types still serve trending.
        let mut store = MockPreferenceStore::new();
        store.expect_get().returning(|_| {
            let mut record = PreferenceRecord::default();
            record.add(SignalKind::Liked, MediaType::Game, "g1");
            Ok(Some(record))
        });

        let mut game = MockCatalogProvider::new();
        game.expect_get_similar()
            .returning(|_, _| Err(AppError::Upstream("rawg down".to_string())));
        game.expect_get_by_id()
            .returning(|_| Err(AppError::Upstream("rawg down".to_string())));

        let aggregator = make_aggregator(
            trending_catalog(MediaType::Movie),
            trending_catalog(MediaType::Tv),
            game,
            trending_catalog(MediaType::Book),
            MockPromptOracle::new(),
            store,
        );

        let aggregate = aggregator.recommend_all("u1").await;

        assert_eq!(aggregate.len(), 4);
        assert!(aggregate[&MediaType::Game].is_empty());
        assert_eq!(aggregate[&MediaType::Movie].len(), MULTI_TYPE_CAP);
        assert_eq!(aggregate[&MediaType::Tv].len(), MULTI_TYPE_CAP);
        assert_eq!(aggregate[&MediaType::Book].len(), MULTI_TYPE_CAP);
    }

    #[tokio::test]
    async fn test_engine_results_used_when_signal_exists() {
        let mut store = MockPreferenceStore::new();
        store.expect_get().returning(|_| {
            let mut record = PreferenceRecord::default();
            record.add(SignalKind::Liked, MediaType::Game, "g1");
            Ok(Some(record))
        });

        let mut game = MockCatalogProvider::new();
        game.expect_get_similar().returning(|_, _| {
            Ok((1..=5)
                .map(|i| item(&format!("s{}", i), MediaType::Game))
                .collect())
        });
        // Trending must not be consulted for a type with signal
        game.expect_get_trending().times(0);

        let aggregator = make_aggregator(
            trending_catalog(MediaType::Movie),
            trending_catalog(MediaType::Tv),
            game,
            trending_catalog(MediaType::Book),
            MockPromptOracle::new(),
            store,
        );

        let aggregate = aggregator.recommend_all("u1").await;

        let games = &aggregate[&MediaType::Game];
        assert_eq!(games.len(), MULTI_TYPE_CAP);
        assert_eq!(games[0].id, "s1");
    }
}

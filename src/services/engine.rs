use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

/// Recommendation engine
///
/// Produces up to `cap` items for one user and one media type. Each media
/// type gets a fixed strategy, resolved once from a table built at
/// construction:
///
/// - games lead with the catalog's own similar-items signal and only ask
///   the oracle to fill what is left,
/// - books fan out over the liked books' authors and subjects first,
/// - movies and tv have no native similarity source and always go through
///   the oracle.
///
/// Catalog-native results always precede oracle-derived ones, and the
/// oracle's ranking is never reordered.
///
/// Every run carries a time budget. Strategies accumulate into a shared
/// list, so when the budget expires mid-run the items gathered so far are
/// still returned; only a run that times out with nothing at all fails.
use crate::{
    db::PreferenceStore,
    error::{AppError, AppResult},
    models::{MediaItem, MediaType, RecommendationList},
    services::{
        catalog::{CatalogProvider, Catalogs},
        oracle::PromptOracle,
        parser::parse_title_array,
        prompt::{build_recommendation_prompt, LikedSummary},
    },
};

/// Result cap for a single-type recommendation request
pub const SINGLE_TYPE_CAP: usize = 10;
/// Per-type result cap inside the multi-type aggregate
pub const MULTI_TYPE_CAP: usize = 3;

/// Page size for each per-liked-game similar-items call
const SIMILAR_PAGE_SIZE: usize = 10;
/// At most this many distinct authors are queried for the book path
const AUTHOR_QUERY_COUNT: usize = 2;
/// At most this many distinct subjects are queried for the book path
const SUBJECT_QUERY_COUNT: usize = 2;
/// Results requested per author/subject query
const RESULTS_PER_QUERY: usize = 5;

/// One media type's way of turning liked ids into recommendations.
///
/// Strategies push into the caller's list instead of returning one, so a
/// caller that stops waiting still sees everything pushed up to that
/// point. The lock is never held across an upstream call.
#[async_trait::async_trait]
pub trait RecommendationStrategy: Send + Sync {
    async fn recommend(
        &self,
        liked_ids: &[String],
        results: &Mutex<RecommendationList>,
    ) -> AppResult<()>;
}

pub struct RecommendationEngine {
    preferences: Arc<dyn PreferenceStore>,
    strategies: HashMap<MediaType, Arc<dyn RecommendationStrategy>>,
}

impl RecommendationEngine {
    pub fn new(
        catalogs: &Catalogs,
        oracle: Arc<dyn PromptOracle>,
        preferences: Arc<dyn PreferenceStore>,
    ) -> Self {
        let mut strategies: HashMap<MediaType, Arc<dyn RecommendationStrategy>> = HashMap::new();

        for media_type in [MediaType::Movie, MediaType::Tv] {
            strategies.insert(
                media_type,
                Arc::new(OracleStrategy {
                    media_type,
                    catalog: catalogs.for_type(media_type),
                    oracle: oracle.clone(),
                }),
            );
        }
        strategies.insert(
            MediaType::Game,
            Arc::new(SimilarityStrategy {
                media_type: MediaType::Game,
                catalog: catalogs.for_type(MediaType::Game),
                oracle: oracle.clone(),
            }),
        );
        strategies.insert(
            MediaType::Book,
            Arc::new(AuthorSubjectStrategy {
                media_type: MediaType::Book,
                catalog: catalogs.for_type(MediaType::Book),
                oracle,
            }),
        );

        Self {
            preferences,
            strategies,
        }
    }

    /// Reads the user's liked ids for the media type and recommends from
    /// them. An empty liked list is the distinct no-signal outcome.
    pub async fn recommend_for_user(
        &self,
        user_id: &str,
        media_type: MediaType,
        cap: usize,
        budget: Duration,
    ) -> AppResult<Vec<MediaItem>> {
        let record = self.preferences.get(user_id).await?.unwrap_or_default();
        let liked_ids = record.liked_ids(media_type);

        if liked_ids.is_empty() {
            return Err(AppError::NoSignal(format!(
                "no liked {} recorded for this user",
                media_type.label()
            )));
        }

        self.recommend(media_type, liked_ids, cap, budget).await
    }

    pub async fn recommend(
        &self,
        media_type: MediaType,
        liked_ids: &[String],
        cap: usize,
        budget: Duration,
    ) -> AppResult<Vec<MediaItem>> {
        let strategy = self.strategies.get(&media_type).cloned().ok_or_else(|| {
            AppError::Internal(format!("no strategy registered for {}", media_type))
        })?;

        let results = Arc::new(Mutex::new(RecommendationList::new(cap)));
        let shared = results.clone();
        let liked: Vec<String> = liked_ids.to_vec();
        let mut task =
            tokio::spawn(async move { strategy.recommend(&liked, &shared).await });

        match tokio::time::timeout(budget, &mut task).await {
            Ok(Ok(outcome)) => {
                outcome?;
                let items = results.lock().await.snapshot();
                tracing::info!(
                    media_type = %media_type,
                    liked = liked_ids.len(),
                    results = items.len(),
                    "Recommendation completed"
                );
                Ok(items)
            }
            Ok(Err(e)) => Err(AppError::Internal(format!(
                "recommendation task failed: {}",
                e
            ))),
            Err(_) => {
                task.abort();
                let items = results.lock().await.snapshot();
                if items.is_empty() {
                    return Err(AppError::Upstream(format!(
                        "{} recommendation timed out with no results",
                        media_type
                    )));
                }
                tracing::warn!(
                    media_type = %media_type,
                    budget_secs = budget.as_secs(),
                    partial = items.len(),
                    "Recommendation timed out, returning partial results"
                );
                Ok(items)
            }
        }
    }
}

/// Game path: catalog similar-items first, oracle fills the remainder
struct SimilarityStrategy {
    media_type: MediaType,
    catalog: Arc<dyn CatalogProvider>,
    oracle: Arc<dyn PromptOracle>,
}

#[async_trait::async_trait]
impl RecommendationStrategy for SimilarityStrategy {
    async fn recommend(
        &self,
        liked_ids: &[String],
        results: &Mutex<RecommendationList>,
    ) -> AppResult<()> {
        for id in liked_ids {
            if results.lock().await.is_full() {
                break;
            }
            match self.catalog.get_similar(id, SIMILAR_PAGE_SIZE).await {
                Ok(similar) => {
                    let mut list = results.lock().await;
                    for item in similar {
                        list.push(item);
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        media_id = %id,
                        error = %e,
                        "Similar-items lookup failed, skipping"
                    );
                }
            }
        }

        if !results.lock().await.is_full() {
            let summaries = liked_summaries(&self.catalog, liked_ids).await;
            if let Err(e) = supplement_from_oracle(
                &self.catalog,
                &self.oracle,
                self.media_type,
                &summaries,
                results,
            )
            .await
            {
                tracing::warn!(
                    media_type = %self.media_type,
                    error = %e,
                    "Oracle supplement failed, returning native results only"
                );
            }
        }

        Ok(())
    }
}

/// Book path: author and subject fan-out first, oracle fills the remainder
struct AuthorSubjectStrategy {
    media_type: MediaType,
    catalog: Arc<dyn CatalogProvider>,
    oracle: Arc<dyn PromptOracle>,
}

#[async_trait::async_trait]
impl RecommendationStrategy for AuthorSubjectStrategy {
    async fn recommend(
        &self,
        liked_ids: &[String],
        results: &Mutex<RecommendationList>,
    ) -> AppResult<()> {
        let mut authors: Vec<String> = Vec::new();
        let mut subjects: Vec<String> = Vec::new();
        let mut summaries: Vec<LikedSummary> = Vec::new();

        for id in liked_ids {
            match self.catalog.get_by_id(id).await {
                Ok(item) => {
                    if let Some(author) = &item.author {
                        if !authors.contains(author) {
                            authors.push(author.clone());
                        }
                    }
                    for subject in &item.genres {
                        if !subjects.contains(subject) {
                            subjects.push(subject.clone());
                        }
                    }
                    summaries.push(LikedSummary::from_item(&item));
                }
                Err(e) => {
                    tracing::warn!(media_id = %id, error = %e, "Liked book lookup failed, skipping");
                }
            }
        }

        for author in authors.iter().take(AUTHOR_QUERY_COUNT) {
            if results.lock().await.is_full() {
                break;
            }
            match self.catalog.search_by_author(author, RESULTS_PER_QUERY).await {
                Ok(items) => {
                    let mut list = results.lock().await;
                    for item in items {
                        list.push(item);
                    }
                }
                Err(e) => {
                    tracing::warn!(author = %author, error = %e, "Author query failed, skipping");
                }
            }
        }

        for subject in subjects.iter().take(SUBJECT_QUERY_COUNT) {
            if results.lock().await.is_full() {
                break;
            }
            match self
                .catalog
                .search_by_subject(subject, RESULTS_PER_QUERY)
                .await
            {
                Ok(items) => {
                    let mut list = results.lock().await;
                    for item in items {
                        list.push(item);
                    }
                }
                Err(e) => {
                    tracing::warn!(subject = %subject, error = %e, "Subject query failed, skipping");
                }
            }
        }

        if !results.lock().await.is_full() {
            if let Err(e) = supplement_from_oracle(
                &self.catalog,
                &self.oracle,
                self.media_type,
                &summaries,
                results,
            )
            .await
            {
                tracing::warn!(
                    media_type = %self.media_type,
                    error = %e,
                    "Oracle supplement failed, returning native results only"
                );
            }
        }

        Ok(())
    }
}

/// Movie/tv path: the oracle is the only suggestion source
struct OracleStrategy {
    media_type: MediaType,
    catalog: Arc<dyn CatalogProvider>,
    oracle: Arc<dyn PromptOracle>,
}

#[async_trait::async_trait]
impl RecommendationStrategy for OracleStrategy {
    async fn recommend(
        &self,
        liked_ids: &[String],
        results: &Mutex<RecommendationList>,
    ) -> AppResult<()> {
        let summaries = liked_summaries(&self.catalog, liked_ids).await;
        if summaries.is_empty() {
            return Err(AppError::Upstream(format!(
                "none of the liked {} could be resolved",
                self.media_type.label()
            )));
        }

        let resolution_failures = supplement_from_oracle(
            &self.catalog,
            &self.oracle,
            self.media_type,
            &summaries,
            results,
        )
        .await?;

        // A fully clean run may legitimately end empty (every suggested
        // title missed the catalog); an empty result caused by lookup
        // failures surfaces as one coarse upstream error instead.
        if results.lock().await.is_empty() && resolution_failures > 0 {
            return Err(AppError::Upstream(format!(
                "suggested {} could not be resolved against the catalog",
                self.media_type.label()
            )));
        }

        Ok(())
    }
}

/// Fetches each liked item's details for prompt building. Per-id failures
/// are logged and skipped so one missing id never poisons the rest.
async fn liked_summaries(
    catalog: &Arc<dyn CatalogProvider>,
    liked_ids: &[String],
) -> Vec<LikedSummary> {
    let mut summaries = Vec::new();
    for id in liked_ids {
        match catalog.get_by_id(id).await {
            Ok(item) => summaries.push(LikedSummary::from_item(&item)),
            Err(e) => {
                tracing::warn!(media_id = %id, error = %e, "Liked item lookup failed, skipping");
            }
        }
    }
    summaries
}

/// Asks the oracle for titles and appends whatever resolves against the
/// catalog until the cap. Returns the number of per-title resolution
/// failures; oracle and parse failures propagate to the caller, which
/// decides whether they are fatal.
async fn supplement_from_oracle(
    catalog: &Arc<dyn CatalogProvider>,
    oracle: &Arc<dyn PromptOracle>,
    media_type: MediaType,
    summaries: &[LikedSummary],
    results: &Mutex<RecommendationList>,
) -> AppResult<usize> {
    if summaries.is_empty() {
        tracing::debug!(
            media_type = %media_type,
            "No resolvable liked items, skipping oracle supplement"
        );
        return Ok(0);
    }

    let want = results.lock().await.remaining();
    let prompt = build_recommendation_prompt(media_type, summaries, want);
    let completion = oracle.complete(&prompt).await?;
    let titles = parse_title_array(&completion)?;

    let mut resolution_failures = 0;
    for title in titles {
        if results.lock().await.is_full() {
            break;
        }
        match catalog.search_by_title(&title).await {
            Ok(Some(item)) => {
                results.lock().await.push(item);
            }
            Ok(None) => {
                tracing::debug!(
                    title = %title,
                    media_type = %media_type,
                    "Suggested title not found in catalog, skipping"
                );
            }
            Err(e) => {
                resolution_failures += 1;
                tracing::warn!(title = %title, error = %e, "Suggested title lookup failed, skipping");
            }
        }
    }

    Ok(resolution_failures)
}

use std::sync::Arc;

/// Media catalog abstraction
///
/// One provider per media type (TMDB for movie/tv, RAWG for games,
/// OpenLibrary for books), each normalizing its upstream's response shape
/// into [`MediaItem`]. Capability-specific lookups default to an error so
/// a provider only implements what its upstream actually offers: similar
/// items exist for games, author/subject queries exist for books.
use crate::{
    error::{AppError, AppResult},
    models::{MediaItem, MediaType},
};

pub mod openlibrary;
pub mod rawg;
pub mod tmdb;

pub use openlibrary::OpenLibraryCatalog;
pub use rawg::RawgCatalog;
pub use tmdb::TmdbCatalog;

/// Time window for trending lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendingWindow {
    Day,
    Week,
}

impl TrendingWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
        }
    }
}

/// Trait for media catalog providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Looks up the first catalog item matching a title, `None` on no hit.
    async fn search_by_title(&self, title: &str) -> AppResult<Option<MediaItem>>;

    /// Fetches full item details; fails with `NotFound` when the id does
    /// not exist upstream.
    async fn get_by_id(&self, id: &str) -> AppResult<MediaItem>;

    /// Catalog-native similar items. Only the game catalog supports this.
    async fn get_similar(&self, id: &str, limit: usize) -> AppResult<Vec<MediaItem>> {
        let _ = (id, limit);
        Err(AppError::Internal(format!(
            "{} does not support similar-item lookups",
            self.name()
        )))
    }

    /// Currently popular items for the media type.
    async fn get_trending(&self, window: TrendingWindow, limit: usize) -> AppResult<Vec<MediaItem>>;

    /// Items by author. Only the book catalog supports this.
    async fn search_by_author(&self, author: &str, limit: usize) -> AppResult<Vec<MediaItem>> {
        let _ = (author, limit);
        Err(AppError::Internal(format!(
            "{} does not support author queries",
            self.name()
        )))
    }

    /// Items by subject tag. Only the book catalog supports this.
    async fn search_by_subject(&self, subject: &str, limit: usize) -> AppResult<Vec<MediaItem>> {
        let _ = (subject, limit);
        Err(AppError::Internal(format!(
            "{} does not support subject queries",
            self.name()
        )))
    }

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Strategy table mapping each media type to its catalog provider.
///
/// Resolved once per call site via [`Catalogs::for_type`]; nothing
/// downstream re-matches on the media type to pick a backend.
#[derive(Clone)]
pub struct Catalogs {
    movie: Arc<dyn CatalogProvider>,
    tv: Arc<dyn CatalogProvider>,
    game: Arc<dyn CatalogProvider>,
    book: Arc<dyn CatalogProvider>,
}

impl Catalogs {
    pub fn new(
        movie: Arc<dyn CatalogProvider>,
        tv: Arc<dyn CatalogProvider>,
        game: Arc<dyn CatalogProvider>,
        book: Arc<dyn CatalogProvider>,
    ) -> Self {
        Self {
            movie,
            tv,
            game,
            book,
        }
    }

    pub fn for_type(&self, media_type: MediaType) -> Arc<dyn CatalogProvider> {
        match media_type {
            MediaType::Movie => self.movie.clone(),
            MediaType::Tv => self.tv.clone(),
            MediaType::Game => self.game.clone(),
            MediaType::Book => self.book.clone(),
        }
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;

/// The media catalogs the aggregator knows about
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Movie,
    Tv,
    Game,
    Book,
}

impl MediaType {
    /// Fixed aggregation order for the multi-media view
    pub const ALL: [MediaType; 4] = [
        MediaType::Movie,
        MediaType::Tv,
        MediaType::Game,
        MediaType::Book,
    ];

    /// Plural label used when prompting the completion oracle
    pub fn label(&self) -> &'static str {
        match self {
            MediaType::Movie => "movies",
            MediaType::Tv => "TV series",
            MediaType::Game => "video games",
            MediaType::Book => "books",
        }
    }
}

impl Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Tv => write!(f, "tv"),
            MediaType::Game => write!(f, "game"),
            MediaType::Book => write!(f, "book"),
        }
    }
}

/// A catalog record normalized to a single shape regardless of source.
///
/// `id` is the source-native identifier and is only unique together with
/// `media_type` (TMDB, RAWG and OpenLibrary ids collide freely).
/// Type-irrelevant fields stay absent in serialized output rather than null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub platforms: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
}

impl MediaItem {
    /// Composite identity; ids alone collide across media types.
    pub fn key(&self) -> (String, MediaType) {
        (self.id.clone(), self.media_type)
    }
}

/// Ordered result collector enforcing the composite-key dedup and the cap.
///
/// Insertion order is preserved, so pushing catalog-native items before
/// oracle-derived ones is all a caller needs to satisfy the ordering
/// contract of a recommendation response.
#[derive(Debug)]
pub struct RecommendationList {
    items: Vec<MediaItem>,
    seen: HashSet<(String, MediaType)>,
    cap: usize,
}

impl RecommendationList {
    pub fn new(cap: usize) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            cap,
        }
    }

    /// Appends the item unless it is a duplicate or the cap is reached.
    /// Returns whether the item was kept.
    pub fn push(&mut self, item: MediaItem) -> bool {
        if self.is_full() || !self.seen.insert(item.key()) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.cap
    }

    /// Slots left before the cap
    pub fn remaining(&self) -> usize {
        self.cap.saturating_sub(self.items.len())
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_vec(self) -> Vec<MediaItem> {
        self.items
    }

    /// Copy of the items collected so far; the list stays usable.
    pub fn snapshot(&self) -> Vec<MediaItem> {
        self.items.clone()
    }
}

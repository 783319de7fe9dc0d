use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::MediaType;

/// Which preference bucket a signal lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Liked,
    Disliked,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Liked => "liked",
            SignalKind::Disliked => "disliked",
        }
    }
}

/// Per-user preference signals, keyed by media type.
///
/// The same id may legitimately sit in both liked and disliked for one
/// media type; the store never enforces exclusivity and neither do we.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PreferenceRecord {
    #[serde(default)]
    pub liked: HashMap<MediaType, Vec<String>>,
    #[serde(default)]
    pub disliked: HashMap<MediaType, Vec<String>>,
}

impl PreferenceRecord {
    pub fn ids(&self, kind: SignalKind, media_type: MediaType) -> &[String] {
        let bucket = match kind {
            SignalKind::Liked => &self.liked,
            SignalKind::Disliked => &self.disliked,
        };
        bucket.get(&media_type).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn liked_ids(&self, media_type: MediaType) -> &[String] {
        self.ids(SignalKind::Liked, media_type)
    }

    /// Idempotent add; returns whether the id was newly appended.
    pub fn add(&mut self, kind: SignalKind, media_type: MediaType, id: &str) -> bool {
        let bucket = match kind {
            SignalKind::Liked => &mut self.liked,
            SignalKind::Disliked => &mut self.disliked,
        };
        let ids = bucket.entry(media_type).or_default();
        if ids.iter().any(|existing| existing == id) {
            return false;
        }
        ids.push(id.to_string());
        true
    }

    /// Idempotent remove; returns whether anything was actually removed.
    pub fn remove(&mut self, kind: SignalKind, media_type: MediaType, id: &str) -> bool {
        let bucket = match kind {
            SignalKind::Liked => &mut self.liked,
            SignalKind::Disliked => &mut self.disliked,
        };
        match bucket.get_mut(&media_type) {
            Some(ids) => {
                let before = ids.len();
                ids.retain(|existing| existing != id);
                ids.len() != before
            }
            None => false,
        }
    }
}

/// Persisted shape of one bucket of ids.
///
/// Early records stored a flat id array with no media-type split; those are
/// read as the movie list. New records always persist the per-type map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum StoredIdList {
    PerType(HashMap<MediaType, Vec<String>>),
    Flat(Vec<String>),
}

impl Default for StoredIdList {
    fn default() -> Self {
        StoredIdList::PerType(HashMap::new())
    }
}

impl StoredIdList {
    pub fn upgrade(self) -> HashMap<MediaType, Vec<String>> {
        match self {
            StoredIdList::PerType(map) => map,
            StoredIdList::Flat(ids) => HashMap::from([(MediaType::Movie, ids)]),
        }
    }
}

/// On-disk record as found in the store, before shape upgrade.
///
/// Accepts both the current field names and the original store's
/// `liked_ids` / `disliked_ids`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredPreferences {
    #[serde(default, alias = "liked_ids")]
    pub liked: StoredIdList,
    #[serde(default, alias = "disliked_ids")]
    pub disliked: StoredIdList,
}

impl StoredPreferences {
    pub fn upgrade(self) -> PreferenceRecord {
        PreferenceRecord {
            liked: self.liked.upgrade(),
            disliked: self.disliked.upgrade(),
        }
    }
}

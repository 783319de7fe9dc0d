pub mod media;
pub mod preferences;

pub use media::{MediaItem, MediaType, RecommendationList};
pub use preferences::{PreferenceRecord, SignalKind, StoredIdList, StoredPreferences};

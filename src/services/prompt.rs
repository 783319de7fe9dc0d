/// Prompt construction for the completion oracle
use crate::models::{MediaItem, MediaType};

/// How many genres of a liked item to quote in the prompt; book subject
/// lists run into the hundreds.
const MAX_GENRES_PER_ITEM: usize = 3;

/// Title and genres of a liked item, as quoted to the oracle
#[derive(Debug, Clone, PartialEq)]
pub struct LikedSummary {
    pub title: String,
    pub genres: Vec<String>,
}

impl LikedSummary {
    pub fn from_item(item: &MediaItem) -> Self {
        Self {
            title: item.title.clone(),
            genres: item
                .genres
                .iter()
                .take(MAX_GENRES_PER_ITEM)
                .cloned()
                .collect(),
        }
    }
}

/// Builds the recommendation prompt. The closing instruction pins the
/// completion to the shape [`parse_title_array`](super::parser::parse_title_array)
/// accepts.
pub fn build_recommendation_prompt(
    media_type: MediaType,
    liked: &[LikedSummary],
    want: usize,
) -> String {
    let label = media_type.label();

    let mut prompt = format!("I enjoyed the following {}:\n", label);
    for summary in liked {
        if summary.genres.is_empty() {
            prompt.push_str(&format!("- {}\n", summary.title));
        } else {
            prompt.push_str(&format!("- {} ({})\n", summary.title, summary.genres.join(", ")));
        }
    }

    prompt.push_str(&format!(
        "\nSuggest up to {} other {} I am likely to enjoy, best match first. \
         Do not repeat titles from my list. \
         Answer with only a JSON array of title strings, for example: [\"First Title\", \"Second Title\"].",
        want, label
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(title: &str, genres: &[&str]) -> LikedSummary {
        LikedSummary {
            title: title.to_string(),
            genres: genres.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn test_prompt_lists_titles_with_genres() {
        let prompt = build_recommendation_prompt(
            MediaType::Movie,
            &[
                summary("Inception", &["Action", "Science Fiction"]),
                summary("Paterson", &[]),
            ],
            10,
        );

        assert!(prompt.contains("movies"));
        assert!(prompt.contains("- Inception (Action, Science Fiction)"));
        assert!(prompt.contains("- Paterson\n"));
        assert!(prompt.contains("up to 10"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn test_prompt_uses_media_type_label() {
        let prompt = build_recommendation_prompt(MediaType::Game, &[summary("Hades", &[])], 5);
        assert!(prompt.contains("video games"));
    }

    #[test]
    fn test_summary_truncates_genre_list() {
        let item = MediaItem {
            id: "OL1W".to_string(),
            title: "Dune".to_string(),
            cover: None,
            media_type: MediaType::Book,
            release_date: None,
            genres: (0..20).map(|i| format!("subject-{}", i)).collect(),
            overview: None,
            platforms: Vec::new(),
            author: None,
            rating: None,
        };

        let summary = LikedSummary::from_item(&item);
        assert_eq!(summary.genres.len(), MAX_GENRES_PER_ITEM);
    }
}

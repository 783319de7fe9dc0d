use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Redis connection URL (response cache + preference store)
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// TMDB API key (movie / tv catalog)
    pub tmdb_api_key: String,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Language passed to TMDB lookups
    #[serde(default = "default_tmdb_language")]
    pub tmdb_language: String,

    /// RAWG API key (game catalog)
    pub rawg_api_key: String,

    /// RAWG API base URL
    #[serde(default = "default_rawg_api_url")]
    pub rawg_api_url: String,

    /// OpenLibrary base URL (book catalog, no key required)
    #[serde(default = "default_openlibrary_api_url")]
    pub openlibrary_api_url: String,

    /// OpenRouter API key (completion oracle)
    pub openrouter_api_key: String,

    /// OpenRouter API base URL
    #[serde(default = "default_openrouter_api_url")]
    pub openrouter_api_url: String,

    /// Model requested from the completion oracle
    #[serde(default = "default_oracle_model")]
    pub oracle_model: String,

    /// Per-media-type budget inside the multi-type aggregate, in seconds
    #[serde(default = "default_per_type_timeout_secs")]
    pub per_type_timeout_secs: u64,

    /// Overall budget for a single-type recommendation request, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_tmdb_language() -> String {
    "en-US".to_string()
}

fn default_rawg_api_url() -> String {
    "https://api.rawg.io/api".to_string()
}

fn default_openlibrary_api_url() -> String {
    "https://openlibrary.org".to_string()
}

fn default_openrouter_api_url() -> String {
    "https://openrouter.ai/api".to_string()
}

fn default_oracle_model() -> String {
    "deepseek/deepseek-r1-distill-llama-70b:free".to_string()
}

fn default_per_type_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

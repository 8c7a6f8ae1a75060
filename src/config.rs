use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Document store project identifier
    pub project_id: String,

    /// Web API key shared by the document store and identity provider
    pub web_api_key: String,

    /// Document store collection holding catalog entries
    #[serde(default = "default_catalog_collection")]
    pub catalog_collection: String,

    /// Document store REST base URL
    #[serde(default = "default_store_api_url")]
    pub store_api_url: String,

    /// Identity toolkit REST base URL
    #[serde(default = "default_identity_api_url")]
    pub identity_api_url: String,

    /// Generative language API key
    pub gemini_api_key: String,

    /// Generative language model name
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Generative language REST base URL
    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of catalog entries loaded into the assistant's context
    #[serde(default = "default_snapshot_limit")]
    pub snapshot_limit: u32,

    /// Maximum entries the assistant may suggest per reply
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Assistant calls allowed per unauthenticated session
    #[serde(default = "default_guest_query_limit")]
    pub guest_query_limit: u32,
}

fn default_catalog_collection() -> String {
    "movies".to_string()
}

fn default_store_api_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

fn default_identity_api_url() -> String {
    "https://identitytoolkit.googleapis.com/v1".to_string()
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_snapshot_limit() -> u32 {
    20
}

fn default_max_suggestions() -> usize {
    6
}

fn default_guest_query_limit() -> u32 {
    5
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}

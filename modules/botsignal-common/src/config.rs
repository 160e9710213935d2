use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Reddit API
    pub reddit_client_id: String,
    pub reddit_client_secret: String,
    pub reddit_user_agent: String,

    // Extraction tuning
    pub fetch_delay_ms: u64,
    pub extraction_limit: u32,

    // Web server
    pub api_host: String,
    pub api_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            reddit_client_id: required_env("REDDIT_CLIENT_ID"),
            reddit_client_secret: required_env("REDDIT_CLIENT_SECRET"),
            reddit_user_agent: env::var("REDDIT_USER_AGENT")
                .unwrap_or_else(|_| "botsignal/0.1".to_string()),
            fetch_delay_ms: env::var("FETCH_DELAY_MS")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .expect("FETCH_DELAY_MS must be a number"),
            extraction_limit: env::var("EXTRACTION_LIMIT")
                .unwrap_or_else(|_| "100".to_string())
                .parse()
                .expect("EXTRACTION_LIMIT must be a number"),
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("API_PORT must be a number"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

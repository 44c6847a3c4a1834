use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Which `JobMatcher` backend serves recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScorerBackend {
    Keyword,
    Llm,
}

impl ScorerBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "keyword" => Ok(ScorerBackend::Keyword),
            "llm" => Ok(ScorerBackend::Llm),
            other => bail!("MATCH_SCORER must be 'keyword' or 'llm', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: String,
    pub port: u16,
    pub rust_log: String,
    pub jobs_path: String,
    pub llm_timeout: Duration,
    pub match_scorer: ScorerBackend,
    pub match_top_n: usize,
    pub conversation_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            groq_api_key: require_env("GROQ_API_KEY")?,
            port: parse_env("PORT", 3000u16)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            jobs_path: std::env::var("JOBS_PATH").unwrap_or_else(|_| "data/jobs.json".to_string()),
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 20u64)?),
            match_scorer: ScorerBackend::parse(
                &std::env::var("MATCH_SCORER").unwrap_or_else(|_| "llm".to_string()),
            )?,
            match_top_n: parse_env("MATCH_TOP_N", 3usize)?,
            conversation_ttl: Duration::from_secs(parse_env("CONVERSATION_TTL_SECS", 3600u64)?),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    /// Absent or empty key switches every provider-backed step to its
    /// deterministic fallback.
    pub openai_api_key: Option<String>,
    pub sandbox_timeout_ms: u64,
    pub max_questions: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "127.0.0.1:4000"),
            openai_api_key: env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            sandbox_timeout_ms: get_env_parse_or("SANDBOX_TIMEOUT_MS", 1_000)?,
            max_questions: get_env_parse_or("MAX_QUESTIONS", 50)?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:4000".to_string(),
            openai_api_key: None,
            sandbox_timeout_ms: 1_000,
            max_questions: 50,
        }
    }
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

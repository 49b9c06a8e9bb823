use anyhow::{Context, Result, bail};
use std::path::PathBuf;

use crate::storage::SqliteStorage;

/// One week.
pub const MAX_SESSION_TTL_MINUTES: i64 = 10_080;

/// Runtime configuration loaded from environment variables (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub supabase_url: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub session_ttl_minutes: i64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let session_ttl_minutes = non_empty("SESSION_TTL_MINUTES")
            .unwrap_or_else(|| "60".to_string())
            .trim()
            .parse::<i64>()
            .context("SESSION_TTL_MINUTES must be a whole number of minutes")?;
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&session_ttl_minutes) {
            bail!(
                "SESSION_TTL_MINUTES must be between 1 and {} (got {})",
                MAX_SESSION_TTL_MINUTES,
                session_ttl_minutes
            );
        }

        Ok(Config {
            db_path: non_empty("PLACEMENT_HUB_DB")
                .map(PathBuf::from)
                .unwrap_or_else(SqliteStorage::default_path),
            supabase_url: non_empty("SUPABASE_URL"),
            supabase_anon_key: non_empty("SUPABASE_ANON_KEY"),
            session_ttl_minutes,
            rust_log: non_empty("RUST_LOG").unwrap_or_else(|| "warn".to_string()),
        })
    }

    /// No usable backend credentials: the local store stands in for the database.
    pub fn demo_mode(&self) -> bool {
        match (&self.supabase_url, &self.supabase_anon_key) {
            (Some(url), Some(key)) => is_placeholder(url) || is_placeholder(key),
            _ => true,
        }
    }
}

fn is_placeholder(value: &str) -> bool {
    let lower = value.to_lowercase();
    lower.contains("your-project") || lower.contains("your_supabase") || lower.contains("your-anon-key")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_to_demo_mode() {
        let config = config_from(&[]).unwrap();
        assert!(config.demo_mode());
        assert_eq!(config.session_ttl_minutes, 60);
        assert_eq!(config.rust_log, "warn");
        assert!(config.db_path.ends_with("placement-hub.db"));
    }

    #[test]
    fn test_placeholder_credentials_stay_in_demo_mode() {
        let config = config_from(&[
            ("SUPABASE_URL", "https://your-project.supabase.co"),
            ("SUPABASE_ANON_KEY", "abc"),
        ])
        .unwrap();
        assert!(config.demo_mode());
    }

    #[test]
    fn test_real_credentials_leave_demo_mode() {
        let config = config_from(&[
            ("SUPABASE_URL", "https://campus.supabase.co"),
            ("SUPABASE_ANON_KEY", "eyJhbGciOi"),
            ("PLACEMENT_HUB_DB", "/tmp/hub.db"),
        ])
        .unwrap();
        assert!(!config.demo_mode());
        assert_eq!(config.db_path, PathBuf::from("/tmp/hub.db"));
    }

    #[test]
    fn test_invalid_ttl_is_an_error() {
        assert!(config_from(&[("SESSION_TTL_MINUTES", "soon")]).is_err());
    }

    #[test]
    fn test_ttl_must_be_positive_and_bounded() {
        assert!(config_from(&[("SESSION_TTL_MINUTES", "-5")]).is_err());
        assert!(config_from(&[("SESSION_TTL_MINUTES", "0")]).is_err());
        assert!(config_from(&[("SESSION_TTL_MINUTES", "10000000000000")]).is_err());
        let config = config_from(&[("SESSION_TTL_MINUTES", "10080")]).unwrap();
        assert_eq!(config.session_ttl_minutes, MAX_SESSION_TTL_MINUTES);
    }
}

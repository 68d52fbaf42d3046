use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, bail};
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

use quest_core::reviews::{DEFAULT_LEADERBOARD_SIZE, MAX_LEADERBOARD_SIZE};

const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "change-me", "changeme", "secret"];

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub jwt_secret: String,
    /// `None` allows any origin.
    pub cors_origins: Option<Vec<HeaderValue>>,
    pub leaderboard_size: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let db_path = var("QUEST_DB_PATH").unwrap_or_else(|| "campus-quest.db".into());
        let host = var("QUEST_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = var("QUEST_PORT")
            .unwrap_or_else(|| "3000".into())
            .parse()
            .context("QUEST_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {host}:{port}"))?;

        let jwt_secret = var("QUEST_JWT_SECRET")
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        if jwt_secret.is_empty() {
            bail!("QUEST_JWT_SECRET must be set");
        }
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("QUEST_JWT_SECRET is a placeholder value; set a real secret");
        }

        let cors_origins = var("QUEST_CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| {
                        HeaderValue::from_str(s)
                            .with_context(|| format!("invalid CORS origin {s:?}"))
                    })
                    .collect::<anyhow::Result<Vec<_>>>()
            })
            .transpose()?
            .filter(|origins| !origins.is_empty());

        let leaderboard_size = match var("QUEST_LEADERBOARD_SIZE") {
            Some(raw) => raw
                .parse::<usize>()
                .context("QUEST_LEADERBOARD_SIZE must be a positive integer")?,
            None => DEFAULT_LEADERBOARD_SIZE,
        };
        if !(1..=MAX_LEADERBOARD_SIZE).contains(&leaderboard_size) {
            bail!("QUEST_LEADERBOARD_SIZE must be between 1 and {MAX_LEADERBOARD_SIZE}");
        }

        Ok(Self {
            db_path: PathBuf::from(db_path),
            addr,
            jwt_secret,
            cors_origins,
            leaderboard_size,
        })
    }

    pub fn cors_layer(&self) -> CorsLayer {
        match &self.cors_origins {
            None => CorsLayer::permissive(),
            Some(origins) => CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins.iter().cloned()))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[("QUEST_JWT_SECRET", "s3cr3t-for-tests")]).unwrap();
        assert_eq!(config.db_path, PathBuf::from("campus-quest.db"));
        assert_eq!(config.addr, "0.0.0.0:3000".parse().unwrap());
        assert!(config.cors_origins.is_none());
        assert_eq!(config.leaderboard_size, DEFAULT_LEADERBOARD_SIZE);
    }

    #[test]
    fn secret_is_required_and_not_a_placeholder() {
        assert!(load(&[]).is_err());
        assert!(load(&[("QUEST_JWT_SECRET", "  ")]).is_err());
        assert!(load(&[("QUEST_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("QUEST_JWT_SECRET", "s3cr3t-for-tests"),
            ("QUEST_HOST", "127.0.0.1"),
            ("QUEST_PORT", "8080"),
            ("QUEST_DB_PATH", "/tmp/q.db"),
            ("QUEST_CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("QUEST_LEADERBOARD_SIZE", "10"),
        ])
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.db_path, PathBuf::from("/tmp/q.db"));
        assert_eq!(config.cors_origins.as_ref().map(Vec::len), Some(2));
        assert_eq!(config.leaderboard_size, 10);
    }

    #[test]
    fn malformed_values_are_rejected() {
        let secret = ("QUEST_JWT_SECRET", "s3cr3t-for-tests");
        assert!(load(&[secret, ("QUEST_PORT", "http")]).is_err());
        assert!(load(&[secret, ("QUEST_LEADERBOARD_SIZE", "0")]).is_err());
        assert!(load(&[secret, ("QUEST_LEADERBOARD_SIZE", "500")]).is_err());
    }
}

//! Server configuration from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `DATABASE_URL` | `postgres://localhost/quire` |
//! | `HOST` / `PORT` | `0.0.0.0` / `3000` |
//! | `TREE_BATCHED` | `true` |
//! | `STORE_CONTEXT` | `shared` |
//! | `DB_MAX_CONNECTIONS` | `10` |
//! | `API_TOKENS` | empty |

use std::str::FromStr;

use tracing::warn;

use quire_core::defaults::{DB_MAX_CONNECTIONS, SERVER_PORT};
use quire_core::Result;
use quire_db::{PoolConfig, StoreContextMode};

use crate::auth::TokenTable;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/quire";
pub const DEFAULT_HOST: &str = "0.0.0.0";

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Batched aggregator when true, legacy traversal otherwise.
    pub tree_batched: bool,
    pub store_context: StoreContextMode,
    pub db_max_connections: u32,
    pub api_tokens: TokenTable,
}

/// Parse a value, falling back to `default` with a warning when it is malformed.
fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Invalid configuration value, using default");
            default
        }),
        None => default,
    }
}

fn parse_flag(key: &str, raw: Option<String>, default: bool) -> bool {
    match raw.as_deref().map(str::trim) {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        Some(other) => {
            warn!(key, value = %other, "Invalid boolean, using default");
            default
        }
        None => default,
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let store_context = match lookup("STORE_CONTEXT") {
            Some(raw) => raw.parse()?,
            None => StoreContextMode::default(),
        };
        let api_tokens = match lookup("API_TOKENS") {
            Some(raw) => TokenTable::parse(&raw)?,
            None => TokenTable::default(),
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or("PORT", lookup("PORT"), SERVER_PORT),
            tree_batched: parse_flag("TREE_BATCHED", lookup("TREE_BATCHED"), true),
            store_context,
            db_max_connections: parse_or(
                "DB_MAX_CONNECTIONS",
                lookup("DB_MAX_CONNECTIONS"),
                DB_MAX_CONNECTIONS,
            ),
            api_tokens,
        })
    }

    /// Pool opened at startup. In per-request mode it only runs migrations
    /// and is closed afterwards, so one connection is enough.
    pub fn pool_config(&self) -> PoolConfig {
        match self.store_context {
            StoreContextMode::Shared => PoolConfig::new().max_connections(self.db_max_connections),
            StoreContextMode::PerRequest => PoolConfig::new().max_connections(1).min_connections(0),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ApiConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert!(config.tree_batched);
        assert_eq!(config.store_context, StoreContextMode::Shared);
        assert_eq!(config.db_max_connections, 10);
        assert!(config.api_tokens.is_empty());
    }

    #[test]
    fn test_overrides() {
        let owner = uuid::Uuid::new_v4();
        let tokens = format!("dev:{}", owner);
        let config = config(&[
            ("PORT", "8080"),
            ("TREE_BATCHED", "false"),
            ("STORE_CONTEXT", "per_request"),
            ("API_TOKENS", &tokens),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert!(!config.tree_batched);
        assert_eq!(config.store_context, StoreContextMode::PerRequest);
        assert_eq!(config.api_tokens.len(), 1);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = config(&[("PORT", "eighty"), ("DB_MAX_CONNECTIONS", "-1")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_max_connections, 10);
    }

    #[test]
    fn test_startup_pool_follows_store_context() {
        let shared = config(&[("DB_MAX_CONNECTIONS", "16")]).unwrap().pool_config();
        assert_eq!(shared.max_connections, 16);

        let per_request = config(&[("STORE_CONTEXT", "per_request"), ("DB_MAX_CONNECTIONS", "16")])
            .unwrap()
            .pool_config();
        assert_eq!(per_request.max_connections, 1);
        assert_eq!(per_request.min_connections, 0);
    }

    #[test]
    fn test_unknown_store_context_is_an_error() {
        assert!(config(&[("STORE_CONTEXT", "pooled")]).is_err());
    }
}

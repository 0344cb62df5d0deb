//! Caller authentication.
//!
//! Session handling lives outside this service. Handlers only need the
//! owner id behind a bearer token, which a [`SessionResolver`] supplies.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use uuid::Uuid;

use quire_core::{Error, Result};

use crate::error::ApiError;
use crate::AppState;

/// Resolves a bearer token to the owning user id.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// `Ok(None)` means the token is not recognised.
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>>;
}

/// Static token table, configured through `API_TOKENS`.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    tokens: HashMap<String, Uuid>,
}

impl TokenTable {
    /// Parse comma-separated `token:owner-uuid` pairs.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut table = Self::default();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (token, owner) = pair
                .rsplit_once(':')
                .ok_or_else(|| Error::Config(format!("API_TOKENS entry '{}' has no owner id", pair)))?;
            let owner = Uuid::parse_str(owner.trim()).map_err(|_| {
                Error::Config(format!("API_TOKENS entry for '{}' has an invalid owner id", token))
            })?;
            if token.trim().is_empty() {
                return Err(Error::Config("API_TOKENS entry has an empty token".to_string()));
            }
            table.insert(token.trim(), owner);
        }
        Ok(table)
    }

    pub fn insert(&mut self, token: impl Into<String>, owner_id: Uuid) {
        self.tokens.insert(token.into(), owner_id);
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl SessionResolver for TokenTable {
    async fn resolve(&self, token: &str) -> Result<Option<Uuid>> {
        Ok(self.tokens.get(token).copied())
    }
}

/// Extractor that requires a resolved owner.
#[derive(Debug, Clone, Copy)]
pub struct RequireOwner {
    pub owner_id: Uuid,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireOwner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        match state.sessions.resolve(token).await? {
            Some(owner_id) => Ok(RequireOwner { owner_id }),
            None => Err(ApiError::Unauthorized("Invalid or expired token".to_string())),
        }
    }
}

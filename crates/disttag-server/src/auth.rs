//! Bearer token authentication.
//!
//! Tokens are looked up in a static table built from configuration. Issuing
//! and verifying real credentials is left to whatever sits in front of the
//! registry; this layer only maps a token to a principal and its flags.

use std::collections::HashMap;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use disttag_core::{Principal, TokenCapabilities};

use crate::config::TokenEntry;
use crate::error::ApiError;
use crate::routes::AppState;

/// Authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Who the caller is.
    pub principal: Principal,
    /// What the caller's token allows.
    pub capabilities: TokenCapabilities,
}

/// Token → identity lookup table.
#[derive(Debug, Clone, Default)]
pub struct TokenTable {
    tokens: HashMap<String, Identity>,
}

impl TokenTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `token` for `identity`, replacing any previous entry.
    pub fn insert(&mut self, token: impl Into<String>, identity: Identity) {
        self.tokens.insert(token.into(), identity);
    }

    /// Looks up a token.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<&Identity> {
        self.tokens.get(token)
    }

    /// Returns the number of registered tokens.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns true if no token is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<'a> FromIterator<&'a TokenEntry> for TokenTable {
    fn from_iter<I: IntoIterator<Item = &'a TokenEntry>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.insert(
                entry.token.clone(),
                Identity {
                    principal: Principal::new(entry.user.clone()),
                    capabilities: TokenCapabilities {
                        readonly: entry.readonly,
                        automation: entry.automation,
                    },
                },
            );
        }
        table
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Extractor that rejects requests without a known token.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Identity);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        bearer_token(&parts.headers)
            .and_then(|token| state.tokens.resolve(token))
            .cloned()
            .map(Self)
            .ok_or(ApiError::Unauthorized)
    }
}

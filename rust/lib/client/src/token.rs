//! Bearer token providers.
//!
//! [`ClientCredentials`] is the token manager for the upstream API: it
//! lazily obtains an app-only token, caches it, and renews it once the
//! cached one is past its (margin-adjusted) expiry. Renewal is a single
//! in-flight operation; callers that arrive during a renewal wait for it
//! and then read the fresh credential.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use serde::Deserialize;
use subsearch_types::Credential;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::{DEFAULT_AUTH_BASE, DEFAULT_USER_AGENT};

/// Pluggable token provider. Called before every authenticated request.
///
/// Returns `Ok(None)` to skip the Authorization header (anonymous).
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync + 'static {
    async fn token(&self) -> Result<Option<String>, ApiError>;

    /// Forget any cached token so the next call renews. Called when the
    /// upstream rejects a token that looked valid locally.
    fn invalidate(&self) {}
}

/// No authentication: anonymous requests.
pub struct NoAuth;

#[async_trait::async_trait]
impl TokenSource for NoAuth {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(None)
    }
}

/// Static bearer token (already obtained externally).
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait::async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(Some(self.0.clone()))
    }
}

/// OAuth2 client-credentials grant against `{auth_base}/api/v1/access_token`.
pub struct ClientCredentials {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    user_agent: String,
    cached: RwLock<Option<Cached>>,
    // Bumped by `invalidate`; a cached credential from an older generation
    // is treated as expired.
    generation: AtomicU64,
    renewals: AtomicU64,
}

struct Cached {
    credential: Credential,
    generation: u64,
}

impl Cached {
    fn usable(&self, generation: u64) -> bool {
        self.generation == generation && self.credential.is_valid()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url(DEFAULT_AUTH_BASE),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cached: RwLock::new(None),
            generation: AtomicU64::new(0),
            renewals: AtomicU64::new(0),
        }
    }

    /// Point at a different token host (tests, proxies).
    pub fn with_auth_base(mut self, auth_base: &str) -> Self {
        self.token_url = token_url(auth_base);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_http(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Number of token requests issued so far (successful or not).
    pub fn renewals(&self) -> u64 {
        self.renewals.load(Ordering::Relaxed)
    }

    /// Return a valid credential, renewing if none is cached or the cached
    /// one has expired.
    pub async fn credential(&self) -> Result<Credential, ApiError> {
        // Fast path: read lock, check cache.
        {
            let guard = self.cached.read().await;
            if let Some(ref cached) = *guard {
                if cached.usable(self.generation.load(Ordering::SeqCst)) {
                    return Ok(cached.credential.clone());
                }
            }
        }

        // Slow path: write lock, re-check, renew. Holding the write lock
        // across the request makes concurrent callers queue behind it.
        let mut guard = self.cached.write().await;
        if let Some(ref cached) = *guard {
            if cached.usable(self.generation.load(Ordering::SeqCst)) {
                debug!("token renewed by a concurrent caller");
                return Ok(cached.credential.clone());
            }
        }

        // A failed attempt leaves nothing cached.
        *guard = None;
        let fresh = self.request_token().await?;
        // Stamped after the response: an invalidation that raced this
        // request was aimed at the previous token.
        *guard = Some(Cached {
            credential: fresh.clone(),
            generation: self.generation.load(Ordering::SeqCst),
        });
        Ok(fresh)
    }

    async fn request_token(&self) -> Result<Credential, ApiError> {
        self.renewals.fetch_add(1, Ordering::Relaxed);
        info!("requesting upstream access token");

        let resp = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| {
                warn!("token endpoint unreachable: {}", e);
                ApiError::Auth(format!("token endpoint unreachable: {}", e))
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            warn!("token request rejected with HTTP {}", status);
            return Err(ApiError::Auth(format!("token request failed ({}): {}", status, body)));
        }

        let tr: TokenResponse = resp
            .json()
            .await
            .map_err(|e| ApiError::Auth(format!("token response: {}", e)))?;

        let credential = Credential::issued(tr.access_token, tr.expires_in, Utc::now());
        info!("access token renewed, valid until {}", credential.expires_at);
        Ok(credential)
    }
}

#[async_trait::async_trait]
impl TokenSource for ClientCredentials {
    async fn token(&self) -> Result<Option<String>, ApiError> {
        Ok(Some(self.credential().await?.token))
    }

    fn invalidate(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("cached access token invalidated (generation {})", generation);
    }
}

fn token_url(auth_base: &str) -> String {
    format!("{}/api/v1/access_token", auth_base.trim_end_matches('/'))
}

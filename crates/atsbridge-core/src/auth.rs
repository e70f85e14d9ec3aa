//! Credential injection.
//!
//! Static credentials (Basic API key, bearer token) are applied as-is. OAuth2
//! credentials go through [`OAuthTokenManager`], which caches the access token
//! and serializes refreshes so concurrent callers never race each other into
//! the token endpoint.

use std::fmt::{Debug, Formatter};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::transport::TransportError;

const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3_600);

/// Upper bound on the cache lifetime of an access token, whatever the vendor claims.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(86_400);

/// Settings for the OAuth2 refresh-token grant.
#[derive(Clone)]
pub struct OAuthSettings {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Authorization scheme used on data calls, e.g. `Zoho-oauthtoken`.
    pub scheme: String,
    /// Tokens are treated as expired this long before the vendor expiry.
    pub expiry_skew: Duration,
    pub timeout: Duration,
}

impl Debug for OAuthSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("token_url", &self.token_url)
            .field("client_id", &"<redacted>")
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("scheme", &self.scheme)
            .finish()
    }
}

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

/// Access-token cache for one OAuth2 credential set.
pub struct OAuthTokenManager {
    settings: OAuthSettings,
    http_client: Arc<dyn HttpClient>,
    cache: Mutex<Option<CachedToken>>,
    refreshes: AtomicU64,
}

impl OAuthTokenManager {
    pub fn new(settings: OAuthSettings, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            settings,
            http_client,
            cache: Mutex::new(None),
            refreshes: AtomicU64::new(0),
        }
    }

    /// Returns a fresh access token, refreshing first when none is cached or
    /// the cached one has expired.
    pub async fn access_token(&self) -> Result<String, TransportError> {
        let mut cache = self.cache.lock().await;
        if let Some(token) = cache.as_ref().filter(|token| token.is_fresh()) {
            return Ok(token.value.clone());
        }

        let token = self.refresh().await?;
        let value = token.value.clone();
        *cache = Some(token);
        Ok(value)
    }

    /// Drops the cached token if it is still the one the caller saw rejected.
    pub async fn invalidate(&self, stale: &str) {
        let mut cache = self.cache.lock().await;
        if cache.as_ref().is_some_and(|token| token.value == stale) {
            debug!("discarding rejected oauth access token");
            *cache = None;
        }
    }

    /// Number of refresh calls issued against the token endpoint.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn scheme(&self) -> &str {
        &self.settings.scheme
    }

    async fn refresh(&self) -> Result<CachedToken, TransportError> {
        info!(token_url = %self.settings.token_url, "refreshing oauth access token");
        self.refreshes.fetch_add(1, Ordering::SeqCst);

        let form = [
            ("refresh_token", self.settings.refresh_token.as_str()),
            ("client_id", self.settings.client_id.as_str()),
            ("client_secret", self.settings.client_secret.as_str()),
            ("grant_type", "refresh_token"),
        ]
        .iter()
        .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&");

        let request = HttpRequest::post(&self.settings.token_url)
            .with_header("content-type", "application/x-www-form-urlencoded")
            .with_header("accept", "application/json")
            .with_body(form)
            .with_timeout(self.settings.timeout);

        let response = self
            .http_client
            .execute(request)
            .await
            .map_err(TransportError::from)?;

        if !response.is_success() {
            warn!(status = response.status, "oauth token endpoint rejected refresh");
            return Err(TransportError::token_refresh(
                Some(response.status),
                "token endpoint rejected the refresh token",
            ));
        }

        // Some vendors answer 200 with an `error` field instead of an access token.
        let payload: TokenResponse = serde_json::from_str(&response.body).map_err(|_| {
            TransportError::token_refresh(
                Some(response.status),
                "token endpoint returned an unreadable payload",
            )
        })?;

        let Some(value) = payload.access_token.filter(|token| !token.is_empty()) else {
            warn!("oauth token endpoint answered without an access token");
            return Err(TransportError::token_refresh(
                Some(response.status),
                "token endpoint did not return an access token",
            ));
        };

        let lifetime = payload
            .expires_in
            .map_or(DEFAULT_TOKEN_LIFETIME, Duration::from_secs)
            .min(MAX_TOKEN_LIFETIME)
            .saturating_sub(self.settings.expiry_skew);
        let now = Instant::now();
        Ok(CachedToken {
            value,
            expires_at: now.checked_add(lifetime).unwrap_or(now),
        })
    }
}

impl Debug for OAuthTokenManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthTokenManager")
            .field("settings", &self.settings)
            .field("refreshes", &self.refresh_count())
            .finish_non_exhaustive()
    }
}

/// Provider credentials injected into every request.
#[derive(Clone)]
pub enum Credentials {
    /// Basic auth with the key as username and a blank password.
    ApiKey(String),
    Bearer(String),
    OAuth2(Arc<OAuthTokenManager>),
}

impl Credentials {
    pub async fn authorization(&self) -> Result<HttpAuth, TransportError> {
        match self {
            Self::ApiKey(key) => Ok(HttpAuth::basic_api_key(key.clone())),
            Self::Bearer(token) => Ok(HttpAuth::BearerToken(token.clone())),
            Self::OAuth2(manager) => {
                let token = manager.access_token().await?;
                Ok(HttpAuth::Token {
                    scheme: manager.scheme().to_owned(),
                    token,
                })
            }
        }
    }

    /// Whether a rejected credential can be replaced by refreshing.
    pub const fn is_refreshable(&self) -> bool {
        matches!(self, Self::OAuth2(_))
    }

    pub async fn invalidate(&self, used: &HttpAuth) {
        if let (Self::OAuth2(manager), HttpAuth::Token { token, .. }) = (self, used) {
            manager.invalidate(token).await;
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::OAuth2(manager) => f.debug_tuple("OAuth2").field(manager).finish(),
        }
    }
}

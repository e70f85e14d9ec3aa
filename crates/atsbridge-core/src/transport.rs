//! Authenticated JSON transport shared by all provider adapters.
//!
//! Every call goes through the same loop:
//!
//! 1. wait for client-side quota ([`Throttle`]),
//! 2. resolve credentials (refreshing OAuth2 tokens when needed),
//! 3. send one attempt bounded by the request timeout,
//! 4. on failure ask the [`RetryPolicy`] whether to sleep and try again.
//!
//! A 401 on refreshable credentials invalidates the token and replays the
//! call once without consuming a retry attempt.

use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use time::format_description::well_known::Rfc2822;
use time::OffsetDateTime;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::http_client::{HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest};
use crate::provider_policy::ProviderPolicy;
use crate::retry::{AttemptFailure, RetryDecision, RetryPolicy};
use crate::throttling::Throttle;
use crate::ProviderId;

/// Per-attempt request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure class of a [`TransportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCause {
    Timeout,
    Connect,
    /// Request could not be built or sent for a non-network reason.
    Request,
    /// Vendor answered with a non-success status.
    Status,
    /// Success status with a body that is not JSON.
    Decode,
    /// OAuth2 token endpoint refused to issue an access token.
    TokenRefresh,
    /// Next-page link points outside the configured provider origin.
    ForeignHost,
}

/// Transport failure carrying the HTTP status (if any) and its cause.
///
/// The vendor body is kept for the normalizer only; `Display` and `Debug`
/// never render it.
#[derive(Clone)]
pub struct TransportError {
    cause: TransportCause,
    status: Option<u16>,
    retry_after: Option<Duration>,
    message: String,
    body: Option<Value>,
}

impl TransportError {
    fn new(cause: TransportCause, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            cause,
            status,
            retry_after: None,
            message: message.into(),
            body: None,
        }
    }

    pub fn status_error(status: u16, retry_after: Option<Duration>, body: Option<Value>) -> Self {
        Self {
            retry_after,
            body,
            ..Self::new(
                TransportCause::Status,
                Some(status),
                format!("vendor responded with status {status}"),
            )
        }
    }

    pub fn decode(status: u16, message: impl Into<String>) -> Self {
        Self::new(TransportCause::Decode, Some(status), message)
    }

    pub fn token_refresh(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::new(TransportCause::TokenRefresh, status, message)
    }

    pub fn foreign_host() -> Self {
        Self::new(
            TransportCause::ForeignHost,
            None,
            "next-page link points outside the provider base URL",
        )
    }

    pub fn request(message: impl Into<String>) -> Self {
        Self::new(TransportCause::Request, None, message)
    }

    pub const fn cause(&self) -> TransportCause {
        self.cause
    }

    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    pub const fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub(crate) fn vendor_body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// View of this error as consumed by the retry policy.
    pub fn failure(&self) -> AttemptFailure {
        match (self.cause, self.status) {
            (TransportCause::Timeout, _) => AttemptFailure::Timeout,
            (TransportCause::Connect, _) => AttemptFailure::Connect,
            (TransportCause::Status, Some(code)) => AttemptFailure::Status {
                code,
                retry_after: self.retry_after,
            },
            _ => AttemptFailure::Fatal,
        }
    }
}

impl From<HttpError> for TransportError {
    fn from(error: HttpError) -> Self {
        let cause = match error.kind() {
            HttpErrorKind::Timeout => TransportCause::Timeout,
            HttpErrorKind::Connect => TransportCause::Connect,
            HttpErrorKind::Request => TransportCause::Request,
        };
        Self::new(cause, None, error.message())
    }
}

impl Debug for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportError")
            .field("cause", &self.cause)
            .field("status", &self.status)
            .field("retry_after", &self.retry_after)
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.status {
            Some(status) if self.cause != TransportCause::Status => {
                write!(f, "{} (status {status})", self.message)
            }
            _ => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for TransportError {}

/// Successful vendor response with its JSON body parsed.
///
/// An empty body (e.g. `204 No Content`) parses to `Value::Null`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Value,
}

impl TransportResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// HTTP transport bound to one provider base URL and credential set.
#[derive(Clone)]
pub struct Transport {
    provider: ProviderId,
    base_url: Url,
    http_client: Arc<dyn HttpClient>,
    credentials: Credentials,
    retry: RetryPolicy,
    timeout: Duration,
    throttle: Option<Throttle>,
}

impl Transport {
    /// Transport with default timeout, retry policy and provider throttle.
    pub fn new(
        provider: ProviderId,
        base_url: Url,
        http_client: Arc<dyn HttpClient>,
        credentials: Credentials,
    ) -> Self {
        Self {
            provider,
            base_url,
            http_client,
            credentials,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            throttle: Some(Throttle::from_policy(&ProviderPolicy::default_for(provider))),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the client-side throttle; `None` disables pacing.
    pub fn with_throttle(mut self, throttle: Option<Throttle>) -> Self {
        self.throttle = throttle;
        self
    }

    pub const fn provider(&self) -> ProviderId {
        self.provider
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds the absolute URL for a call.
    ///
    /// Relative paths are appended to the base URL. Absolute URLs (next-page
    /// links) are accepted only on the base URL's origin so credentials are
    /// never sent to another host.
    pub fn resolve(&self, path: &str, params: &[(&str, String)]) -> Result<Url, TransportError> {
        let mut url = if path.starts_with("http://") || path.starts_with("https://") {
            let url = Url::parse(path).map_err(|_| TransportError::request("next-page link is not a valid URL"))?;
            if url.origin() != self.base_url.origin() {
                return Err(TransportError::foreign_host());
            }
            url
        } else {
            let joined = format!(
                "{}/{}",
                self.base_url.as_str().trim_end_matches('/'),
                path.trim_start_matches('/')
            );
            Url::parse(&joined).map_err(|_| TransportError::request("request path is not valid"))?
        };

        if !params.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (name, value) in params {
                pairs.append_pair(name, value);
            }
        }

        Ok(url)
    }

    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<TransportResponse, TransportError> {
        self.request(HttpMethod::Get, path, params, None, &[]).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        self.request(HttpMethod::Post, path, &[], Some(body), headers)
            .await
    }

    /// Issues one logical call, retrying transient failures per the policy.
    pub async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        params: &[(&str, String)],
        body: Option<&Value>,
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        let url = self.resolve(path, params)?;
        let mut attempt: u32 = 1;
        let mut refreshed = false;

        loop {
            if let Some(throttle) = &self.throttle {
                if let Err(wait) = throttle.try_acquire() {
                    debug!(
                        provider = %self.provider,
                        wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                        "client-side quota exhausted, waiting"
                    );
                    throttle.until_ready().await;
                }
            }

            let auth = match self.credentials.authorization().await {
                Ok(auth) => auth,
                // Nothing reached the vendor yet, so a token fetch is always safe to replay.
                Err(error) => {
                    if self.back_off(HttpMethod::Get, &url, attempt, &error).await {
                        attempt += 1;
                        continue;
                    }
                    return Err(error);
                }
            };
            debug!(
                provider = %self.provider,
                method = %method,
                path = url.path(),
                attempt,
                "sending vendor request"
            );

            let error = match self.attempt_once(method, &url, body, headers, &auth).await {
                Ok(response) => return Ok(response),
                Err(error) => error,
            };

            if error.status() == Some(401) && self.credentials.is_refreshable() && !refreshed {
                refreshed = true;
                warn!(
                    provider = %self.provider,
                    path = url.path(),
                    "access token rejected, refreshing once"
                );
                self.credentials.invalidate(&auth).await;
                continue;
            }

            if !self.back_off(method, &url, attempt, &error).await {
                if error.status() == Some(429) {
                    warn!(provider = %self.provider, attempt, "vendor rate limit not cleared");
                }
                return Err(error);
            }
            attempt += 1;
        }
    }

    /// Sleeps out the policy delay; `false` means the failure is final.
    async fn back_off(
        &self,
        method: HttpMethod,
        url: &Url,
        attempt: u32,
        error: &TransportError,
    ) -> bool {
        match self.retry.decide(method, attempt, error.failure()) {
            RetryDecision::Retry { delay } => {
                warn!(
                    provider = %self.provider,
                    method = %method,
                    path = url.path(),
                    attempt,
                    status = error.status(),
                    cause = ?error.cause(),
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "transient vendor failure, backing off"
                );
                tokio::time::sleep(delay).await;
                true
            }
            RetryDecision::GiveUp => false,
        }
    }

    async fn attempt_once(
        &self,
        method: HttpMethod,
        url: &Url,
        body: Option<&Value>,
        headers: &[(&str, &str)],
        auth: &HttpAuth,
    ) -> Result<TransportResponse, TransportError> {
        let mut request = HttpRequest::new(method, url.as_str())
            .with_timeout(self.timeout)
            .with_header("accept", "application/json");
        for (name, value) in headers {
            request = request.with_header(*name, *value);
        }
        if let Some(body) = body {
            request = request.with_json_body(body);
        }
        let request = request.with_auth(auth);

        let response = self.http_client.execute(request).await?;

        if !response.is_success() {
            let retry_after = response.header("retry-after").and_then(parse_retry_after);
            let body = serde_json::from_str::<Value>(&response.body).ok();
            return Err(TransportError::status_error(response.status, retry_after, body));
        }

        let body = if response.body.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.body).map_err(|_| {
                TransportError::decode(response.status, "vendor response body is not valid JSON")
            })?
        };

        Ok(TransportResponse {
            status: response.status,
            headers: response.headers,
            body,
        })
    }
}

impl Debug for Transport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("provider", &self.provider)
            .field("base_url", &self.base_url.as_str())
            .field("credentials", &self.credentials)
            .field("retry", &self.retry)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Parses `Retry-After` as delta-seconds or an HTTP date.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(Duration::from_secs(seconds));
    }

    let at = OffsetDateTime::parse(value, &Rfc2822).ok()?;
    let remaining = at - OffsetDateTime::now_utc();
    if remaining.is_positive() {
        Duration::try_from(remaining).ok()
    } else {
        Some(Duration::ZERO)
    }
}

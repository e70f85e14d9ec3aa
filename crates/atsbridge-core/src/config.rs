//! Provider selection and credentials.
//!
//! | Variable | Purpose | Default |
//! |----------|---------|---------|
//! | `ATS_PROVIDER` | provider name | `greenhouse` |
//! | `ATS_API_KEY` | Greenhouse key (Workable fallback) | |
//! | `ATS_BASE_URL` | base URL override | per provider |
//! | `GREENHOUSE_ON_BEHALF_OF` | Greenhouse user id for writes | |
//! | `WORKABLE_API_KEY` | Workable bearer token | |
//! | `WORKABLE_SUBDOMAIN` | Workable account subdomain | |
//! | `ZOHO_CLIENT_ID` / `ZOHO_CLIENT_SECRET` / `ZOHO_REFRESH_TOKEN` | Zoho OAuth2 | |
//! | `ZOHO_REGION` | Zoho data center TLD | `com` |
//! | `ZOHO_ACCOUNTS_URL` | Zoho OAuth2 accounts server | `https://accounts.zoho.<region>` |
//! | `ATS_TIMEOUT_SECS` | per-attempt timeout | `30` |
//! | `ATS_MAX_ATTEMPTS` | attempts per call | `3` |
//! | `ATS_MAX_PAGES` | pagination cap | `1000` |

use std::fmt::{Debug, Formatter};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::auth::Credentials;
use crate::http_client::HttpClient;
use crate::pagination::DEFAULT_MAX_PAGES;
use crate::provider_policy::ProviderPolicy;
use crate::retry::RetryPolicy;
use crate::throttling::Throttle;
use crate::transport::{Transport, DEFAULT_TIMEOUT};
use crate::{ConfigError, ProviderId};

/// Runtime configuration for adapter construction.
#[derive(Clone)]
pub struct AtsConfig {
    pub provider: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub greenhouse_on_behalf_of: Option<String>,
    pub workable_api_key: Option<String>,
    pub workable_subdomain: Option<String>,
    pub zoho_client_id: Option<String>,
    pub zoho_client_secret: Option<String>,
    pub zoho_refresh_token: Option<String>,
    pub zoho_region: String,
    pub zoho_accounts_url: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    pub max_pages: usize,
    /// Client-side pacing per [`ProviderPolicy`].
    pub throttle: bool,
}

impl Default for AtsConfig {
    fn default() -> Self {
        Self {
            provider: ProviderId::Greenhouse.as_str().to_owned(),
            api_key: None,
            base_url: None,
            greenhouse_on_behalf_of: None,
            workable_api_key: None,
            workable_subdomain: None,
            zoho_client_id: None,
            zoho_client_secret: None,
            zoho_refresh_token: None,
            zoho_region: String::from("com"),
            zoho_accounts_url: None,
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
            max_pages: DEFAULT_MAX_PAGES,
            throttle: true,
        }
    }
}

impl AtsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        let timeout = parse_setting::<u64>(get("ATS_TIMEOUT_SECS"), "ATS_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);
        let retry = match parse_setting::<u32>(get("ATS_MAX_ATTEMPTS"), "ATS_MAX_ATTEMPTS")? {
            Some(0) => {
                return Err(ConfigError::InvalidSetting {
                    name: "ATS_MAX_ATTEMPTS",
                    value: String::from("0"),
                })
            }
            Some(attempts) => defaults.retry.clone().with_max_attempts(attempts),
            None => defaults.retry.clone(),
        };
        let max_pages = parse_setting::<usize>(get("ATS_MAX_PAGES"), "ATS_MAX_PAGES")?
            .unwrap_or(defaults.max_pages);

        Ok(Self {
            provider: get("ATS_PROVIDER")
                .map(|name| name.to_ascii_lowercase())
                .unwrap_or(defaults.provider),
            api_key: get("ATS_API_KEY"),
            base_url: get("ATS_BASE_URL"),
            greenhouse_on_behalf_of: get("GREENHOUSE_ON_BEHALF_OF"),
            workable_api_key: get("WORKABLE_API_KEY"),
            workable_subdomain: get("WORKABLE_SUBDOMAIN"),
            zoho_client_id: get("ZOHO_CLIENT_ID"),
            zoho_client_secret: get("ZOHO_CLIENT_SECRET"),
            zoho_refresh_token: get("ZOHO_REFRESH_TOKEN"),
            zoho_region: get("ZOHO_REGION").unwrap_or(defaults.zoho_region),
            zoho_accounts_url: get("ZOHO_ACCOUNTS_URL"),
            timeout,
            retry,
            max_pages,
            throttle: defaults.throttle,
        })
    }

    pub fn for_provider(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_on_behalf_of(mut self, user_id: impl Into<String>) -> Self {
        self.greenhouse_on_behalf_of = Some(user_id.into());
        self
    }

    pub fn with_workable(mut self, subdomain: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.workable_subdomain = Some(subdomain.into());
        self.workable_api_key = Some(api_key.into());
        self
    }

    pub fn with_zoho_oauth(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        self.zoho_client_id = Some(client_id.into());
        self.zoho_client_secret = Some(client_secret.into());
        self.zoho_refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_zoho_region(mut self, region: impl Into<String>) -> Self {
        self.zoho_region = region.into();
        self
    }

    pub fn with_zoho_accounts_url(mut self, accounts_url: impl Into<String>) -> Self {
        self.zoho_accounts_url = Some(accounts_url.into());
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn without_throttling(mut self) -> Self {
        self.throttle = false;
        self
    }

    /// Parses the configured provider name.
    pub fn provider_id(&self) -> Result<ProviderId, ConfigError> {
        ProviderId::from_str(&self.provider).map_err(|_| ConfigError::UnsupportedProvider {
            name: self.provider.clone(),
            supported: supported_providers(),
        })
    }

    /// Base URL for the provider: the override when set, otherwise the
    /// vendor's public API root.
    pub fn base_url_for(&self, provider: ProviderId) -> Result<Url, ConfigError> {
        let raw = match (&self.base_url, provider) {
            (Some(base_url), _) => base_url.clone(),
            (None, ProviderId::Greenhouse) => String::from("https://harvest.greenhouse.io/v1"),
            (None, ProviderId::ZohoRecruit) => format!("{}/recruit/v2", self.zoho_portal_url()),
            (None, ProviderId::Workable) => {
                let subdomain = require(self.workable_subdomain.as_deref(), "WORKABLE_SUBDOMAIN")?;
                format!("https://{subdomain}.workable.com/spi/v3")
            }
        };

        Url::parse(&raw)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
            .ok_or(ConfigError::InvalidBaseUrl {
                provider: provider.as_str(),
            })
    }

    /// Zoho OAuth2 accounts server: the override when set, otherwise the
    /// regional default.
    pub fn zoho_accounts_url(&self) -> String {
        match &self.zoho_accounts_url {
            Some(url) => url.trim_end_matches('/').to_owned(),
            None => format!("https://accounts.zoho.{}", self.zoho_region),
        }
    }

    /// Zoho Recruit web portal for the configured region.
    pub fn zoho_portal_url(&self) -> String {
        format!("https://recruit.zoho.{}", self.zoho_region)
    }

    /// Transport for the provider with the configured timeout, retry policy
    /// and throttling.
    pub fn transport(
        &self,
        provider: ProviderId,
        base_url: Url,
        http_client: Arc<dyn HttpClient>,
        credentials: Credentials,
    ) -> Transport {
        let throttle = self
            .throttle
            .then(|| Throttle::from_policy(&ProviderPolicy::default_for(provider)));

        Transport::new(provider, base_url, http_client, credentials)
            .with_timeout(self.timeout)
            .with_retry_policy(self.retry.clone())
            .with_throttle(throttle)
    }
}

impl Debug for AtsConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("AtsConfig")
            .field("provider", &self.provider)
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("greenhouse_on_behalf_of", &self.greenhouse_on_behalf_of)
            .field("workable_api_key", &redact(&self.workable_api_key))
            .field("workable_subdomain", &self.workable_subdomain)
            .field("zoho_client_id", &redact(&self.zoho_client_id))
            .field("zoho_client_secret", &redact(&self.zoho_client_secret))
            .field("zoho_refresh_token", &redact(&self.zoho_refresh_token))
            .field("zoho_region", &self.zoho_region)
            .field("zoho_accounts_url", &self.zoho_accounts_url)
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .field("max_pages", &self.max_pages)
            .field("throttle", &self.throttle)
            .finish()
    }
}

/// Returns the setting or a [`ConfigError::MissingSetting`] naming it.
pub fn require<'a>(value: Option<&'a str>, name: &'static str) -> Result<&'a str, ConfigError> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::MissingSetting { name })
}

pub(crate) fn supported_providers() -> String {
    ProviderId::ALL
        .iter()
        .map(|provider| provider.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn parse_setting<T: FromStr>(
    value: Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|_| ConfigError::InvalidSetting { name, value: raw })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect::<HashMap<_, _>>();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AtsConfig::from_lookup(lookup(&[])).expect("empty env is valid");

        assert_eq!(config.provider, "greenhouse");
        assert_eq!(config.zoho_region, "com");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.max_pages, 1_000);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn reads_overrides_and_ignores_blank_values() {
        let config = AtsConfig::from_lookup(lookup(&[
            ("ATS_PROVIDER", " Workable "),
            ("ATS_API_KEY", "   "),
            ("WORKABLE_SUBDOMAIN", "acme"),
            ("ATS_MAX_ATTEMPTS", "5"),
            ("ATS_TIMEOUT_SECS", "12"),
        ]))
        .expect("valid env");

        assert_eq!(config.provider, "workable");
        assert!(config.api_key.is_none());
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(
            config
                .base_url_for(ProviderId::Workable)
                .expect("workable url")
                .as_str(),
            "https://acme.workable.com/spi/v3"
        );
    }

    #[test]
    fn rejects_non_numeric_limits() {
        let error = AtsConfig::from_lookup(lookup(&[("ATS_MAX_PAGES", "lots")]))
            .expect_err("not a number");

        assert_eq!(
            error,
            ConfigError::InvalidSetting {
                name: "ATS_MAX_PAGES",
                value: String::from("lots"),
            }
        );
    }

    #[test]
    fn zoho_urls_follow_region() {
        let config = AtsConfig::for_provider("zoho_recruit").with_zoho_region("eu");

        assert_eq!(config.zoho_accounts_url(), "https://accounts.zoho.eu");
        assert_eq!(
            config
                .base_url_for(ProviderId::ZohoRecruit)
                .expect("zoho url")
                .as_str(),
            "https://recruit.zoho.eu/recruit/v2"
        );
    }

    #[test]
    fn workable_without_subdomain_names_the_missing_setting() {
        let config = AtsConfig::for_provider("workable");

        assert_eq!(
            config.base_url_for(ProviderId::Workable),
            Err(ConfigError::MissingSetting {
                name: "WORKABLE_SUBDOMAIN"
            })
        );
    }

    #[test]
    fn unknown_provider_lists_supported_names() {
        let error = AtsConfig::for_provider("lever")
            .provider_id()
            .expect_err("lever is not registered");

        assert!(error.to_string().contains("greenhouse, workable, zoho_recruit"));
    }

    #[test]
    fn debug_redacts_credentials() {
        let config = AtsConfig::for_provider("zoho_recruit")
            .with_api_key("gh-secret")
            .with_zoho_oauth("cid", "zoho-secret", "refresh-secret");
        let rendered = format!("{config:?}");

        for secret in ["gh-secret", "zoho-secret", "refresh-secret"] {
            assert!(!rendered.contains(secret));
        }
    }
}

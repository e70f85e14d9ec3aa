//! Adapter selection.
//!
//! The registry is an explicit value built at startup and lent to the
//! factory, so tests can register fakes without touching process state.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::info;

use crate::adapter::AtsAdapter;
use crate::adapters::{GreenhouseAdapter, WorkableAdapter, ZohoRecruitAdapter};
use crate::config::AtsConfig;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::{AtsError, ConfigError, ProviderId};

/// Builds an adapter from configuration. Must not perform network I/O.
pub type AdapterConstructor =
    fn(&AtsConfig, Arc<dyn HttpClient>) -> Result<Arc<dyn AtsAdapter>, ConfigError>;

/// Provider name to constructor mapping.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    constructors: BTreeMap<ProviderId, AdapterConstructor>,
}

impl AdapterRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every built-in provider.
    pub fn standard() -> Self {
        Self::empty()
            .register(ProviderId::Greenhouse, build_greenhouse)
            .register(ProviderId::Workable, build_workable)
            .register(ProviderId::ZohoRecruit, build_zoho_recruit)
    }

    pub fn register(mut self, provider: ProviderId, constructor: AdapterConstructor) -> Self {
        self.constructors.insert(provider, constructor);
        self
    }

    /// Registered providers in stable order.
    pub fn providers(&self) -> Vec<ProviderId> {
        self.constructors.keys().copied().collect()
    }

    pub fn get(&self, provider: ProviderId) -> Option<AdapterConstructor> {
        self.constructors.get(&provider).copied()
    }
}

fn build_greenhouse(
    config: &AtsConfig,
    http_client: Arc<dyn HttpClient>,
) -> Result<Arc<dyn AtsAdapter>, ConfigError> {
    Ok(Arc::new(GreenhouseAdapter::from_config(config, http_client)?))
}

fn build_workable(
    config: &AtsConfig,
    http_client: Arc<dyn HttpClient>,
) -> Result<Arc<dyn AtsAdapter>, ConfigError> {
    Ok(Arc::new(WorkableAdapter::from_config(config, http_client)?))
}

fn build_zoho_recruit(
    config: &AtsConfig,
    http_client: Arc<dyn HttpClient>,
) -> Result<Arc<dyn AtsAdapter>, ConfigError> {
    Ok(Arc::new(ZohoRecruitAdapter::from_config(config, http_client)?))
}

/// Resolves the configured provider to a ready adapter.
///
/// ```rust,ignore
/// use atsbridge_core::{AdapterFactory, AdapterRegistry, AtsConfig};
///
/// let registry = AdapterRegistry::standard();
/// let config = AtsConfig::from_env()?;
/// let adapter = AdapterFactory::new(&registry, config).get_adapter()?;
/// let jobs = adapter.get_jobs(None).await?;
/// ```
pub struct AdapterFactory<'r> {
    registry: &'r AdapterRegistry,
    config: AtsConfig,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl<'r> AdapterFactory<'r> {
    pub fn new(registry: &'r AdapterRegistry, config: AtsConfig) -> Self {
        Self {
            registry,
            config,
            http_client: None,
        }
    }

    /// Shares one connection pool across adapters, or injects a fake in tests.
    pub fn with_http_client(mut self, http_client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(http_client);
        self
    }

    pub fn config(&self) -> &AtsConfig {
        &self.config
    }

    pub fn get_adapter(&self) -> Result<Arc<dyn AtsAdapter>, AtsError> {
        let provider = self.config.provider_id()?;
        let Some(constructor) = self.registry.get(provider) else {
            return Err(ConfigError::UnsupportedProvider {
                name: provider.to_string(),
                supported: self
                    .registry
                    .providers()
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            }
            .into());
        };

        let http_client = match &self.http_client {
            Some(client) => Arc::clone(client),
            None => Arc::new(ReqwestHttpClient::new()),
        };
        let adapter = constructor(&self.config, http_client)?;
        info!(provider = %provider, "constructed ats adapter");
        Ok(adapter)
    }
}

impl std::fmt::Debug for AdapterFactory<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterFactory")
            .field("providers", &self.registry.providers())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

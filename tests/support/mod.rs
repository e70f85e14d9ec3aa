//! Shared fixtures for the wiremock-backed integration tests.
#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use atsbridge_core::{AdapterFactory, AdapterRegistry, AtsAdapter, AtsConfig, RetryPolicy};
use serde_json::{json, Value};
use wiremock::{MockServer, Request};

pub const GREENHOUSE_KEY: &str = "gh-secret-key-123";
pub const WORKABLE_TOKEN: &str = "wk-secret-token-456";
pub const ZOHO_CLIENT_SECRET: &str = "zoho-client-secret-789";
pub const ZOHO_REFRESH_TOKEN: &str = "zoho-refresh-token-000";

/// Three attempts with millisecond waits.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::default().with_waits(
        Duration::from_millis(1),
        Duration::from_millis(1),
        Duration::from_millis(5),
    )
}

pub fn greenhouse_config(server: &MockServer) -> AtsConfig {
    AtsConfig::for_provider("greenhouse")
        .with_api_key(GREENHOUSE_KEY)
        .with_base_url(format!("{}/v1", server.uri()))
        .with_retry_policy(fast_retry())
        .without_throttling()
}

pub fn workable_config(server: &MockServer) -> AtsConfig {
    AtsConfig::for_provider("workable")
        .with_workable("acme", WORKABLE_TOKEN)
        .with_base_url(format!("{}/spi/v3", server.uri()))
        .with_retry_policy(fast_retry())
        .without_throttling()
}

pub fn zoho_config(server: &MockServer) -> AtsConfig {
    AtsConfig::for_provider("zoho_recruit")
        .with_zoho_oauth("zoho-client-id", ZOHO_CLIENT_SECRET, ZOHO_REFRESH_TOKEN)
        .with_zoho_accounts_url(server.uri())
        .with_base_url(format!("{}/recruit/v2", server.uri()))
        .with_retry_policy(fast_retry())
        .without_throttling()
}

pub fn adapter(config: AtsConfig) -> Arc<dyn AtsAdapter> {
    let registry = AdapterRegistry::standard();
    AdapterFactory::new(&registry, config)
        .get_adapter()
        .expect("adapter should build from test config")
}

pub fn greenhouse_job(id: u64, status: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Role {id}"),
        "status": status,
        "offices": [{"name": "Berlin"}],
    })
}

pub fn zoho_token(access_token: &str) -> Value {
    json!({
        "access_token": access_token,
        "expires_in": 3600,
        "api_domain": "https://www.zohoapis.com",
        "token_type": "Bearer",
    })
}

pub async fn requests(server: &MockServer) -> Vec<Request> {
    server
        .received_requests()
        .await
        .expect("request recording should be enabled")
}

pub fn header<'r>(request: &'r Request, name: &str) -> Option<&'r str> {
    request
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
}

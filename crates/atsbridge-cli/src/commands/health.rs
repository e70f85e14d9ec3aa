use atsbridge_core::{AtsAdapter, AtsError, ProviderId};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

#[derive(Debug, Serialize)]
struct HealthResponseData {
    provider: ProviderId,
    healthy: bool,
}

/// An unhealthy provider surfaces as a connection error with a non-zero exit.
pub async fn run(adapter: &dyn AtsAdapter) -> Result<Value, CliError> {
    let provider = adapter.provider();
    if !adapter.health_check().await {
        return Err(AtsError::connection(format!("{provider} health check failed"))
            .with_detail("provider", provider.as_str())
            .into());
    }

    Ok(serde_json::to_value(HealthResponseData {
        provider,
        healthy: true,
    })?)
}

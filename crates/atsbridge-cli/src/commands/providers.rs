use atsbridge_core::{AdapterRegistry, ProviderId};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ProvidersResponseData {
    providers: Vec<ProviderId>,
}

pub fn run(registry: &AdapterRegistry) -> Result<Value, CliError> {
    let data = ProvidersResponseData {
        providers: registry.providers(),
    };
    Ok(serde_json::to_value(data)?)
}

mod applications;
mod apply;
mod health;
mod jobs;
mod providers;

use std::sync::Arc;

use atsbridge_core::{AdapterFactory, AdapterRegistry, AtsAdapter, AtsConfig};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

pub async fn run(cli: &Cli) -> Result<Value, CliError> {
    let registry = AdapterRegistry::standard();

    match &cli.command {
        Command::Providers => providers::run(&registry),
        Command::Jobs(args) => jobs::run(args, adapter(cli, &registry)?.as_ref()).await,
        Command::Apply(args) => apply::run(args, adapter(cli, &registry)?.as_ref()).await,
        Command::Applications(args) => {
            applications::run(args, adapter(cli, &registry)?.as_ref()).await
        }
        Command::Health => health::run(adapter(cli, &registry)?.as_ref()).await,
    }
}

fn adapter(cli: &Cli, registry: &AdapterRegistry) -> Result<Arc<dyn AtsAdapter>, CliError> {
    let mut config = AtsConfig::from_env()?;
    if let Some(provider) = &cli.provider {
        config.provider = provider.trim().to_ascii_lowercase();
    }

    Ok(AdapterFactory::new(registry, config).get_adapter()?)
}

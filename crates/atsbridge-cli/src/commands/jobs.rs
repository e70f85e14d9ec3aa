use atsbridge_core::{AtsAdapter, Job, ProviderId};
use serde::Serialize;
use serde_json::Value;

use crate::cli::JobsArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct JobsResponseData {
    provider: ProviderId,
    count: usize,
    jobs: Vec<Job>,
}

pub async fn run(args: &JobsArgs, adapter: &dyn AtsAdapter) -> Result<Value, CliError> {
    let jobs = adapter.get_jobs(args.status).await?;

    let data = JobsResponseData {
        provider: adapter.provider(),
        count: jobs.len(),
        jobs,
    };
    Ok(serde_json::to_value(data)?)
}

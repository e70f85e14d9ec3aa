use atsbridge_core::{Application, AtsAdapter};
use serde::Serialize;
use serde_json::Value;

use crate::cli::ApplicationsArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ApplicationsResponseData<'a> {
    job_id: &'a str,
    count: usize,
    applications: Vec<Application>,
}

pub async fn run(args: &ApplicationsArgs, adapter: &dyn AtsAdapter) -> Result<Value, CliError> {
    let applications = adapter.get_applications(&args.job_id).await?;

    let data = ApplicationsResponseData {
        job_id: args.job_id.trim(),
        count: applications.len(),
        applications,
    };
    Ok(serde_json::to_value(data)?)
}

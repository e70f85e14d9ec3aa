use atsbridge_core::{AtsAdapter, CandidateCreate};
use serde_json::Value;

use crate::cli::ApplyArgs;
use crate::error::CliError;

/// Builds the validated submission; fails before any adapter call.
fn candidate(args: &ApplyArgs) -> Result<CandidateCreate, CliError> {
    let mut candidate = CandidateCreate::new(&args.name, &args.email, &args.job_id)?;
    if let Some(phone) = &args.phone {
        candidate = candidate.with_phone(phone)?;
    }
    if let Some(resume_url) = &args.resume_url {
        candidate = candidate.with_resume_url(resume_url)?;
    }
    Ok(candidate)
}

pub async fn run(args: &ApplyArgs, adapter: &dyn AtsAdapter) -> Result<Value, CliError> {
    let candidate = candidate(args)?;
    let created = adapter.create_candidate(&candidate).await?;
    Ok(serde_json::to_value(created)?)
}

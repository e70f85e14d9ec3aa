//! Unified adapter contract implemented by every ATS provider.
//!
//! # Example
//!
//! ```rust,no_run
//! use atsbridge_core::{AtsAdapter, AtsError, JobStatus};
//!
//! async fn open_jobs(adapter: &dyn AtsAdapter) -> Result<usize, AtsError> {
//!     let jobs = adapter.get_jobs(Some(JobStatus::Open)).await?;
//!     Ok(jobs.len())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::{Application, AtsError, CandidateCreate, CandidateResponse, Job, JobStatus, ProviderId};

pub type AdapterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AtsError>> + Send + 'a>>;

/// Provider adapter.
///
/// Implementations translate each operation into vendor requests and map the
/// vendor records back into the unified domain. Every failure is reported as
/// a normalized [`AtsError`]; no vendor payload or status string escapes.
pub trait AtsAdapter: Send + Sync {
    fn provider(&self) -> ProviderId;

    /// Fetches every page of jobs, optionally keeping only one unified status.
    fn get_jobs<'a>(&'a self, status: Option<JobStatus>) -> AdapterFuture<'a, Vec<Job>>;

    /// Submits a candidate for a job with a single vendor write.
    fn create_candidate<'a>(
        &'a self,
        candidate: &'a CandidateCreate,
    ) -> AdapterFuture<'a, CandidateResponse>;

    /// Fetches every page of applications for a job.
    fn get_applications<'a>(&'a self, job_id: &'a str) -> AdapterFuture<'a, Vec<Application>>;

    /// Cheapest authenticated call; `true` only on a successful response.
    fn health_check<'a>(&'a self) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;
}

/// Rejects a blank job id before any network call.
pub fn require_job_id(job_id: &str) -> Result<&str, AtsError> {
    let job_id = job_id.trim();
    if job_id.is_empty() {
        return Err(AtsError::validation("job_id is required").with_detail("field", "job_id"));
    }
    Ok(job_id)
}

/// Post-mapping status filter.
pub fn filter_by_status(jobs: Vec<Job>, status: Option<JobStatus>) -> Vec<Job> {
    match status {
        Some(status) => jobs.into_iter().filter(|job| job.status == status).collect(),
        None => jobs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    fn job(id: &str, status: JobStatus) -> Job {
        Job {
            id: id.to_owned(),
            title: String::from("Engineer"),
            location: String::from("Remote"),
            status,
            external_url: format!("https://jobs.example.test/{id}"),
        }
    }

    #[test]
    fn blank_job_id_is_a_validation_error() {
        let error = require_job_id("   ").expect_err("blank id");

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(require_job_id(" 42 ").expect("trimmed id"), "42");
    }

    #[test]
    fn filters_on_unified_status() {
        let jobs = vec![
            job("1", JobStatus::Open),
            job("2", JobStatus::Closed),
            job("3", JobStatus::Open),
        ];

        let open = filter_by_status(jobs.clone(), Some(JobStatus::Open));
        assert_eq!(open.iter().map(|j| j.id.as_str()).collect::<Vec<_>>(), ["1", "3"]);
        assert_eq!(filter_by_status(jobs, None).len(), 3);
    }
}

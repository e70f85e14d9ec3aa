//! Workable SPI v3 adapter.
//!
//! Bearer token auth, jobs keyed by `shortcode`, and body-embedded
//! `paging.next` links. A candidate created under a job is its application,
//! so both ids in [`CandidateResponse`] are the Workable candidate id.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::adapter::{filter_by_status, require_job_id, AdapterFuture, AtsAdapter};
use crate::adapters::{array_at, decode_records, id_at, lookup_status, non_empty, RecordId};
use crate::auth::Credentials;
use crate::config::{require, AtsConfig};
use crate::http_client::HttpClient;
use crate::normalizer::ErrorNormalizer;
use crate::pagination::{collect_all, Page, PageCursor, PaginationStrategy, DEFAULT_MAX_PAGES};
use crate::provider_policy::ProviderPolicy;
use crate::transport::Transport;
use crate::{
    Application, ApplicationStatus, AtsError, CandidateCreate, CandidateResponse, ConfigError, Job,
    JobStatus, ProviderId,
};

const JOB_STATES: [(&str, JobStatus); 4] = [
    ("published", JobStatus::Open),
    ("closed", JobStatus::Closed),
    ("archived", JobStatus::Closed),
    ("draft", JobStatus::Draft),
];

const STAGES: [(&str, ApplicationStatus); 10] = [
    ("sourced", ApplicationStatus::Applied),
    ("applied", ApplicationStatus::Applied),
    ("phone screen", ApplicationStatus::Screening),
    ("screening", ApplicationStatus::Screening),
    ("assessment", ApplicationStatus::Screening),
    ("interview", ApplicationStatus::Screening),
    ("offer", ApplicationStatus::Screening),
    ("hired", ApplicationStatus::Hired),
    ("rejected", ApplicationStatus::Rejected),
    ("disqualified", ApplicationStatus::Rejected),
];

#[derive(Debug, Deserialize)]
struct WorkableJob {
    shortcode: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    location: Option<WorkableLocation>,
}

#[derive(Debug, Deserialize)]
struct WorkableLocation {
    #[serde(default)]
    location_str: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WorkableCandidate {
    id: RecordId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    stage: Option<String>,
    #[serde(default)]
    disqualified: Option<bool>,
}

/// Workable adapter.
#[derive(Debug, Clone)]
pub struct WorkableAdapter {
    transport: Transport,
    normalizer: ErrorNormalizer,
    page_size: usize,
    max_pages: usize,
}

impl WorkableAdapter {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            normalizer: ErrorNormalizer::new(ProviderId::Workable),
            page_size: ProviderPolicy::workable_default().page_size,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    /// Uses `WORKABLE_API_KEY`, falling back to `ATS_API_KEY`.
    pub fn from_config(
        config: &AtsConfig,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, ConfigError> {
        let token = require(
            config
                .workable_api_key
                .as_deref()
                .or(config.api_key.as_deref()),
            "WORKABLE_API_KEY",
        )?;
        let base_url = config.base_url_for(ProviderId::Workable)?;
        let transport = config.transport(
            ProviderId::Workable,
            base_url,
            http_client,
            Credentials::Bearer(token.to_owned()),
        );

        Ok(Self::new(transport).with_max_pages(config.max_pages))
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn fetch_all(&self, path: String, collection: &'static str) -> Result<Vec<Value>, AtsError> {
        let params = vec![("limit", self.page_size.to_string())];
        let pointer = format!("/{collection}");

        collect_all(PaginationStrategy::NextLink, self.max_pages, |cursor| {
            let target = match cursor {
                PageCursor::Link(link) => (link, Vec::new()),
                _ => (path.clone(), params.clone()),
            };
            let pointer = pointer.clone();
            async move {
                let (target, params) = target;
                let response = self
                    .transport
                    .get(&target, &params)
                    .await
                    .map_err(|error| self.normalizer.normalize(error))?;

                let items = array_at(&response.body, &pointer);
                let next = response
                    .body
                    .pointer("/paging/next")
                    .and_then(Value::as_str)
                    .map(str::to_owned);
                Ok(Page::new(items).with_next_link(next))
            }
        })
        .await
    }
}

impl AtsAdapter for WorkableAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Workable
    }

    fn get_jobs<'a>(&'a self, status: Option<JobStatus>) -> AdapterFuture<'a, Vec<Job>> {
        Box::pin(async move {
            let records = self.fetch_all(String::from("jobs"), "jobs").await?;
            let jobs = decode_records::<WorkableJob>(ProviderId::Workable, "job", records)
                .into_iter()
                .map(normalize_job)
                .collect::<Vec<_>>();

            let jobs = filter_by_status(jobs, status);
            info!(provider = "workable", count = jobs.len(), "fetched jobs");
            Ok(jobs)
        })
    }

    fn create_candidate<'a>(
        &'a self,
        candidate: &'a CandidateCreate,
    ) -> AdapterFuture<'a, CandidateResponse> {
        Box::pin(async move {
            let path = format!(
                "jobs/{}/candidates",
                urlencoding::encode(candidate.job_id())
            );
            let response = self
                .transport
                .post(&path, &candidate_payload(candidate), &[])
                .await
                .map_err(|error| self.normalizer.normalize(error))?;

            let candidate_id = id_at(&response.body, "/candidate/id").unwrap_or_default();
            let created =
                CandidateResponse::applied(candidate, candidate_id.clone(), candidate_id)?;

            info!(
                provider = "workable",
                candidate_id = %created.candidate_id,
                "created candidate"
            );
            Ok(created)
        })
    }

    fn get_applications<'a>(&'a self, job_id: &'a str) -> AdapterFuture<'a, Vec<Application>> {
        Box::pin(async move {
            let job_id = require_job_id(job_id)?;
            let path = format!("jobs/{}/candidates", urlencoding::encode(job_id));
            let records = self.fetch_all(path, "candidates").await?;
            let applications =
                decode_records::<WorkableCandidate>(ProviderId::Workable, "candidate", records)
                    .into_iter()
                    .map(normalize_application)
                    .collect::<Vec<_>>();

            info!(provider = "workable", count = applications.len(), "fetched applications");
            Ok(applications)
        })
    }

    fn health_check<'a>(&'a self) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            match self
                .transport
                .get("jobs", &[("limit", String::from("1"))])
                .await
            {
                Ok(_) => true,
                Err(error) => {
                    let error = self.normalizer.normalize(error);
                    warn!(provider = "workable", kind = %error.kind(), "health check failed");
                    false
                }
            }
        })
    }
}

fn normalize_job(raw: WorkableJob) -> Job {
    let status = raw
        .state
        .as_deref()
        .and_then(|state| lookup_status(&JOB_STATES, state))
        .unwrap_or(JobStatus::Open);
    let location = raw
        .location
        .as_ref()
        .and_then(|location| {
            non_empty(location.location_str.as_deref()).or(non_empty(location.city.as_deref()))
        })
        .unwrap_or("Remote")
        .to_owned();
    let external_url = non_empty(raw.url.as_deref())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("https://apply.workable.com/j/{}", raw.shortcode));

    Job {
        title: non_empty(raw.title.as_deref())
            .unwrap_or("Untitled Position")
            .to_owned(),
        id: raw.shortcode,
        location,
        status,
        external_url,
    }
}

fn normalize_application(raw: WorkableCandidate) -> Application {
    let status = if raw.disqualified.unwrap_or(false) {
        ApplicationStatus::Rejected
    } else {
        raw.stage
            .as_deref()
            .and_then(|stage| lookup_status(&STAGES, stage))
            .unwrap_or(ApplicationStatus::Applied)
    };

    Application {
        id: raw.id.to_string(),
        candidate_name: non_empty(raw.name.as_deref())
            .unwrap_or("Unknown")
            .to_owned(),
        email: raw.email.unwrap_or_default(),
        status,
    }
}

fn candidate_payload(candidate: &CandidateCreate) -> Value {
    let mut details = json!({
        "name": candidate.name(),
        "firstname": candidate.first_name(),
        "lastname": candidate.last_name(),
        "email": candidate.email(),
    });
    if let Some(phone) = candidate.phone() {
        details["phone"] = Value::from(phone);
    }
    if let Some(resume_url) = candidate.resume_url() {
        details["resume_url"] = Value::from(resume_url);
    }

    json!({ "sourced": false, "candidate": details })
}

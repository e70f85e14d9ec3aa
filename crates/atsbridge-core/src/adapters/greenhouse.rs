//! Greenhouse Harvest API adapter.
//!
//! Basic auth with the API key as username, `Link` header pagination, and
//! numeric job ids. Candidates are created with their application in a
//! single `POST /candidates`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::adapter::{filter_by_status, require_job_id, AdapterFuture, AtsAdapter};
use crate::adapters::{decode_records, id_at, lookup_status, non_empty, RecordId};
use crate::auth::Credentials;
use crate::config::{require, AtsConfig};
use crate::http_client::HttpClient;
use crate::normalizer::ErrorNormalizer;
use crate::pagination::{collect_all, next_link, Page, PageCursor, PaginationStrategy, DEFAULT_MAX_PAGES};
use crate::provider_policy::ProviderPolicy;
use crate::transport::Transport;
use crate::{
    Application, ApplicationStatus, AtsError, CandidateCreate, CandidateResponse, ConfigError, Job,
    JobStatus, ProviderId,
};

const JOB_STATUSES: [(&str, JobStatus); 3] = [
    ("open", JobStatus::Open),
    ("closed", JobStatus::Closed),
    ("draft", JobStatus::Draft),
];

/// Stage-name phrases matched as whole words, most specific first.
const STAGE_PATTERNS: [(&str, ApplicationStatus); 18] = [
    ("hired", ApplicationStatus::Hired),
    ("rejected", ApplicationStatus::Rejected),
    ("phone screen", ApplicationStatus::Screening),
    ("recruiter screen", ApplicationStatus::Screening),
    ("technical screen", ApplicationStatus::Screening),
    ("phone interview", ApplicationStatus::Screening),
    ("onsite interview", ApplicationStatus::Screening),
    ("final interview", ApplicationStatus::Screening),
    ("reference check", ApplicationStatus::Screening),
    ("background check", ApplicationStatus::Screening),
    ("screening", ApplicationStatus::Screening),
    ("interview", ApplicationStatus::Screening),
    ("onsite", ApplicationStatus::Screening),
    ("offer", ApplicationStatus::Screening),
    ("assessment", ApplicationStatus::Screening),
    ("application review", ApplicationStatus::Applied),
    ("applied", ApplicationStatus::Applied),
    ("new", ApplicationStatus::Applied),
];

#[derive(Debug, Deserialize)]
struct GreenhouseJob {
    id: RecordId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    offices: Option<Vec<GreenhouseNamed>>,
    #[serde(default)]
    location: Option<Value>,
    #[serde(default)]
    job_post: Option<GreenhouseJobPost>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseNamed {
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseJobPost {
    #[serde(default)]
    external_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseApplication {
    id: RecordId,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    rejected_at: Option<Value>,
    #[serde(default)]
    current_stage: Option<GreenhouseNamed>,
    #[serde(default)]
    candidate: Option<GreenhouseCandidate>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseCandidate {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    email_addresses: Option<Vec<GreenhouseValue>>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseValue {
    #[serde(default)]
    value: Option<String>,
}

/// Greenhouse adapter.
#[derive(Debug, Clone)]
pub struct GreenhouseAdapter {
    transport: Transport,
    normalizer: ErrorNormalizer,
    on_behalf_of: Option<String>,
    page_size: usize,
    max_pages: usize,
}

impl GreenhouseAdapter {
    pub fn new(transport: Transport) -> Self {
        Self {
            transport,
            normalizer: ErrorNormalizer::new(ProviderId::Greenhouse),
            on_behalf_of: None,
            page_size: ProviderPolicy::greenhouse_default().page_size,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn from_config(
        config: &AtsConfig,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, ConfigError> {
        let api_key = require(config.api_key.as_deref(), "ATS_API_KEY")?;
        let base_url = config.base_url_for(ProviderId::Greenhouse)?;
        let transport = config.transport(
            ProviderId::Greenhouse,
            base_url,
            http_client,
            Credentials::ApiKey(api_key.to_owned()),
        );

        let mut adapter = Self::new(transport).with_max_pages(config.max_pages);
        adapter.on_behalf_of = config.greenhouse_on_behalf_of.clone();
        Ok(adapter)
    }

    /// Greenhouse user id sent as `On-Behalf-Of` on writes.
    pub fn with_on_behalf_of(mut self, user_id: impl Into<String>) -> Self {
        self.on_behalf_of = Some(user_id.into());
        self
    }

    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    async fn fetch_all(
        &self,
        path: &'static str,
        params: Vec<(&'static str, String)>,
    ) -> Result<Vec<Value>, AtsError> {
        let page_size = self.page_size.to_string();
        collect_all(PaginationStrategy::NextLink, self.max_pages, |cursor| {
            let mut params = params.clone();
            params.push(("per_page", page_size.clone()));
            async move {
                let response = match cursor {
                    PageCursor::Link(link) => self.transport.get(&link, &[]).await,
                    _ => self.transport.get(path, &params).await,
                }
                .map_err(|error| self.normalizer.normalize(error))?;

                let next = response.header("link").and_then(next_link);
                let items = match response.body {
                    Value::Array(items) => items,
                    Value::Null => Vec::new(),
                    _ => {
                        return Err(AtsError::service(
                            "greenhouse returned an unexpected list payload",
                            false,
                        ))
                    }
                };
                Ok(Page::new(items).with_next_link(next))
            }
        })
        .await
    }
}

impl AtsAdapter for GreenhouseAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::Greenhouse
    }

    fn get_jobs<'a>(&'a self, status: Option<JobStatus>) -> AdapterFuture<'a, Vec<Job>> {
        Box::pin(async move {
            let records = self.fetch_all("jobs", Vec::new()).await?;
            let jobs = decode_records::<GreenhouseJob>(ProviderId::Greenhouse, "job", records)
                .into_iter()
                .map(normalize_job)
                .collect::<Vec<_>>();

            let jobs = filter_by_status(jobs, status);
            info!(provider = "greenhouse", count = jobs.len(), "fetched jobs");
            Ok(jobs)
        })
    }

    fn create_candidate<'a>(
        &'a self,
        candidate: &'a CandidateCreate,
    ) -> AdapterFuture<'a, CandidateResponse> {
        Box::pin(async move {
            // Harvest job ids are integers; anything else cannot exist there.
            let job_id = candidate
                .job_id()
                .parse::<u64>()
                .map_err(|_| AtsError::not_found("greenhouse job not found"))?;

            let payload = candidate_payload(candidate, job_id);
            let headers = self
                .on_behalf_of
                .as_deref()
                .map(|user_id| ("On-Behalf-Of", user_id))
                .into_iter()
                .collect::<Vec<_>>();

            let response = self
                .transport
                .post("candidates", &payload, &headers)
                .await
                .map_err(|error| self.normalizer.normalize(error))?;

            let candidate_id = id_at(&response.body, "/id").unwrap_or_default();
            let application_id = id_at(&response.body, "/applications/0/id").unwrap_or_default();
            let created = CandidateResponse::applied(candidate, candidate_id, application_id)?;

            info!(
                provider = "greenhouse",
                candidate_id = %created.candidate_id,
                application_id = %created.application_id,
                "created candidate"
            );
            Ok(created)
        })
    }

    fn get_applications<'a>(&'a self, job_id: &'a str) -> AdapterFuture<'a, Vec<Application>> {
        Box::pin(async move {
            let job_id = require_job_id(job_id)?;
            let records = self
                .fetch_all("applications", vec![("job_id", job_id.to_owned())])
                .await?;
            let applications =
                decode_records::<GreenhouseApplication>(ProviderId::Greenhouse, "application", records)
                    .into_iter()
                    .map(normalize_application)
                    .collect::<Vec<_>>();

            info!(provider = "greenhouse", count = applications.len(), "fetched applications");
            Ok(applications)
        })
    }

    fn health_check<'a>(&'a self) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            match self
                .transport
                .get("jobs", &[("per_page", String::from("1"))])
                .await
            {
                Ok(_) => true,
                Err(error) => {
                    let error = self.normalizer.normalize(error);
                    warn!(provider = "greenhouse", kind = %error.kind(), "health check failed");
                    false
                }
            }
        })
    }
}

fn normalize_job(raw: GreenhouseJob) -> Job {
    let id = raw.id.to_string();
    let status = raw
        .status
        .as_deref()
        .and_then(|status| lookup_status(&JOB_STATUSES, status))
        .unwrap_or(JobStatus::Draft);
    let external_url = raw
        .job_post
        .as_ref()
        .and_then(|post| non_empty(post.external_url.as_deref()))
        .map(str::to_owned)
        .unwrap_or_else(|| format!("https://boards.greenhouse.io/jobs/{id}"));

    Job {
        location: job_location(&raw),
        title: non_empty(raw.name.as_deref())
            .unwrap_or("Untitled Position")
            .to_owned(),
        status,
        external_url,
        id,
    }
}

fn job_location(raw: &GreenhouseJob) -> String {
    let offices = raw
        .offices
        .iter()
        .flatten()
        .filter_map(|office| non_empty(office.name.as_deref()))
        .collect::<Vec<_>>();
    if !offices.is_empty() {
        return offices.join(", ");
    }

    let location = match &raw.location {
        Some(Value::Object(location)) => location.get("name").and_then(Value::as_str),
        Some(Value::String(location)) => Some(location.as_str()),
        _ => None,
    };
    non_empty(location).unwrap_or("Remote").to_owned()
}

fn normalize_application(raw: GreenhouseApplication) -> Application {
    let (candidate_name, email) = match &raw.candidate {
        Some(candidate) => {
            let name = [candidate.first_name.as_deref(), candidate.last_name.as_deref()]
                .into_iter()
                .filter_map(non_empty)
                .collect::<Vec<_>>()
                .join(" ");
            let email = candidate
                .email_addresses
                .iter()
                .flatten()
                .find_map(|email| non_empty(email.value.as_deref()))
                .unwrap_or_default()
                .to_owned();
            (name, email)
        }
        None => (String::new(), String::new()),
    };

    Application {
        id: raw.id.to_string(),
        candidate_name: if candidate_name.is_empty() {
            String::from("Unknown")
        } else {
            candidate_name
        },
        email,
        status: application_status(&raw),
    }
}

fn application_status(raw: &GreenhouseApplication) -> ApplicationStatus {
    let status = raw.status.as_deref().unwrap_or_default().to_ascii_lowercase();
    let rejected = raw.rejected_at.as_ref().is_some_and(|value| !value.is_null());
    if rejected || status == "rejected" {
        return ApplicationStatus::Rejected;
    }

    let stage = raw
        .current_stage
        .as_ref()
        .and_then(|stage| stage.name.as_deref())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let words = stage
        .split(|ch: char| !ch.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>();
    if status == "hired" {
        return ApplicationStatus::Hired;
    }

    STAGE_PATTERNS
        .iter()
        .find(|(pattern, _)| contains_phrase(&words, pattern))
        .map(|(_, status)| *status)
        .unwrap_or(ApplicationStatus::Applied)
}

fn contains_phrase(words: &[&str], phrase: &str) -> bool {
    let phrase = phrase.split(' ').collect::<Vec<_>>();
    words
        .windows(phrase.len())
        .any(|window| window == phrase.as_slice())
}

fn candidate_payload(candidate: &CandidateCreate, job_id: u64) -> Value {
    let mut payload = json!({
        "first_name": candidate.first_name(),
        "last_name": candidate.last_name(),
        "email_addresses": [{"value": candidate.email(), "type": "personal"}],
        "applications": [{"job_id": job_id}],
    });

    if let Some(phone) = candidate.phone() {
        payload["phone_numbers"] = json!([{"value": phone, "type": "mobile"}]);
    }
    if let Some(resume_url) = candidate.resume_url() {
        payload["attachments"] = json!([{
            "filename": "resume.pdf",
            "type": "resume",
            "url": resume_url,
        }]);
    }
    payload
}

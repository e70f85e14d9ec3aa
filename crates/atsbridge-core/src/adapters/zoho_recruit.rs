//! Zoho Recruit v2 adapter.
//!
//! OAuth2 refresh-token auth with the `Zoho-oauthtoken` scheme and
//! `page`/`per_page` offset pagination. Record writes answer with a
//! per-record `code` that must be checked even on a 2xx status.
//!
//! Candidate submission runs as:
//!
//! 1. `GET Job_Openings/{id}` so an unknown job fails with `ATS_NOT_FOUND`
//!    before anything is written,
//! 2. `POST Candidates`,
//! 3. `POST Candidates/{id}/Attachments` when a resume URL is given,
//! 4. `POST Applications` associating the candidate with the job.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::adapter::{filter_by_status, require_job_id, AdapterFuture, AtsAdapter};
use crate::adapters::{array_at, decode_records, id_at, lookup_status, non_empty, RecordId};
use crate::auth::{Credentials, OAuthSettings, OAuthTokenManager};
use crate::config::{require, AtsConfig};
use crate::http_client::{HttpClient, HttpMethod};
use crate::normalizer::{field_errors, vendor_code, ErrorNormalizer};
use crate::pagination::{collect_all, Page, PageCursor, PaginationStrategy, DEFAULT_MAX_PAGES};
use crate::provider_policy::ProviderPolicy;
use crate::transport::Transport;
use crate::{
    Application, ApplicationStatus, AtsError, CandidateCreate, CandidateResponse, ConfigError, Job,
    JobStatus, ProviderId,
};

const TOKEN_SCHEME: &str = "Zoho-oauthtoken";
const TOKEN_EXPIRY_SKEW: Duration = Duration::from_secs(60);

const JOB_STATUSES: [(&str, JobStatus); 8] = [
    ("In-progress", JobStatus::Open),
    ("Open", JobStatus::Open),
    ("Filled", JobStatus::Closed),
    ("Cancelled", JobStatus::Closed),
    ("Declined", JobStatus::Closed),
    ("Inactive", JobStatus::Closed),
    ("Draft", JobStatus::Draft),
    ("On-hold", JobStatus::Draft),
];

const APPLICATION_STATUSES: [(&str, ApplicationStatus); 16] = [
    ("Applied", ApplicationStatus::Applied),
    ("New", ApplicationStatus::Applied),
    ("Associated", ApplicationStatus::Applied),
    ("Screening", ApplicationStatus::Screening),
    ("In-Review", ApplicationStatus::Screening),
    ("Qualified", ApplicationStatus::Screening),
    ("Contacted", ApplicationStatus::Screening),
    ("Interview-Scheduled", ApplicationStatus::Screening),
    ("Interview-in-Progress", ApplicationStatus::Screening),
    ("Offer-Made", ApplicationStatus::Screening),
    ("Hired", ApplicationStatus::Hired),
    ("Converted - Employee", ApplicationStatus::Hired),
    ("Rejected", ApplicationStatus::Rejected),
    ("Unqualified", ApplicationStatus::Rejected),
    ("Rejected-for-Interview", ApplicationStatus::Rejected),
    ("Offer-Declined", ApplicationStatus::Rejected),
];

/// Record-level codes that mean the submitted data was refused.
const DATA_CODES: [&str; 3] = ["INVALID_DATA", "DUPLICATE_DATA", "MANDATORY_NOT_FOUND"];

#[derive(Debug, Deserialize)]
struct ZohoJobOpening {
    id: RecordId,
    #[serde(rename = "Posting_Title", default)]
    posting_title: Option<String>,
    #[serde(rename = "Job_Opening_Status", default)]
    status: Option<String>,
    #[serde(rename = "City", default)]
    city: Option<String>,
    #[serde(rename = "Country", default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZohoApplication {
    id: RecordId,
    #[serde(rename = "Application_Status", default)]
    status: Option<String>,
    #[serde(rename = "Candidate_ID", default)]
    candidate: Option<ZohoLookup>,
    #[serde(rename = "Full_Name", default)]
    full_name: Option<String>,
    #[serde(rename = "Email", default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ZohoLookup {
    #[serde(default)]
    name: Option<String>,
}

/// Zoho Recruit adapter.
#[derive(Debug, Clone)]
pub struct ZohoRecruitAdapter {
    transport: Transport,
    normalizer: ErrorNormalizer,
    portal_url: String,
    page_size: usize,
    max_pages: usize,
}

impl ZohoRecruitAdapter {
    /// `portal_url` is the Recruit web root used for job links.
    pub fn new(transport: Transport, portal_url: impl Into<String>) -> Self {
        Self {
            transport,
            normalizer: ErrorNormalizer::new(ProviderId::ZohoRecruit),
            portal_url: portal_url.into(),
            page_size: ProviderPolicy::zoho_recruit_default().page_size,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }

    pub fn from_config(
        config: &AtsConfig,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, ConfigError> {
        let settings = OAuthSettings {
            token_url: format!("{}/oauth/v2/token", config.zoho_accounts_url()),
            client_id: require(config.zoho_client_id.as_deref(), "ZOHO_CLIENT_ID")?.to_owned(),
            client_secret: require(config.zoho_client_secret.as_deref(), "ZOHO_CLIENT_SECRET")?
                .to_owned(),
            refresh_token: require(config.zoho_refresh_token.as_deref(), "ZOHO_REFRESH_TOKEN")?
                .to_owned(),
            scheme: String::from(TOKEN_SCHEME),
            expiry_skew: TOKEN_EXPIRY_SKEW,
            timeout: config.timeout,
        };
        let base_url = config.base_url_for(ProviderId::ZohoRecruit)?;
        let tokens = OAuthTokenManager::new(settings, Arc::clone(&http_client));
        let transport = config.transport(
            ProviderId::ZohoRecruit,
            base_url,
            http_client,
            Credentials::OAuth2(Arc::new(tokens)),
        );

        Ok(Self::new(transport, config.zoho_portal_url()).with_max_pages(config.max_pages))
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
        path: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<Vec<Value>, AtsError> {
        let strategy = PaginationStrategy::Offset {
            page_size: self.page_size,
        };

        collect_all(strategy, self.max_pages, |cursor| {
            let mut params = params.clone();
            if let PageCursor::Offset { offset, limit } = cursor {
                params.push(("page", (offset / limit + 1).to_string()));
                params.push(("per_page", limit.to_string()));
            }
            async move {
                let response = self
                    .transport
                    .get(path, &params)
                    .await
                    .map_err(|error| self.normalizer.normalize(error))?;
                // 204 with an empty body marks the end of the collection.
                Ok(Page::new(array_at(&response.body, "/data")))
            }
        })
        .await
    }

    async fn ensure_job_exists(&self, job_id: &str) -> Result<(), AtsError> {
        let path = format!("Job_Openings/{}", urlencoding::encode(job_id));
        let response = self
            .transport
            .get(&path, &[])
            .await
            .map_err(|error| self.normalizer.normalize(error))?;

        if array_at(&response.body, "/data").is_empty() {
            return Err(AtsError::not_found("zoho_recruit job not found"));
        }
        Ok(())
    }

    async fn write_record(
        &self,
        path: &str,
        record: Value,
        what: &'static str,
    ) -> Result<String, AtsError> {
        let response = self
            .transport
            .post(path, &json!({ "data": [record] }), &[])
            .await
            .map_err(|error| self.normalizer.normalize(error))?;

        record_id(&response.body, what)
    }

    async fn attach_resume(&self, candidate_id: &str, resume_url: &str) -> Result<(), AtsError> {
        let path = format!("Candidates/{}/Attachments", urlencoding::encode(candidate_id));
        let params = [
            ("attachments_category", String::from("Resume")),
            ("attachment_url", resume_url.to_owned()),
        ];
        self.transport
            .request(HttpMethod::Post, &path, &params, None, &[])
            .await
            .map_err(|error| self.normalizer.normalize(error))?;
        Ok(())
    }

    fn normalize_job(&self, raw: ZohoJobOpening) -> Job {
        let id = raw.id.to_string();
        let status = raw
            .status
            .as_deref()
            .and_then(|status| lookup_status(&JOB_STATUSES, status))
            .unwrap_or(JobStatus::Open);
        let location = [raw.city.as_deref(), raw.country.as_deref()]
            .into_iter()
            .filter_map(non_empty)
            .collect::<Vec<_>>()
            .join(", ");

        Job {
            title: non_empty(raw.posting_title.as_deref())
                .unwrap_or("Untitled Position")
                .to_owned(),
            location: if location.is_empty() {
                String::from("Remote")
            } else {
                location
            },
            status,
            external_url: format!(
                "{}/recruit/JobOpenings.do?id={}",
                self.portal_url.trim_end_matches('/'),
                urlencoding::encode(&id)
            ),
            id,
        }
    }
}

impl AtsAdapter for ZohoRecruitAdapter {
    fn provider(&self) -> ProviderId {
        ProviderId::ZohoRecruit
    }

    fn get_jobs<'a>(&'a self, status: Option<JobStatus>) -> AdapterFuture<'a, Vec<Job>> {
        Box::pin(async move {
            let records = self.fetch_all("Job_Openings", Vec::new()).await?;
            let jobs = decode_records::<ZohoJobOpening>(ProviderId::ZohoRecruit, "job", records)
                .into_iter()
                .map(|raw| self.normalize_job(raw))
                .collect::<Vec<_>>();

            let jobs = filter_by_status(jobs, status);
            info!(provider = "zoho_recruit", count = jobs.len(), "fetched jobs");
            Ok(jobs)
        })
    }

    fn create_candidate<'a>(
        &'a self,
        candidate: &'a CandidateCreate,
    ) -> AdapterFuture<'a, CandidateResponse> {
        Box::pin(async move {
            self.ensure_job_exists(candidate.job_id()).await?;

            let last_name = candidate.last_name();
            let mut record = json!({
                "First_Name": candidate.first_name(),
                "Last_Name": if last_name.is_empty() { "." } else { last_name.as_str() },
                "Email": candidate.email(),
            });
            if let Some(phone) = candidate.phone() {
                record["Mobile"] = Value::from(phone);
            }
            let candidate_id = self.write_record("Candidates", record, "candidate").await?;

            if let Some(resume_url) = candidate.resume_url() {
                if let Err(error) = self.attach_resume(&candidate_id, resume_url).await {
                    warn!(
                        provider = "zoho_recruit",
                        candidate_id = %candidate_id,
                        kind = %error.kind(),
                        "resume attachment failed; candidate kept without resume"
                    );
                }
            }

            let application = json!({
                "Candidate_ID": candidate_id,
                "Job_Opening_ID": candidate.job_id(),
                "Application_Status": "Applied",
            });
            let application_id = self
                .write_record("Applications", application, "application")
                .await
                .map_err(|error| error.with_detail("candidate_id", candidate_id.as_str()))?;

            let created = CandidateResponse::applied(candidate, candidate_id, application_id)?;
            info!(
                provider = "zoho_recruit",
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
            let criteria = format!("(Job_Opening_ID:equals:{})", escape_criteria(job_id));
            let records = self
                .fetch_all("Applications/search", vec![("criteria", criteria)])
                .await?;
            let applications =
                decode_records::<ZohoApplication>(ProviderId::ZohoRecruit, "application", records)
                    .into_iter()
                    .map(normalize_application)
                    .collect::<Vec<_>>();

            info!(provider = "zoho_recruit", count = applications.len(), "fetched applications");
            Ok(applications)
        })
    }

    fn health_check<'a>(&'a self) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            match self
                .transport
                .get("Job_Openings", &[("per_page", String::from("1"))])
                .await
            {
                Ok(_) => true,
                Err(error) => {
                    let error = self.normalizer.normalize(error);
                    warn!(provider = "zoho_recruit", kind = %error.kind(), "health check failed");
                    false
                }
            }
        })
    }
}

/// Backslash-escapes the characters that delimit Zoho search criteria.
fn escape_criteria(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '(' | ')' | ',' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn normalize_application(raw: ZohoApplication) -> Application {
    let candidate_name = raw
        .candidate
        .as_ref()
        .and_then(|candidate| non_empty(candidate.name.as_deref()))
        .or(non_empty(raw.full_name.as_deref()))
        .unwrap_or("Unknown")
        .to_owned();

    Application {
        id: raw.id.to_string(),
        candidate_name,
        email: raw.email.unwrap_or_default(),
        status: raw
            .status
            .as_deref()
            .and_then(|status| lookup_status(&APPLICATION_STATUSES, status))
            .unwrap_or(ApplicationStatus::Applied),
    }
}

/// Id of the first written record, or the error its record-level code implies.
fn record_id(body: &Value, what: &'static str) -> Result<String, AtsError> {
    let Some(record) = body.pointer("/data/0") else {
        return Err(AtsError::service(
            format!("zoho_recruit returned no {what} record"),
            false,
        ));
    };

    let code = record.get("code").and_then(Value::as_str).unwrap_or_default();
    if code.eq_ignore_ascii_case("SUCCESS") {
        return id_at(record, "/details/id").ok_or_else(|| {
            AtsError::service(format!("zoho_recruit did not return a {what} id"), false)
        });
    }

    let error = if DATA_CODES.contains(&code) {
        let fields = field_errors(body);
        let error = AtsError::validation(format!("zoho_recruit rejected the {what} data"));
        if fields.is_empty() {
            error
        } else {
            error.with_detail("field_errors", Value::Array(fields))
        }
    } else {
        AtsError::service(format!("zoho_recruit failed to write the {what}"), false)
    };

    Err(match vendor_code(body) {
        Some(code) => error.with_detail("vendor_code", code),
        None => error,
    })
}

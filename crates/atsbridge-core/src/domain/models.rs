use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::CandidateCreate;
use crate::{AtsError, ValidationError};

/// Unified job lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Open,
    Closed,
    Draft,
}

impl JobStatus {
    pub const ALL: [Self; 3] = [Self::Open, Self::Closed, Self::Draft];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::Draft => "DRAFT",
        }
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            "DRAFT" => Ok(Self::Draft),
            _ => Err(ValidationError::InvalidStatus {
                value: value.to_owned(),
                expected: "OPEN, CLOSED, DRAFT",
            }),
        }
    }
}

/// Unified application pipeline status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Applied,
    Screening,
    Rejected,
    Hired,
}

impl ApplicationStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Applied => "APPLIED",
            Self::Screening => "SCREENING",
            Self::Rejected => "REJECTED",
            Self::Hired => "HIRED",
        }
    }
}

impl Display for ApplicationStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub title: String,
    pub location: String,
    pub status: JobStatus,
    pub external_url: String,
}

/// Normalized application for a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub candidate_name: String,
    pub email: String,
    pub status: ApplicationStatus,
}

/// Result of a successful candidate submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResponse {
    pub candidate_id: String,
    pub application_id: String,
    pub name: String,
    pub email: String,
    pub job_id: String,
    pub status: ApplicationStatus,
}

impl CandidateResponse {
    /// Builds the response for a freshly created application.
    ///
    /// Empty vendor identifiers are reported as a service fault rather than
    /// handed back to the caller.
    pub fn applied(
        candidate: &CandidateCreate,
        candidate_id: impl Into<String>,
        application_id: impl Into<String>,
    ) -> Result<Self, AtsError> {
        let candidate_id = candidate_id.into();
        let application_id = application_id.into();

        if candidate_id.trim().is_empty() {
            return Err(AtsError::service(
                "vendor did not return a candidate id",
                false,
            ));
        }
        if application_id.trim().is_empty() {
            return Err(AtsError::service(
                "vendor did not return an application id",
                false,
            ));
        }

        Ok(Self {
            candidate_id,
            application_id,
            name: candidate.name().to_owned(),
            email: candidate.email().to_owned(),
            job_id: candidate.job_id().to_owned(),
            status: ApplicationStatus::Applied,
        })
    }
}

use serde::Serialize;

use crate::ValidationError;

const MAX_NAME_LEN: usize = 255;
const MAX_PHONE_LEN: usize = 50;

/// Validated candidate submission.
///
/// Fields are private so an adapter can only ever receive input that passed
/// validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateCreate {
    name: String,
    email: String,
    phone: Option<String>,
    resume_url: Option<String>,
    job_id: String,
}

impl CandidateCreate {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        job_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(ValidationError::EmptyField { field: "name" });
        }
        let len = name.chars().count();
        if len > MAX_NAME_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "name",
                len,
                max: MAX_NAME_LEN,
            });
        }

        let email = email.into().trim().to_owned();
        validate_email(&email)?;

        let job_id = job_id.into().trim().to_owned();
        if job_id.is_empty() {
            return Err(ValidationError::EmptyField { field: "job_id" });
        }

        Ok(Self {
            name,
            email,
            phone: None,
            resume_url: None,
            job_id,
        })
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Result<Self, ValidationError> {
        let phone = phone.into().trim().to_owned();
        if phone.is_empty() {
            self.phone = None;
            return Ok(self);
        }
        let len = phone.chars().count();
        if len > MAX_PHONE_LEN {
            return Err(ValidationError::FieldTooLong {
                field: "phone",
                len,
                max: MAX_PHONE_LEN,
            });
        }
        self.phone = Some(phone);
        Ok(self)
    }

    pub fn with_resume_url(mut self, resume_url: impl Into<String>) -> Result<Self, ValidationError> {
        let resume_url = resume_url.into().trim().to_owned();
        if resume_url.is_empty() {
            self.resume_url = None;
            return Ok(self);
        }
        let parsed = url::Url::parse(&resume_url).map_err(|_| ValidationError::InvalidResumeUrl)?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ValidationError::InvalidResumeUrl);
        }
        self.resume_url = Some(resume_url);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn resume_url(&self) -> Option<&str> {
        self.resume_url.as_deref()
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// First whitespace-delimited token of the name.
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    /// Remainder of the name after the first token, empty for single names.
    pub fn last_name(&self) -> String {
        self.name
            .split_whitespace()
            .skip(1)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmptyField { field: "email" });
    }
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }

    let (local, domain) = email.split_once('@').ok_or(ValidationError::InvalidEmail)?;
    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail);
    }

    let labels = domain.split('.').collect::<Vec<_>>();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(ValidationError::InvalidEmail);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_minimal_candidate() {
        let candidate = CandidateCreate::new("  Grace Hopper ", "grace@navy.mil", " 1001 ")
            .expect("valid candidate");

        assert_eq!(candidate.name(), "Grace Hopper");
        assert_eq!(candidate.job_id(), "1001");
        assert_eq!(candidate.phone(), None);
        assert_eq!(candidate.first_name(), "Grace");
        assert_eq!(candidate.last_name(), "Hopper");
    }

    #[test]
    fn rejects_names_outside_length_bounds() {
        assert_eq!(
            CandidateCreate::new("   ", "a@b.io", "1"),
            Err(ValidationError::EmptyField { field: "name" })
        );

        let long_name = "x".repeat(256);
        assert!(matches!(
            CandidateCreate::new(long_name, "a@b.io", "1"),
            Err(ValidationError::FieldTooLong { field: "name", len: 256, max: 255 })
        ));
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["plain", "@example.com", "a@b", "a@@b.com", "a b@c.com", "a@b..com"] {
            assert_eq!(
                CandidateCreate::new("Ann", email, "1"),
                Err(ValidationError::InvalidEmail),
                "email {email:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_empty_job_id() {
        assert_eq!(
            CandidateCreate::new("Ann", "ann@example.com", ""),
            Err(ValidationError::EmptyField { field: "job_id" })
        );
    }

    #[test]
    fn optional_fields_are_validated() {
        let candidate = CandidateCreate::new("Ann Lee", "ann@example.com", "7").expect("valid");

        let with_resume = candidate
            .clone()
            .with_resume_url("https://cdn.example.com/ann.pdf")
            .expect("https url");
        assert_eq!(with_resume.resume_url(), Some("https://cdn.example.com/ann.pdf"));

        assert_eq!(
            candidate.clone().with_resume_url("ftp://example.com/cv.pdf"),
            Err(ValidationError::InvalidResumeUrl)
        );
        assert!(candidate.with_phone("1".repeat(51)).is_err());
    }

    #[test]
    fn single_token_names_have_empty_last_name() {
        let candidate = CandidateCreate::new("Cher", "cher@example.com", "7").expect("valid");
        assert_eq!(candidate.first_name(), "Cher");
        assert_eq!(candidate.last_name(), "");
    }
}

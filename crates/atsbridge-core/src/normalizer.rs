//! Maps transport failures onto the canonical [`AtsError`] taxonomy.
//!
//! | Outcome | Kind | Retryable |
//! |---------|------|-----------|
//! | timeout, connection failure, 408 | `ATS_CONNECTION_ERROR` | yes |
//! | 401, 403, token refresh failure | `ATS_AUTHENTICATION_ERROR` | no |
//! | 404 | `ATS_NOT_FOUND` | no |
//! | 429 | `ATS_RATE_LIMIT_ERROR` | yes |
//! | 400, 422 | `VALIDATION_ERROR` | no |
//! | 5xx | `ATS_SERVICE_ERROR` | yes |
//! | other 4xx, undecodable body, foreign next link | `ATS_SERVICE_ERROR` | no |
//! | malformed request | `INTERNAL_ERROR` | no |
//!
//! Messages are generated here and never quote the vendor body. Only
//! field-level validation messages, the vendor error code, the status and
//! the retry-after hint are copied into `details`.

use serde_json::{json, Map, Value};

use crate::transport::{TransportCause, TransportError};
use crate::{AtsError, ProviderId};

const MAX_FIELD_ERRORS: usize = 20;
const MAX_DETAIL_LEN: usize = 200;

/// Zoho codes that signal a credential problem regardless of HTTP status.
const ZOHO_AUTH_CODES: [&str; 4] = [
    "INVALID_TOKEN",
    "AUTHENTICATION_FAILURE",
    "OAUTH_SCOPE_MISMATCH",
    "NO_PERMISSION",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorNormalizer {
    provider: ProviderId,
}

impl ErrorNormalizer {
    pub const fn new(provider: ProviderId) -> Self {
        Self { provider }
    }

    pub fn normalize(&self, error: TransportError) -> AtsError {
        let provider = self.provider;
        match error.cause() {
            TransportCause::Timeout => {
                AtsError::connection(format!("{provider} request timed out"))
            }
            TransportCause::Connect => {
                AtsError::connection(format!("failed to connect to {provider}"))
            }
            TransportCause::Request => {
                AtsError::internal(format!("failed to build {provider} request"))
            }
            TransportCause::Decode => AtsError::service(
                format!("{provider} returned an unreadable response"),
                false,
            ),
            TransportCause::ForeignHost => AtsError::service(
                format!("{provider} returned a next-page link outside its API host"),
                false,
            ),
            TransportCause::TokenRefresh => {
                let error_out =
                    AtsError::authentication(format!("failed to obtain {provider} access token"));
                match error.status() {
                    Some(status) => error_out.with_detail("status", status),
                    None => error_out,
                }
            }
            TransportCause::Status => self.normalize_status(&error),
        }
    }

    fn normalize_status(&self, error: &TransportError) -> AtsError {
        let provider = self.provider;
        let status = error.status().unwrap_or_default();
        let body = error.vendor_body();
        let vendor_code = body.and_then(vendor_code);

        if let Some(code) = vendor_code.as_deref() {
            if provider == ProviderId::ZohoRecruit && ZOHO_AUTH_CODES.contains(&code) {
                return AtsError::authentication(format!("{provider} rejected the credentials"))
                    .with_detail("status", status)
                    .with_detail("vendor_code", code);
            }
        }

        let normalized = match status {
            401 => AtsError::authentication(format!("{provider} rejected the credentials")),
            403 => AtsError::authentication(format!(
                "{provider} denied access; check API permissions"
            )),
            404 => AtsError::not_found(format!("{provider} resource not found")),
            408 => AtsError::connection(format!("{provider} request timed out")),
            429 => {
                let error_out = AtsError::rate_limited(format!("{provider} rate limit exceeded"));
                match error.retry_after() {
                    Some(wait) => error_out.with_detail("retry_after_secs", wait.as_secs()),
                    None => error_out,
                }
            }
            400 | 422 => {
                let field_errors = body.map(field_errors).unwrap_or_default();
                if provider == ProviderId::Greenhouse && references_job(&field_errors) {
                    AtsError::not_found(format!("{provider} job not found"))
                } else {
                    let error_out =
                        AtsError::validation(format!("{provider} rejected the request data"));
                    if field_errors.is_empty() {
                        error_out
                    } else {
                        error_out.with_detail("field_errors", Value::Array(field_errors))
                    }
                }
            }
            500..=599 => AtsError::service(
                format!("{provider} service error (status {status})"),
                true,
            ),
            _ => AtsError::service(
                format!("{provider} request failed with status {status}"),
                false,
            ),
        };

        let normalized = normalized.with_detail("status", status);
        match vendor_code {
            Some(code) => normalized.with_detail("vendor_code", code),
            None => normalized,
        }
    }
}

/// Vendor error code, when it is a short machine-readable token.
pub(crate) fn vendor_code(body: &Value) -> Option<String> {
    let code = body
        .get("code")
        .or_else(|| body.pointer("/data/0/code"))
        .and_then(Value::as_str)?;

    let is_token = !code.is_empty()
        && code.len() <= 64
        && code
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    is_token.then(|| code.to_owned())
}

/// Field-level validation messages in `{field, message}` form.
///
/// Understands Greenhouse `errors: [{field, message}]`, Workable
/// `validation_errors: {field: [messages]}` and Zoho `data: [{details:
/// {api_name}, message}]` shapes.
pub(crate) fn field_errors(body: &Value) -> Vec<Value> {
    let mut out = Vec::new();

    if let Some(errors) = body.get("errors").and_then(Value::as_array) {
        for entry in errors {
            let field = entry.get("field").and_then(Value::as_str);
            let message = entry.get("message").and_then(Value::as_str);
            if let (Some(field), Some(message)) = (field, message) {
                out.push(field_error(field, message));
            }
        }
    }

    for key in ["validation_errors", "errors"] {
        if let Some(map) = body.get(key).and_then(Value::as_object) {
            collect_field_map(map, &mut out);
        }
    }

    if let Some(records) = body.get("data").and_then(Value::as_array) {
        for record in records {
            let field = record.pointer("/details/api_name").and_then(Value::as_str);
            let message = record.get("message").and_then(Value::as_str);
            if let (Some(field), Some(message)) = (field, message) {
                out.push(field_error(field, message));
            }
        }
    }

    out.truncate(MAX_FIELD_ERRORS);
    out
}

fn collect_field_map(map: &Map<String, Value>, out: &mut Vec<Value>) {
    for (field, messages) in map {
        match messages {
            Value::String(message) => out.push(field_error(field, message)),
            Value::Array(items) => {
                for message in items.iter().filter_map(Value::as_str) {
                    out.push(field_error(field, message));
                }
            }
            _ => {}
        }
    }
}

fn field_error(field: &str, message: &str) -> Value {
    json!({
        "field": truncate(field),
        "message": truncate(message),
    })
}

fn truncate(value: &str) -> String {
    value.chars().take(MAX_DETAIL_LEN).collect()
}

fn references_job(field_errors: &[Value]) -> bool {
    field_errors.iter().any(|entry| {
        entry
            .get("field")
            .and_then(Value::as_str)
            .is_some_and(|field| field.contains("job_id") || field.starts_with("applications"))
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::http_client::HttpError;
    use crate::ErrorKind;

    fn status(code: u16, body: Value) -> TransportError {
        TransportError::status_error(code, None, Some(body))
    }

    #[test]
    fn unauthorized_is_never_retryable() {
        let normalizer = ErrorNormalizer::new(ProviderId::Greenhouse);

        let error = normalizer.normalize(status(401, json!({"message": "Invalid Basic Auth credentials"})));

        assert_eq!(error.kind(), ErrorKind::Authentication);
        assert!(!error.retryable());
        assert!(!error.message().contains("Invalid Basic Auth"));
    }

    #[test]
    fn rate_limits_carry_the_retry_hint() {
        let normalizer = ErrorNormalizer::new(ProviderId::Workable);
        let error = normalizer.normalize(TransportError::status_error(
            429,
            Some(Duration::from_secs(12)),
            None,
        ));

        assert_eq!(error.kind(), ErrorKind::RateLimit);
        assert!(error.retryable());
        assert_eq!(error.details()["retry_after_secs"], json!(12));
    }

    #[test]
    fn server_errors_stay_retryable_after_exhaustion() {
        let normalizer = ErrorNormalizer::new(ProviderId::Workable);
        let error = normalizer.normalize(status(503, json!({"error": "upstream exploded at db-7"})));

        assert_eq!(error.kind(), ErrorKind::Service);
        assert!(error.retryable());
        assert!(!error.to_json().to_string().contains("db-7"));
    }

    #[test]
    fn network_failures_map_to_connection_errors() {
        let normalizer = ErrorNormalizer::new(ProviderId::Greenhouse);

        for error in [HttpError::timeout("slow"), HttpError::connect("refused")] {
            let normalized = normalizer.normalize(TransportError::from(error));
            assert_eq!(normalized.kind(), ErrorKind::Connection);
            assert!(normalized.retryable());
        }
    }

    #[test]
    fn validation_copies_only_field_messages() {
        let normalizer = ErrorNormalizer::new(ProviderId::Greenhouse);
        let error = normalizer.normalize(status(
            422,
            json!({
                "message": "Validation error",
                "internal_trace": "secret-ish stack",
                "errors": [{"field": "email_addresses", "message": "Must be a valid email"}]
            }),
        ));

        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(
            error.details()["field_errors"],
            json!([{"field": "email_addresses", "message": "Must be a valid email"}])
        );
        assert!(!error.to_json().to_string().contains("secret-ish"));
    }

    #[test]
    fn greenhouse_unknown_job_is_not_found() {
        let normalizer = ErrorNormalizer::new(ProviderId::Greenhouse);
        let error = normalizer.normalize(status(
            422,
            json!({"errors": [{"field": "applications.job_id", "message": "is invalid"}]}),
        ));

        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn workable_validation_map_is_flattened() {
        let errors = field_errors(&json!({"validation_errors": {"email": ["is invalid", "is taken"]}}));

        assert_eq!(errors.len(), 2);
        assert_eq!(errors[1]["message"], "is taken");
    }

    #[test]
    fn zoho_token_codes_are_authentication_failures() {
        let normalizer = ErrorNormalizer::new(ProviderId::ZohoRecruit);
        let error = normalizer.normalize(status(
            400,
            json!({"code": "INVALID_TOKEN", "message": "invalid oauth token", "status": "error"}),
        ));

        assert_eq!(error.kind(), ErrorKind::Authentication);
        assert_eq!(error.details()["vendor_code"], "INVALID_TOKEN");
    }

    #[test]
    fn free_text_codes_are_not_copied() {
        assert_eq!(vendor_code(&json!({"code": "see https://vendor/help for info"})), None);
        assert_eq!(
            vendor_code(&json!({"data": [{"code": "DUPLICATE_DATA"}]})),
            Some(String::from("DUPLICATE_DATA"))
        );
    }

    #[test]
    fn foreign_links_abort_as_service_errors() {
        let normalizer = ErrorNormalizer::new(ProviderId::Greenhouse);
        let error = normalizer.normalize(TransportError::foreign_host());

        assert_eq!(error.kind(), ErrorKind::Service);
        assert!(!error.retryable());
    }
}

//! Canonical error taxonomy.
//!
//! [`AtsError`] is the only error shape that crosses the adapter boundary.
//! Vendor payloads are reduced to whitelisted `details` by the
//! [`normalizer`](crate::normalizer) before they reach this type.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Caller input errors raised before any vendor call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("field '{field}' cannot be empty")]
    EmptyField { field: &'static str },
    #[error("field '{field}' length {len} exceeds max {max}")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("resume_url must be an absolute http(s) URL")]
    InvalidResumeUrl,
    #[error("invalid status '{value}', expected one of {expected}")]
    InvalidStatus {
        value: String,
        expected: &'static str,
    },
    #[error("invalid provider '{value}', expected one of greenhouse, workable, zoho_recruit")]
    InvalidProvider { value: String },
}

impl ValidationError {
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyField { field } | Self::FieldTooLong { field, .. } => field,
            Self::InvalidEmail => "email",
            Self::InvalidResumeUrl => "resume_url",
            Self::InvalidStatus { .. } => "status",
            Self::InvalidProvider { .. } => "provider",
        }
    }
}

/// Configuration errors raised while selecting or constructing an adapter.
///
/// Setting values are only echoed for non-secret numeric settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported ATS provider '{name}'; supported providers: {supported}")]
    UnsupportedProvider { name: String, supported: String },
    #[error("required setting {name} is not set")]
    MissingSetting { name: &'static str },
    #[error("setting {name} has invalid value '{value}'")]
    InvalidSetting { name: &'static str, value: String },
    #[error("base URL for {provider} is not a valid absolute URL")]
    InvalidBaseUrl { provider: &'static str },
}

/// Canonical error kinds exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    #[serde(rename = "ATS_AUTHENTICATION_ERROR")]
    Authentication,
    #[serde(rename = "ATS_NOT_FOUND")]
    NotFound,
    #[serde(rename = "ATS_RATE_LIMIT_ERROR")]
    RateLimit,
    #[serde(rename = "ATS_SERVICE_ERROR")]
    Service,
    #[serde(rename = "ATS_CONNECTION_ERROR")]
    Connection,
    #[serde(rename = "INTERNAL_ERROR")]
    Internal,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "VALIDATION_ERROR",
            Self::Authentication => "ATS_AUTHENTICATION_ERROR",
            Self::NotFound => "ATS_NOT_FOUND",
            Self::RateLimit => "ATS_RATE_LIMIT_ERROR",
            Self::Service => "ATS_SERVICE_ERROR",
            Self::Connection => "ATS_CONNECTION_ERROR",
            Self::Internal => "INTERNAL_ERROR",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized error returned by every adapter operation.
///
/// Serializes to `{error, message, retryable, details?}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtsError {
    #[serde(rename = "error")]
    kind: ErrorKind,
    message: String,
    retryable: bool,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    details: BTreeMap<String, Value>,
}

impl AtsError {
    fn new(kind: ErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            details: BTreeMap::new(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message, false)
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message, false)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message, false)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message, true)
    }

    /// Vendor-side fault. Callers decide retryability from the status class.
    pub fn service(message: impl Into<String>, retryable: bool) -> Self {
        Self::new(ErrorKind::Service, message, retryable)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message, true)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message, false)
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub fn details(&self) -> &BTreeMap<String, Value> {
        &self.details
    }

    /// Unified JSON body for the surrounding service layer.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| {
            serde_json::json!({
                "error": self.kind.as_str(),
                "message": self.message,
                "retryable": self.retryable,
            })
        })
    }
}

impl Display for AtsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl std::error::Error for AtsError {}

impl From<ValidationError> for AtsError {
    fn from(error: ValidationError) -> Self {
        let field = error.field();
        Self::validation(error.to_string()).with_detail("field", field)
    }
}

impl From<ConfigError> for AtsError {
    fn from(error: ConfigError) -> Self {
        Self::internal(error.to_string())
    }
}

use atsbridge_core::{AtsError, ConfigError, ErrorKind, ValidationError};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Ats(#[from] AtsError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Unified error shape written to stdout on failure.
    pub fn to_ats_error(&self) -> AtsError {
        match self {
            Self::Ats(error) => error.clone(),
            Self::Validation(error) => AtsError::from(error.clone()),
            Self::Config(error) => AtsError::from(error.clone()),
            Self::Serialization(_) => AtsError::internal("failed to serialize output"),
            Self::Io(_) => AtsError::internal("failed to write output"),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self.to_ats_error().kind() {
            ErrorKind::Validation => 2,
            ErrorKind::Authentication => 3,
            ErrorKind::NotFound => 4,
            ErrorKind::RateLimit => 5,
            ErrorKind::Service | ErrorKind::Connection => 6,
            ErrorKind::Internal => 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_kind() {
        assert_eq!(CliError::from(AtsError::authentication("denied")).exit_code(), 3);
        assert_eq!(CliError::from(AtsError::rate_limited("slow down")).exit_code(), 5);
        assert_eq!(CliError::from(AtsError::service("down", true)).exit_code(), 6);
        assert_eq!(CliError::from(ValidationError::InvalidEmail).exit_code(), 2);
    }

    #[test]
    fn config_errors_surface_as_internal() {
        let error = CliError::from(ConfigError::MissingSetting { name: "ATS_API_KEY" });

        let unified = error.to_ats_error();
        assert_eq!(unified.kind(), ErrorKind::Internal);
        assert!(unified.message().contains("ATS_API_KEY"));
        assert_eq!(error.exit_code(), 10);
    }
}

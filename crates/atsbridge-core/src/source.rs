use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Canonical ATS provider identifiers used for adapter selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    Greenhouse,
    Workable,
    ZohoRecruit,
}

impl ProviderId {
    pub const ALL: [Self; 3] = [Self::Greenhouse, Self::Workable, Self::ZohoRecruit];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Greenhouse => "greenhouse",
            Self::Workable => "workable",
            Self::ZohoRecruit => "zoho_recruit",
        }
    }
}

impl Display for ProviderId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "greenhouse" => Ok(Self::Greenhouse),
            "workable" => Ok(Self::Workable),
            "zoho_recruit" | "zoho-recruit" | "zoho" => Ok(Self::ZohoRecruit),
            other => Err(ValidationError::InvalidProvider {
                value: other.to_owned(),
            }),
        }
    }
}

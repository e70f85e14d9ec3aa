use std::time::Duration;

use crate::ProviderId;

/// Per-provider request pacing and page sizing defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPolicy {
    pub provider_id: ProviderId,
    pub quota_window: Duration,
    pub quota_limit: u32,
    pub page_size: usize,
}

impl ProviderPolicy {
    /// Harvest API allows 50 requests per 10 second window.
    pub fn greenhouse_default() -> Self {
        Self {
            provider_id: ProviderId::Greenhouse,
            quota_window: Duration::from_secs(10),
            quota_limit: 50,
            page_size: 100,
        }
    }

    /// SPI v3 allows 10 requests per 10 second window.
    pub fn workable_default() -> Self {
        Self {
            provider_id: ProviderId::Workable,
            quota_window: Duration::from_secs(10),
            quota_limit: 10,
            page_size: 100,
        }
    }

    pub fn zoho_recruit_default() -> Self {
        Self {
            provider_id: ProviderId::ZohoRecruit,
            quota_window: Duration::from_secs(60),
            quota_limit: 100,
            page_size: 200,
        }
    }

    pub fn default_for(provider_id: ProviderId) -> Self {
        match provider_id {
            ProviderId::Greenhouse => Self::greenhouse_default(),
            ProviderId::Workable => Self::workable_default(),
            ProviderId::ZohoRecruit => Self::zoho_recruit_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_provider_has_a_policy() {
        for provider in ProviderId::ALL {
            let policy = ProviderPolicy::default_for(provider);
            assert_eq!(policy.provider_id, provider);
            assert!(policy.quota_limit > 0);
            assert!(policy.page_size > 0);
        }
    }

    #[test]
    fn workable_policy_matches_vendor_limit() {
        let policy = ProviderPolicy::workable_default();

        assert_eq!(policy.quota_window, Duration::from_secs(10));
        assert_eq!(policy.quota_limit, 10);
    }
}

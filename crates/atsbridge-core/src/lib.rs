//! # ATS Bridge Core
//!
//! Adapter contract and HTTP integration layer for applicant tracking
//! system APIs.
//!
//! ## Overview
//!
//! Callers list jobs, submit candidates and fetch applications through one
//! [`AtsAdapter`] trait. Each provider adapter translates those operations
//! into vendor requests and maps the answers back into the unified domain:
//!
//! - **Canonical domain models** with unified status enums
//! - **HTTP transport** with credential injection, retry and throttling
//! - **Pagination traversal** for link-header and offset style APIs
//! - **Error normalization** into one vendor-free error shape
//! - **Adapter factory** resolving the configured provider from a registry
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapter`] | Adapter trait and shared helpers |
//! | [`adapters`] | Greenhouse, Workable and Zoho Recruit adapters |
//! | [`auth`] | Credentials and the OAuth2 token manager |
//! | [`config`] | Environment-driven configuration |
//! | [`domain`] | Jobs, applications and candidate submissions |
//! | [`error`] | Canonical error taxonomy |
//! | [`factory`] | Provider registry and adapter factory |
//! | [`http_client`] | Raw HTTP client abstraction |
//! | [`normalizer`] | Transport failure to [`AtsError`] mapping |
//! | [`pagination`] | Multi-page traversal |
//! | [`provider_policy`] | Per-provider quotas and page sizes |
//! | [`retry`] | Retry policy |
//! | [`source`] | Provider identifiers |
//! | [`throttling`] | Client-side request pacing |
//! | [`transport`] | Authenticated, retrying vendor calls |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use atsbridge_core::{AdapterFactory, AdapterRegistry, AtsConfig, JobStatus};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = AdapterRegistry::standard();
//!     let adapter = AdapterFactory::new(&registry, AtsConfig::from_env()?).get_adapter()?;
//!
//!     for job in adapter.get_jobs(Some(JobStatus::Open)).await? {
//!         println!("{} {}", job.id, job.title);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Service  │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Adapter Factory │────▶│ Adapter Registry │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Provider Adapter│────▶│ Error Normalizer │
//! │ (AtsAdapter)    │     └──────────────────┘
//! └────────┬────────┘
//!          │  pagination
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Transport       │────▶│ HTTP Client      │
//! │ auth/retry/pace │     │ (reqwest)        │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns [`AtsError`]:
//!
//! ```rust
//! use atsbridge_core::{AtsError, ErrorKind};
//!
//! fn should_retry_later(error: &AtsError) -> bool {
//!     match error.kind() {
//!         ErrorKind::RateLimit | ErrorKind::Connection => true,
//!         ErrorKind::Service => error.retryable(),
//!         _ => false,
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - Credentials are read from configuration only and never logged
//! - Vendor error bodies never reach [`AtsError`] messages
//! - Next-page links are followed only on the provider's API host

pub mod adapter;
pub mod adapters;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod factory;
pub mod http_client;
pub mod normalizer;
pub mod pagination;
pub mod provider_policy;
pub mod retry;
pub mod source;
pub mod throttling;
pub mod transport;

#[cfg(test)]
mod testing;

// Adapter contract and implementations
pub use adapter::{AdapterFuture, AtsAdapter};
pub use adapters::{GreenhouseAdapter, WorkableAdapter, ZohoRecruitAdapter};

// Credentials
pub use auth::{Credentials, OAuthSettings, OAuthTokenManager};

// Configuration and factory
pub use config::AtsConfig;
pub use factory::{AdapterConstructor, AdapterFactory, AdapterRegistry};

// Domain models
pub use domain::{Application, ApplicationStatus, CandidateCreate, CandidateResponse, Job, JobStatus};

// Error types
pub use error::{AtsError, ConfigError, ErrorKind, ValidationError};

// HTTP client types
pub use http_client::{
    HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};

// Integration primitives
pub use normalizer::ErrorNormalizer;
pub use pagination::{Page, PageCursor, PaginationStrategy};
pub use provider_policy::ProviderPolicy;
pub use retry::{AttemptFailure, RetryDecision, RetryPolicy};
pub use source::ProviderId;
pub use throttling::Throttle;
pub use transport::{Transport, TransportCause, TransportError, TransportResponse};

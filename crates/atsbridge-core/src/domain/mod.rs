//! # Domain Models
//!
//! Canonical shapes returned by every provider adapter.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Job`] | Job posting with a unified [`JobStatus`] |
//! | [`Application`] | Application with a unified [`ApplicationStatus`] |
//! | [`CandidateCreate`] | Validated candidate submission |
//! | [`CandidateResponse`] | Identifiers assigned by the vendor on submission |
//!
//! Every status field uses a unified enum, so vendor status strings cannot
//! reach a caller through these types.

mod candidate;
mod models;

pub use candidate::CandidateCreate;
pub use models::{Application, ApplicationStatus, CandidateResponse, Job, JobStatus};

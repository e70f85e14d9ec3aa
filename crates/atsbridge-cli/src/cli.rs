//! CLI argument definitions for atsbridge.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `jobs` | List jobs, optionally filtered by unified status |
//! | `apply` | Submit a candidate to a job |
//! | `applications` | List applications for a job |
//! | `health` | Check provider reachability and credentials |
//! | `providers` | List registered providers |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--provider` | `ATS_PROVIDER` | Provider override |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--log-level` | `RUST_LOG` or `warn` | Log filter written to stderr |
//!
//! # Examples
//!
//! ```bash
//! atsbridge jobs --status open --pretty
//! atsbridge apply --name "Ada Lovelace" --email ada@example.com --job-id 4012
//! atsbridge --provider workable applications --job-id 3F1A2B
//! ```

use clap::{Args, Parser, Subcommand};

use atsbridge_core::JobStatus;

/// Unified access to applicant tracking system APIs.
#[derive(Debug, Parser)]
#[command(
    name = "atsbridge",
    author,
    version,
    about = "Unified applicant tracking system CLI",
    long_about = "atsbridge lists jobs, submits candidates and reads applications across \
Greenhouse, Workable and Zoho Recruit with one output shape.\n\
\n\
Credentials are read from the environment or a .env file."
)]
pub struct Cli {
    /// Provider to use instead of ATS_PROVIDER.
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Log filter directive, e.g. `debug` or `atsbridge_core=trace`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List jobs from the configured provider.
    ///
    ///   atsbridge jobs
    ///   atsbridge jobs --status open
    Jobs(JobsArgs),

    /// Submit a candidate to a job.
    Apply(ApplyArgs),

    /// List applications for a job.
    Applications(ApplicationsArgs),

    /// Check that the provider is reachable with the configured credentials.
    Health,

    /// List registered providers.
    Providers,
}

#[derive(Debug, Args)]
pub struct JobsArgs {
    /// Keep only jobs with this unified status (open, closed, draft).
    #[arg(long, value_parser = parse_job_status)]
    pub status: Option<JobStatus>,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub phone: Option<String>,

    /// Absolute http(s) URL of the resume.
    #[arg(long)]
    pub resume_url: Option<String>,

    #[arg(long)]
    pub job_id: String,
}

#[derive(Debug, Args)]
pub struct ApplicationsArgs {
    #[arg(long)]
    pub job_id: String,
}

fn parse_job_status(value: &str) -> Result<JobStatus, String> {
    value.parse::<JobStatus>().map_err(|error| error.to_string())
}

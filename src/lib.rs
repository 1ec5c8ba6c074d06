#![deny(unsafe_code)]
//! agent-toolbelt
//!
//! Facade crate re-exporting the whole toolbelt: the contract types, the
//! dispatch runtime, the framework bridges, and one adapter per vendor.
//!
//! ```no_run
//! use agent_toolbelt::github::GithubToolset;
//! use agent_toolbelt::runtime::Dispatcher;
//! use serde_json::json;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let dispatcher = Dispatcher::new(GithubToolset::new("ghp_...")?);
//! let _issue = dispatcher
//!     .execute_function(
//!         "create_issue",
//!         json!({"owner": "octocat", "repo": "hello", "title": "Found a bug"}),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub use atb_backend_core as backend;
pub use atb_config as config;
pub use atb_core as core;
pub use atb_runtime as runtime;
pub use atb_telemetry as telemetry;

pub use anthropic_bridge as anthropic;
pub use openai_bridge as openai;

pub use firecrawl_tools as firecrawl;
pub use github_tools as github;
pub use jira_tools as jira;
pub use linear_tools as linear;
pub use mux_tools as mux;
pub use notion_tools as notion;
pub use paypal_tools as paypal;
pub use resend_tools as resend;
pub use stripe_tools as stripe;
pub use supabase_tools as supabase;
pub use twilio_tools as twilio;

/// Mock backend, handy outside this workspace's own tests too.
pub use atb_backend_mock as mock;

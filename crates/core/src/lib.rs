//! Batch remote-desktop session orchestration.
//!
//! Given a [`SessionConfig`], an [`Orchestrator`] walks a range of numbered
//! pool accounts (`YD001`, `YD002`, ...) on one host. For each account it
//! manages the host's credential-store entry, writes a connection descriptor
//! and launches the remote-desktop client, reporting progress as
//! [`RunEvent`]s.

#![forbid(unsafe_code)]

pub mod config;
pub mod credentials;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod orchestrator;

#[cfg(test)]
mod testing;

pub use config::{AudioMode, MAX_ACCOUNT_INDEX, SessionConfig, account_name};
pub use credentials::CredentialManager;
pub use error::{ConfigError, Error, Result};
pub use events::{EventSink, RunEvent, RunOutcome};
pub use orchestrator::{CancelFlag, Orchestrator, OrchestratorOptions, RunHandle, RunState};

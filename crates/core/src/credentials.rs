//! Credential lifecycle around each remote-desktop launch.
//!
//! Entries live in the OS generic-credential store and are keyed by
//! `TERMSRV/<host>`. Every operation is best-effort: failures become progress
//! events and never abort the batch.

use std::sync::Arc;

use massrdp_runtime::{ProcessLauncher, display_command};
use tracing::{debug, warn};

use crate::events::EventSink;

/// Port the remote-desktop client may append to the credential target.
pub const RDP_PORT: u16 = 3389;

/// Credential-store target for `host`.
pub fn credential_target(host: &str) -> String {
	format!("TERMSRV/{host}")
}

/// Drives the external credential-store command (`cmdkey`).
pub struct CredentialManager {
	launcher: Arc<dyn ProcessLauncher>,
	program: String,
}

impl CredentialManager {
	pub fn new(launcher: Arc<dyn ProcessLauncher>, program: impl Into<String>) -> Self {
		Self {
			launcher,
			program: program.into(),
		}
	}

	/// Removes any entry for `host`, with and without the port suffix.
	///
	/// A non-zero exit means the entry was absent and is not reported.
	pub async fn delete(&self, host: &str, events: &EventSink) {
		let target = credential_target(host);
		for target in [target.clone(), format!("{target}:{RDP_PORT}")] {
			let args = vec![format!("/delete:{target}")];
			match self.launcher.run_blocking(&self.program, &args).await {
				Ok(status) if status.success() => {
					debug!(target = "massrdp.credentials", credential = %target, "credential deleted");
				}
				Ok(status) => {
					debug!(target = "massrdp.credentials", credential = %target, %status, "no credential to delete");
				}
				Err(err) => {
					warn!(target = "massrdp.credentials", credential = %target, error = %err, "credential delete failed");
					events.progress(format!("Command failed: {} -> {err}", display_command(&self.program, &args)));
				}
			}
		}
	}

	/// Stores `login`/`password` as the generic credential for `host`.
	pub async fn store(&self, host: &str, login: &str, password: &str, events: &EventSink) {
		let target = credential_target(host);
		let args = vec![format!("/generic:{target}"), format!("/user:{login}"), format!("/pass:{password}")];
		let shown = display_command(&self.program, &masked(&args));

		match self.launcher.run_blocking(&self.program, &args).await {
			Ok(status) if status.success() => {
				debug!(target = "massrdp.credentials", credential = %target, login, "credential stored");
			}
			Ok(status) => {
				warn!(target = "massrdp.credentials", credential = %target, login, %status, "credential store rejected");
				events.progress(format!("Command failed: {shown} -> {status}"));
			}
			Err(err) => {
				warn!(target = "massrdp.credentials", credential = %target, login, error = %err, "credential store failed");
				events.progress(format!("Command failed: {shown} -> {err}"));
			}
		}
	}
}

fn masked(args: &[String]) -> Vec<String> {
	args.iter()
		.map(|arg| if arg.starts_with("/pass:") { "/pass:********".to_string() } else { arg.clone() })
		.collect()
}

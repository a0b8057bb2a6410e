//! Process launch helpers shared by the orchestrator and CLI consumers.
//!
//! Two invocation styles exist: blocking runs whose completion must be
//! observed before continuing (credential-store commands) and detached
//! launches for long-lived user-facing programs (the remote-desktop client).
//! Both discard the child's standard streams.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::LaunchError;

/// Windows creation flag that keeps console tools from flashing a window.
#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Completion status of a blocking invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessStatus {
	code: Option<i32>,
}

impl ProcessStatus {
	pub fn from_code(code: i32) -> Self {
		Self { code: Some(code) }
	}

	/// Status for a child that ended without an exit code (killed by a signal).
	pub fn terminated() -> Self {
		Self { code: None }
	}

	pub fn code(&self) -> Option<i32> {
		self.code
	}

	pub fn success(&self) -> bool {
		self.code == Some(0)
	}
}

impl From<std::process::ExitStatus> for ProcessStatus {
	fn from(status: std::process::ExitStatus) -> Self {
		Self { code: status.code() }
	}
}

impl fmt::Display for ProcessStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.code {
			Some(code) => write!(f, "exit code {code}"),
			None => write!(f, "terminated without exit code"),
		}
	}
}

/// Spawns external programs on behalf of the session orchestrator.
///
/// Implementations must report spawn problems through [`LaunchError`] and
/// never panic, so one failed invocation cannot take down a batch.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
	/// Runs `program` to completion and returns its status.
	async fn run_blocking(&self, program: &str, args: &[String]) -> Result<ProcessStatus, LaunchError>;

	/// Starts `program` without waiting for it.
	fn run_detached(&self, program: &str, args: &[String]) -> Result<(), LaunchError>;
}

/// [`ProcessLauncher`] backed by real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLauncher;

#[async_trait]
impl ProcessLauncher for SystemLauncher {
	async fn run_blocking(&self, program: &str, args: &[String]) -> Result<ProcessStatus, LaunchError> {
		let mut cmd = Command::new(program);
		cmd.args(args).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

		#[cfg(windows)]
		cmd.creation_flags(CREATE_NO_WINDOW);

		let mut child = cmd.spawn().map_err(|source| LaunchError::Spawn {
			program: program.to_string(),
			source,
		})?;
		let status = child.wait().await.map_err(|source| LaunchError::Wait {
			program: program.to_string(),
			source,
		})?;

		debug!(target = "massrdp.launcher", program, %status, "blocking command finished");
		Ok(status.into())
	}

	fn run_detached(&self, program: &str, args: &[String]) -> Result<(), LaunchError> {
		let mut cmd = std::process::Command::new(program);
		cmd.args(args).stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

		// Own process group so a Ctrl-C aimed at the CLI does not reach the client.
		#[cfg(unix)]
		std::os::unix::process::CommandExt::process_group(&mut cmd, 0);

		let spawn_error = |source| LaunchError::Spawn {
			program: program.to_string(),
			source,
		};

		// The child must be waited on once it exits or it lingers as a zombie
		// for the rest of the batch.
		match tokio::runtime::Handle::try_current() {
			Ok(runtime) => {
				let mut child = Command::from(cmd).spawn().map_err(spawn_error)?;
				debug!(target = "massrdp.launcher", program, pid = ?child.id(), "detached process started");
				let program = program.to_string();
				runtime.spawn(async move {
					match child.wait().await {
						Ok(status) => debug!(target = "massrdp.launcher", %program, %status, "detached process exited"),
						Err(err) => warn!(target = "massrdp.launcher", %program, error = %err, "failed to reap detached process"),
					}
				});
			}
			Err(_) => {
				let mut child = cmd.spawn().map_err(spawn_error)?;
				debug!(target = "massrdp.launcher", program, pid = child.id(), "detached process started");
				std::thread::spawn(move || {
					let _ = child.wait();
				});
			}
		}
		Ok(())
	}
}

/// Renders a command line for log and progress output.
pub fn display_command(program: &str, args: &[String]) -> String {
	let mut line = program.to_string();
	for arg in args {
		line.push(' ');
		line.push_str(arg);
	}
	line
}

/// Resolves `program` to an executable path.
///
/// Names containing a path separator are checked on disk; bare names are
/// searched on `PATH`.
pub fn resolve_program(program: &str) -> Option<PathBuf> {
	if program.contains('/') || program.contains('\\') {
		let path = Path::new(program);
		return path.is_file().then(|| path.to_path_buf());
	}
	which::which(program).ok()
}

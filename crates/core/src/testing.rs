//! Recording launcher used by the unit tests.

use async_trait::async_trait;
use massrdp_runtime::{LaunchError, ProcessLauncher, ProcessStatus};
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
	Blocking { program: String, args: Vec<String> },
	Detached { program: String, args: Vec<String> },
}

impl Call {
	pub(crate) fn blocking(program: &str, args: &[&str]) -> Self {
		Call::Blocking {
			program: program.to_string(),
			args: args.iter().map(|arg| arg.to_string()).collect(),
		}
	}

	pub(crate) fn is_detached(&self) -> bool {
		matches!(self, Call::Detached { .. })
	}
}

type BlockingFn = dyn Fn(&str, &[String]) -> Result<ProcessStatus, LaunchError> + Send + Sync;
type DetachedFn = dyn Fn(usize, &[String]) -> Result<(), LaunchError> + Send + Sync;

/// Records every invocation; outcomes come from the configured closures.
pub(crate) struct RecordingLauncher {
	calls: Mutex<Vec<Call>>,
	blocking: Box<BlockingFn>,
	detached: Box<DetachedFn>,
}

impl RecordingLauncher {
	pub(crate) fn new() -> Self {
		Self {
			calls: Mutex::new(Vec::new()),
			blocking: Box::new(|_, _| Ok(ProcessStatus::from_code(0))),
			detached: Box::new(|_, _| Ok(())),
		}
	}

	pub(crate) fn with_blocking(mut self, f: impl Fn(&str, &[String]) -> Result<ProcessStatus, LaunchError> + Send + Sync + 'static) -> Self {
		self.blocking = Box::new(f);
		self
	}

	/// `f` receives the zero-based count of earlier detached launches.
	pub(crate) fn with_detached(mut self, f: impl Fn(usize, &[String]) -> Result<(), LaunchError> + Send + Sync + 'static) -> Self {
		self.detached = Box::new(f);
		self
	}

	pub(crate) fn calls(&self) -> Vec<Call> {
		self.calls.lock().clone()
	}
}

#[async_trait]
impl ProcessLauncher for RecordingLauncher {
	async fn run_blocking(&self, program: &str, args: &[String]) -> Result<ProcessStatus, LaunchError> {
		self.calls.lock().push(Call::Blocking {
			program: program.to_string(),
			args: args.to_vec(),
		});
		(self.blocking)(program, args)
	}

	fn run_detached(&self, program: &str, args: &[String]) -> Result<(), LaunchError> {
		let launched = {
			let mut calls = self.calls.lock();
			let launched = calls.iter().filter(|call| call.is_detached()).count();
			calls.push(Call::Detached {
				program: program.to_string(),
				args: args.to_vec(),
			});
			launched
		};
		(self.detached)(launched, args)
	}
}

pub(crate) fn spawn_error(program: &str) -> LaunchError {
	LaunchError::Spawn {
		program: program.to_string(),
		source: std::io::Error::new(std::io::ErrorKind::NotFound, "program not found"),
	}
}

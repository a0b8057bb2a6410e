//! Session orchestration across the account pool.
//!
//! A run walks the configured index range in ascending order. For each
//! account it clears any stale credential for the host, optionally injects
//! the account's credential, writes a connection descriptor, and launches
//! the remote-desktop client detached. Runs execute on their own tokio task
//! and report back through an ordered event channel.
//!
//! # Per-account protocol
//!
//! 1. Stop if cancellation was requested.
//! 2. Emit the current account.
//! 3. Delete `TERMSRV/<host>` credentials.
//! 4. Store the account's credential when silent connect is enabled.
//! 5. Write the descriptor and launch the client against it.
//! 6. In auto mode, wait the configured delay in short slices.
//!
//! Delete runs before store and store before launch: the client reads the
//! credential store at connect time, so a leftover entry for the same host
//! would sign the new session in as the previous account.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use massrdp_runtime::{ProcessLauncher, display_command};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::SessionConfig;
use crate::credentials::CredentialManager;
use crate::descriptor;
use crate::error::Result;
use crate::events::{EventSink, RunEvent, RunOutcome};

/// Default credential-store command.
pub const DEFAULT_CREDENTIAL_TOOL: &str = "cmdkey";
/// Default remote-desktop client.
pub const DEFAULT_DESKTOP_CLIENT: &str = "mstsc";
/// Upper bound on one delay slice; bounds cancellation latency.
pub const MAX_DELAY_SLICE: Duration = Duration::from_millis(100);

/// Lifecycle of a run as seen by its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
	Idle,
	Running,
	Completed,
	Cancelled,
}

impl From<RunOutcome> for RunState {
	fn from(outcome: RunOutcome) -> Self {
		match outcome {
			RunOutcome::Completed => RunState::Completed,
			RunOutcome::Cancelled => RunState::Cancelled,
		}
	}
}

/// Cooperative cancellation shared between a caller and a run.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn cancel(&self) {
		self.0.store(true, Ordering::SeqCst);
	}

	pub fn is_cancelled(&self) -> bool {
		self.0.load(Ordering::SeqCst)
	}
}

/// External programs and locations a run uses.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
	pub credential_tool: String,
	pub desktop_client: String,
	/// Directory descriptors are written to.
	pub descriptor_dir: PathBuf,
	/// Granularity of the inter-account delay, capped at [`MAX_DELAY_SLICE`].
	pub delay_slice: Duration,
}

impl Default for OrchestratorOptions {
	fn default() -> Self {
		Self {
			credential_tool: DEFAULT_CREDENTIAL_TOOL.to_string(),
			desktop_client: DEFAULT_DESKTOP_CLIENT.to_string(),
			descriptor_dir: std::env::temp_dir(),
			delay_slice: MAX_DELAY_SLICE,
		}
	}
}

/// Starts runs against a process launcher.
pub struct Orchestrator {
	launcher: Arc<dyn ProcessLauncher>,
	options: OrchestratorOptions,
}

impl Orchestrator {
	pub fn new(launcher: Arc<dyn ProcessLauncher>, options: OrchestratorOptions) -> Self {
		Self { launcher, options }
	}

	/// Validates `config` and starts a run with a fresh cancellation flag.
	///
	/// Must be called from within a tokio runtime.
	pub fn start(&self, config: SessionConfig) -> Result<RunHandle> {
		self.start_with_cancel(config, CancelFlag::new())
	}

	/// Validates `config` and starts a run observing `cancel`.
	pub fn start_with_cancel(&self, config: SessionConfig, cancel: CancelFlag) -> Result<RunHandle> {
		config.validate()?;
		if config.silent_connect && config.password.is_empty() {
			warn!(target = "massrdp.run", "silent connect enabled with an empty password");
		}

		let (tx, rx) = mpsc::unbounded_channel();
		let state = Arc::new(Mutex::new(RunState::Running));
		let run = SessionRun {
			credentials: CredentialManager::new(self.launcher.clone(), self.options.credential_tool.clone()),
			launcher: self.launcher.clone(),
			options: self.options.clone(),
			config,
			cancel: cancel.clone(),
			events: EventSink::new(tx),
			state: state.clone(),
		};
		let task = tokio::spawn(run.execute());

		Ok(RunHandle {
			events: rx,
			cancel,
			state,
			task,
		})
	}
}

/// Caller's side of an in-flight run.
pub struct RunHandle {
	events: mpsc::UnboundedReceiver<RunEvent>,
	cancel: CancelFlag,
	state: Arc<Mutex<RunState>>,
	task: JoinHandle<RunOutcome>,
}

impl RunHandle {
	/// Requests cancellation; honored between steps and within delay slices.
	pub fn cancel(&self) {
		self.cancel.cancel();
	}

	pub fn cancel_flag(&self) -> CancelFlag {
		self.cancel.clone()
	}

	pub fn state(&self) -> RunState {
		*self.state.lock()
	}

	/// Next event in emission order; `None` once the run is over and drained.
	///
	/// Observing the finish event returns the run to [`RunState::Idle`].
	pub async fn next_event(&mut self) -> Option<RunEvent> {
		let event = self.events.recv().await;
		if let Some(RunEvent::Finished(_)) = event {
			*self.state.lock() = RunState::Idle;
		}
		event
	}

	/// Drains every remaining event until the run ends.
	pub async fn collect(mut self) -> Vec<RunEvent> {
		let mut events = Vec::new();
		while let Some(event) = self.next_event().await {
			events.push(event);
		}
		events
	}

	/// Waits for the run task and returns its outcome.
	pub async fn wait(self) -> RunOutcome {
		match self.task.await {
			Ok(outcome) => outcome,
			Err(err) => {
				warn!(target = "massrdp.run", error = %err, "run task ended abnormally");
				RunOutcome::Cancelled
			}
		}
	}
}

struct SessionRun {
	credentials: CredentialManager,
	launcher: Arc<dyn ProcessLauncher>,
	options: OrchestratorOptions,
	config: SessionConfig,
	cancel: CancelFlag,
	events: EventSink,
	state: Arc<Mutex<RunState>>,
}

impl SessionRun {
	async fn execute(self) -> RunOutcome {
		let range = self.config.effective_range();
		info!(
			target = "massrdp.run",
			host = %self.config.host,
			start = *range.start(),
			end = *range.end(),
			auto_mode = self.config.auto_mode,
			"run started"
		);

		let mut outcome = RunOutcome::Completed;
		for index in range {
			if self.cancel.is_cancelled() {
				outcome = RunOutcome::Cancelled;
				break;
			}
			self.process_account(index).await;

			if self.config.auto_mode && !self.pause().await {
				outcome = RunOutcome::Cancelled;
				break;
			}
		}

		info!(target = "massrdp.run", ?outcome, "run finished");
		*self.state.lock() = outcome.into();
		self.events.finished(outcome);
		outcome
	}

	async fn process_account(&self, index: u32) {
		let login = self.config.login_for(index);
		self.events.current_account(&login);
		self.events.progress(format!("Processing account {login}"));

		self.credentials.delete(&self.config.host, &self.events).await;
		if self.config.silent_connect {
			self.events.progress("Storing credentials for silent sign-in");
			self.credentials
				.store(&self.config.host, &login, &self.config.password, &self.events)
				.await;
		}

		let contents = descriptor::build(&self.config, &login);
		let path = match descriptor::write(&self.options.descriptor_dir, &login, &contents).await {
			Ok(path) => path,
			Err(err) => {
				warn!(target = "massrdp.run", login, error = %err, "descriptor write failed");
				self.events.progress(format!("Failed to write connection file for {login}: {err}"));
				return;
			}
		};

		let client = &self.options.desktop_client;
		self.events.progress(format!("Launching {client}: {}", path.display()));
		let args = vec![path.to_string_lossy().into_owned()];
		if let Err(err) = self.launcher.run_detached(client, &args) {
			warn!(target = "massrdp.run", login, error = %err, "client launch failed");
			self.events.progress(format!("Launch failed: {} -> {err}", display_command(client, &args)));
		}
	}

	/// Waits out the inter-account delay. Returns `false` when cancelled.
	async fn pause(&self) -> bool {
		let mut remaining = Duration::from_secs(self.config.auto_delay_seconds);
		if remaining.is_zero() {
			return true;
		}

		let slice = self.options.delay_slice.clamp(Duration::from_millis(1), MAX_DELAY_SLICE);
		while !remaining.is_zero() {
			if self.cancel.is_cancelled() {
				return false;
			}
			let step = remaining.min(slice);
			tokio::time::sleep(step).await;
			remaining -= step;
		}
		!self.cancel.is_cancelled()
	}
}

#[cfg(test)]
mod tests {
	use std::time::Instant;

	use massrdp_runtime::ProcessStatus;
	use tempfile::TempDir;

	use super::*;
	use crate::testing::{Call, RecordingLauncher, spawn_error};

	fn options(dir: &TempDir) -> OrchestratorOptions {
		OrchestratorOptions {
			descriptor_dir: dir.path().to_path_buf(),
			delay_slice: Duration::from_millis(10),
			..Default::default()
		}
	}

	fn scenario_config() -> SessionConfig {
		SessionConfig {
			host: "10.0.0.5".to_string(),
			domain: "CORP".to_string(),
			password: "p@ss".to_string(),
			start_index: 1,
			end_index: 3,
			auto_mode: true,
			auto_delay_seconds: 0,
			silent_connect: true,
			..Default::default()
		}
	}

	fn accounts(events: &[RunEvent]) -> Vec<String> {
		events
			.iter()
			.filter_map(|event| match event {
				RunEvent::CurrentAccount(login) => Some(login.clone()),
				_ => None,
			})
			.collect()
	}

	#[tokio::test]
	async fn auto_mode_visits_whole_range_in_order() {
		let dir = TempDir::new().unwrap();
		let launcher = Arc::new(RecordingLauncher::new());
		let orchestrator = Orchestrator::new(launcher, options(&dir));
		let config = SessionConfig {
			domain: String::new(),
			start_index: 4,
			end_index: 9,
			..scenario_config()
		};

		let events = orchestrator.start(config).unwrap().collect().await;

		assert_eq!(accounts(&events), ["YD004", "YD005", "YD006", "YD007", "YD008", "YD009"]);
		assert_eq!(events.last(), Some(&RunEvent::Finished(RunOutcome::Completed)));
	}

	#[tokio::test]
	async fn manual_mode_processes_only_start_index() {
		let dir = TempDir::new().unwrap();
		let launcher = Arc::new(RecordingLauncher::new());
		let orchestrator = Orchestrator::new(launcher.clone(), options(&dir));
		let config = SessionConfig {
			start_index: 12,
			end_index: 40,
			auto_mode: false,
			auto_delay_seconds: 30,
			..scenario_config()
		};

		let started = Instant::now();
		let events = orchestrator.start(config).unwrap().collect().await;

		assert_eq!(accounts(&events), ["CORP\\YD012"]);
		assert_eq!(events.last(), Some(&RunEvent::Finished(RunOutcome::Completed)));
		assert_eq!(launcher.calls().iter().filter(|call| call.is_detached()).count(), 1);
		assert!(started.elapsed() < Duration::from_secs(5), "manual mode must not wait the delay");
	}

	#[tokio::test]
	async fn each_account_deletes_stores_then_launches() {
		let dir = TempDir::new().unwrap();
		let launcher = Arc::new(RecordingLauncher::new());
		let orchestrator = Orchestrator::new(launcher.clone(), options(&dir));

		let events = orchestrator.start(scenario_config()).unwrap().collect().await;

		let mut expected = Vec::new();
		for n in 1..=3 {
			let user = format!("/user:CORP\\YD00{n}");
			expected.push(Call::blocking("cmdkey", &["/delete:TERMSRV/10.0.0.5"]));
			expected.push(Call::blocking("cmdkey", &["/delete:TERMSRV/10.0.0.5:3389"]));
			expected.push(Call::blocking("cmdkey", &["/generic:TERMSRV/10.0.0.5", user.as_str(), "/pass:p@ss"]));
			let path = dir.path().join(format!("remote_CORP_YD00{n}.rdp"));
			expected.push(Call::Detached {
				program: "mstsc".to_string(),
				args: vec![path.to_string_lossy().into_owned()],
			});
		}
		assert_eq!(launcher.calls(), expected);

		assert_eq!(accounts(&events), ["CORP\\YD001", "CORP\\YD002", "CORP\\YD003"]);
		assert_eq!(events.last(), Some(&RunEvent::Finished(RunOutcome::Completed)));

		let written = std::fs::read_to_string(dir.path().join("remote_CORP_YD002.rdp")).unwrap();
		assert_eq!(written, descriptor::build(&scenario_config(), "CORP\\YD002"));
	}

	#[tokio::test]
	async fn silent_connect_off_still_deletes_but_never_stores() {
		let dir = TempDir::new().unwrap();
		let launcher = Arc::new(RecordingLauncher::new());
		let orchestrator = Orchestrator::new(launcher.clone(), options(&dir));
		let config = SessionConfig {
			silent_connect: false,
			end_index: 1,
			..scenario_config()
		};

		orchestrator.start(config).unwrap().collect().await;

		let calls = launcher.calls();
		assert_eq!(calls.len(), 3);
		assert_eq!(calls[0], Call::blocking("cmdkey", &["/delete:TERMSRV/10.0.0.5"]));
		assert_eq!(calls[1], Call::blocking("cmdkey", &["/delete:TERMSRV/10.0.0.5:3389"]));
		assert!(calls[2].is_detached());
	}

	#[tokio::test]
	async fn progress_reports_descriptor_path() {
		let dir = TempDir::new().unwrap();
		let orchestrator = Orchestrator::new(Arc::new(RecordingLauncher::new()), options(&dir));
		let config = SessionConfig {
			end_index: 1,
			..scenario_config()
		};

		let events = orchestrator.start(config).unwrap().collect().await;

		let path = dir.path().join("remote_CORP_YD001.rdp");
		let expected = format!("Launching mstsc: {}", path.display());
		assert!(events.contains(&RunEvent::Progress(expected)), "events: {events:?}");
	}

	#[tokio::test]
	async fn cancel_after_first_launch_stops_before_second_account() {
		let dir = TempDir::new().unwrap();
		let cancel = CancelFlag::new();
		let trigger = cancel.clone();
		let launcher = Arc::new(RecordingLauncher::new().with_detached(move |launched, _| {
			if launched == 0 {
				trigger.cancel();
			}
			Ok(())
		}));
		let orchestrator = Orchestrator::new(launcher.clone(), options(&dir));

		let handle = orchestrator.start_with_cancel(scenario_config(), cancel).unwrap();
		let events = handle.collect().await;

		assert_eq!(accounts(&events), ["CORP\\YD001"]);
		assert_eq!(events.last(), Some(&RunEvent::Finished(RunOutcome::Cancelled)));
		assert_eq!(launcher.calls().iter().filter(|call| call.is_detached()).count(), 1);
	}

	#[tokio::test]
	async fn cancel_during_delay_returns_within_a_slice() {
		let dir = TempDir::new().unwrap();
		let orchestrator = Orchestrator::new(Arc::new(RecordingLauncher::new()), options(&dir));
		let config = SessionConfig {
			auto_delay_seconds: 30,
			..scenario_config()
		};

		let mut handle = orchestrator.start(config).unwrap();
		loop {
			match handle.next_event().await {
				Some(RunEvent::Progress(line)) if line.starts_with("Launching") => break,
				Some(_) => continue,
				None => panic!("run ended before first launch"),
			}
		}
		tokio::time::sleep(Duration::from_millis(50)).await;

		let requested = Instant::now();
		handle.cancel();
		let events = tokio::time::timeout(Duration::from_secs(2), handle.collect())
			.await
			.expect("cancellation must not wait for the full delay");

		// Test slices are 10ms; allow scheduling noise but not coarse sleeping.
		assert!(requested.elapsed() < Duration::from_millis(250), "took {:?}", requested.elapsed());
		assert_eq!(events.last(), Some(&RunEvent::Finished(RunOutcome::Cancelled)));
		assert!(accounts(&events).is_empty());
	}

	#[tokio::test]
	async fn launch_failure_does_not_block_next_account() {
		let dir = TempDir::new().unwrap();
		let launcher = Arc::new(RecordingLauncher::new().with_detached(|launched, _| {
			if launched == 0 { Err(spawn_error("mstsc")) } else { Ok(()) }
		}));
		let orchestrator = Orchestrator::new(launcher.clone(), options(&dir));
		let config = SessionConfig {
			end_index: 2,
			..scenario_config()
		};

		let events = orchestrator.start(config).unwrap().collect().await;

		assert_eq!(accounts(&events), ["CORP\\YD001", "CORP\\YD002"]);
		assert!(
			events
				.iter()
				.any(|event| matches!(event, RunEvent::Progress(line) if line.starts_with("Launch failed: mstsc")))
		);
		assert_eq!(events.last(), Some(&RunEvent::Finished(RunOutcome::Completed)));
	}

	#[tokio::test]
	async fn credential_failures_do_not_block_launch() {
		let dir = TempDir::new().unwrap();
		let launcher = Arc::new(RecordingLauncher::new().with_blocking(|program, args| {
			if args[0].starts_with("/generic") {
				Ok(ProcessStatus::from_code(1))
			} else {
				Err(spawn_error(program))
			}
		}));
		let orchestrator = Orchestrator::new(launcher.clone(), options(&dir));
		let config = SessionConfig {
			end_index: 2,
			..scenario_config()
		};

		let events = orchestrator.start(config).unwrap().collect().await;

		assert_eq!(accounts(&events), ["CORP\\YD001", "CORP\\YD002"]);
		assert_eq!(launcher.calls().iter().filter(|call| call.is_detached()).count(), 2);
		let failures = events
			.iter()
			.filter(|event| matches!(event, RunEvent::Progress(line) if line.starts_with("Command failed")))
			.count();
		assert_eq!(failures, 6);
	}

	#[tokio::test]
	async fn descriptor_write_failure_skips_launch_and_continues() {
		let dir = TempDir::new().unwrap();
		let blocker = dir.path().join("not-a-dir");
		std::fs::write(&blocker, "file in the way").unwrap();
		let launcher = Arc::new(RecordingLauncher::new());
		let orchestrator = Orchestrator::new(
			launcher.clone(),
			OrchestratorOptions {
				descriptor_dir: blocker,
				..options(&dir)
			},
		);
		let config = SessionConfig {
			end_index: 2,
			..scenario_config()
		};

		let events = orchestrator.start(config).unwrap().collect().await;

		assert_eq!(accounts(&events), ["CORP\\YD001", "CORP\\YD002"]);
		assert!(launcher.calls().iter().all(|call| !call.is_detached()));
		assert_eq!(events.last(), Some(&RunEvent::Finished(RunOutcome::Completed)));
	}

	#[tokio::test]
	async fn invalid_config_is_rejected_before_start() {
		let dir = TempDir::new().unwrap();
		let launcher = Arc::new(RecordingLauncher::new());
		let orchestrator = Orchestrator::new(launcher.clone(), options(&dir));
		let config = SessionConfig {
			host: String::new(),
			..scenario_config()
		};

		let err = orchestrator.start(config).err().expect("empty host must be rejected");
		assert!(err.to_string().contains("host must not be empty"));
		assert!(launcher.calls().is_empty());
	}

	#[tokio::test]
	async fn state_converges_to_idle_after_finish_is_observed() {
		let dir = TempDir::new().unwrap();
		let orchestrator = Orchestrator::new(Arc::new(RecordingLauncher::new()), options(&dir));
		let config = SessionConfig {
			end_index: 1,
			..scenario_config()
		};

		let mut handle = orchestrator.start(config).unwrap();
		assert_ne!(handle.state(), RunState::Idle);
		while let Some(event) = handle.next_event().await {
			if let RunEvent::Finished(outcome) = event {
				assert_eq!(outcome, RunOutcome::Completed);
				break;
			}
		}
		assert_eq!(handle.state(), RunState::Idle);
		assert_eq!(handle.wait().await, RunOutcome::Completed);
	}
}

//! Progress events delivered from a run to its caller.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::info;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunOutcome {
	/// Every account in the range was processed.
	Completed,
	/// Cancellation interrupted the run.
	Cancelled,
}

/// One event emitted by a run, in step order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RunEvent {
	/// Human-readable progress line.
	Progress(String),
	/// The login now being processed.
	CurrentAccount(String),
	/// The run is over; always the last event.
	Finished(RunOutcome),
}

/// Sending half of a run's event channel.
///
/// Sends never fail from the run's point of view: a caller that stopped
/// listening does not stop the run.
#[derive(Debug, Clone)]
pub struct EventSink {
	tx: mpsc::UnboundedSender<RunEvent>,
}

impl EventSink {
	pub fn new(tx: mpsc::UnboundedSender<RunEvent>) -> Self {
		Self { tx }
	}

	pub fn channel() -> (Self, mpsc::UnboundedReceiver<RunEvent>) {
		let (tx, rx) = mpsc::unbounded_channel();
		(Self::new(tx), rx)
	}

	pub fn progress(&self, line: impl Into<String>) {
		let line = line.into();
		info!(target = "massrdp.run", "{line}");
		self.send(RunEvent::Progress(line));
	}

	pub fn current_account(&self, login: &str) {
		self.send(RunEvent::CurrentAccount(login.to_string()));
	}

	pub fn finished(&self, outcome: RunOutcome) {
		self.send(RunEvent::Finished(outcome));
	}

	fn send(&self, event: RunEvent) {
		let _ = self.tx.send(event);
	}
}

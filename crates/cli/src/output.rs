//! Rendering of run events and configuration for the terminal.

use clap::ValueEnum;
use colored::Colorize;
use massrdp::config::mask_secret;
use massrdp::{RunEvent, RunOutcome, SessionConfig};

/// Output format for CLI results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
	/// Human-readable text
	#[default]
	Text,
	/// JSON (one object per line for streamed events)
	Json,
}

impl std::fmt::Display for OutputFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			OutputFormat::Text => write!(f, "text"),
			OutputFormat::Json => write!(f, "json"),
		}
	}
}

/// Renders one run event as a single line.
pub fn render_event(event: &RunEvent, format: OutputFormat) -> String {
	match format {
		OutputFormat::Json => serde_json::to_string(event).unwrap_or_default(),
		OutputFormat::Text => match event {
			RunEvent::Progress(line) => line.clone(),
			RunEvent::CurrentAccount(login) => format!("{} {}", "Current account:".bold(), login.cyan()),
			RunEvent::Finished(RunOutcome::Completed) => "Run completed".green().to_string(),
			RunEvent::Finished(RunOutcome::Cancelled) => "Run cancelled".yellow().to_string(),
		},
	}
}

/// Line announcing that a stop was requested.
pub fn render_stop_requested(format: OutputFormat) -> String {
	match format {
		OutputFormat::Json => serde_json::json!({ "event": "stop_requested" }).to_string(),
		OutputFormat::Text => "Stop requested, finishing current step...".yellow().to_string(),
	}
}

/// Renders the configuration with the password masked.
pub fn render_config(config: &SessionConfig, format: OutputFormat) -> String {
	match format {
		OutputFormat::Json => {
			let mut value = serde_json::to_value(config).unwrap_or_default();
			value["password"] = mask_secret(&config.password).into();
			serde_json::to_string_pretty(&value).unwrap_or_default()
		}
		OutputFormat::Text => {
			let rows = [
				("host", config.host.clone()),
				("domain", config.domain.clone()),
				("password", mask_secret(&config.password).to_string()),
				("start_index", config.start_index.to_string()),
				("end_index", config.end_index.to_string()),
				("auto_mode", config.auto_mode.to_string()),
				("auto_delay_seconds", config.auto_delay_seconds.to_string()),
				("share_clipboard", config.share_clipboard.to_string()),
				("share_printers", config.share_printers.to_string()),
				("share_comports", config.share_comports.to_string()),
				("share_smartcards", config.share_smartcards.to_string()),
				("share_posdevices", config.share_posdevices.to_string()),
				("redirect_drives", config.redirect_drives.to_string()),
				("redirect_devices", config.redirect_devices.to_string()),
				("audio_mode", format!("{:?}", config.audio_mode)),
				("audio_capture", config.audio_capture.to_string()),
				("silent_connect", config.silent_connect.to_string()),
			];
			rows.iter().map(|(key, value)| format!("{key}: {value}")).collect::<Vec<_>>().join("\n")
		}
	}
}

//! Configuration record for one orchestrator run.
//!
//! A [`SessionConfig`] is captured as an owned snapshot when a run starts and
//! is never mutated while the run is in flight. Persistence lives with the
//! caller; this module only defines the record, its defaults, and the checks
//! that must pass before a run may begin.

use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Highest account index the pool supports.
pub const MAX_ACCOUNT_INDEX: u32 = 500;

/// Prefix shared by every account in the pool.
pub const ACCOUNT_PREFIX: &str = "YD";

/// Where remote audio is played. Serialized as its integer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum AudioMode {
	PlayLocally = 0,
	PlayRemote = 1,
	#[default]
	Disabled = 2,
}

impl AudioMode {
	pub fn value(self) -> u8 {
		self as u8
	}
}

impl From<AudioMode> for u8 {
	fn from(mode: AudioMode) -> Self {
		mode.value()
	}
}

impl TryFrom<u8> for AudioMode {
	type Error = String;

	fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
		match value {
			0 => Ok(AudioMode::PlayLocally),
			1 => Ok(AudioMode::PlayRemote),
			2 => Ok(AudioMode::Disabled),
			other => Err(format!("unknown audio mode: {other}")),
		}
	}
}

/// Settings for a batch of remote-desktop launches.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
	pub host: String,
	pub domain: String,
	pub password: String,
	pub start_index: u32,
	pub end_index: u32,
	pub auto_mode: bool,
	pub auto_delay_seconds: u64,

	pub share_clipboard: bool,
	pub share_printers: bool,
	pub share_comports: bool,
	pub share_smartcards: bool,
	pub share_posdevices: bool,
	pub redirect_drives: bool,
	pub redirect_devices: bool,

	pub audio_mode: AudioMode,
	pub audio_capture: bool,

	/// Inject credentials into the OS store before each launch.
	pub silent_connect: bool,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			host: "localhost".to_string(),
			domain: String::new(),
			password: String::new(),
			start_index: 1,
			end_index: 199,
			auto_mode: true,
			auto_delay_seconds: 10,
			share_clipboard: false,
			share_printers: false,
			share_comports: false,
			share_smartcards: false,
			share_posdevices: false,
			redirect_drives: false,
			redirect_devices: false,
			audio_mode: AudioMode::Disabled,
			audio_capture: false,
			silent_connect: true,
		}
	}
}

impl fmt::Debug for SessionConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("SessionConfig")
			.field("host", &self.host)
			.field("domain", &self.domain)
			.field("password", &mask_secret(&self.password))
			.field("start_index", &self.start_index)
			.field("end_index", &self.end_index)
			.field("auto_mode", &self.auto_mode)
			.field("auto_delay_seconds", &self.auto_delay_seconds)
			.field("share_clipboard", &self.share_clipboard)
			.field("share_printers", &self.share_printers)
			.field("share_comports", &self.share_comports)
			.field("share_smartcards", &self.share_smartcards)
			.field("share_posdevices", &self.share_posdevices)
			.field("redirect_drives", &self.redirect_drives)
			.field("redirect_devices", &self.redirect_devices)
			.field("audio_mode", &self.audio_mode)
			.field("audio_capture", &self.audio_capture)
			.field("silent_connect", &self.silent_connect)
			.finish()
	}
}

impl SessionConfig {
	/// Parses a stored record. Absent fields take their default values.
	pub fn from_json(content: &str) -> Result<Self> {
		Ok(serde_json::from_str(content)?)
	}

	pub fn to_json_pretty(&self) -> Result<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	/// Checks the invariants a run depends on.
	pub fn validate(&self) -> std::result::Result<(), ConfigError> {
		if self.host.trim().is_empty() {
			return Err(ConfigError::EmptyHost);
		}
		check_index("start_index", self.start_index)?;
		check_index("end_index", self.end_index)?;
		if self.start_index > self.end_index {
			return Err(ConfigError::StartAfterEnd {
				start: self.start_index,
				end: self.end_index,
			});
		}
		Ok(())
	}

	/// Indices a run will visit.
	///
	/// The start is clamped to 1 and the end to at least the start. Without
	/// auto mode only the start index is visited.
	pub fn effective_range(&self) -> RangeInclusive<u32> {
		let start = self.start_index.max(1);
		let end = if self.auto_mode { self.end_index.max(start) } else { start };
		start..=end
	}

	/// Login for the account at `index`, qualified with the domain when one is set.
	pub fn login_for(&self, index: u32) -> String {
		let account = account_name(index);
		if self.domain.is_empty() {
			account
		} else {
			format!("{}\\{}", self.domain, account)
		}
	}
}

/// Pool account name for `index`, zero-padded to three digits.
pub fn account_name(index: u32) -> String {
	format!("{ACCOUNT_PREFIX}{index:03}")
}

/// Placeholder shown instead of a secret.
pub fn mask_secret(secret: &str) -> &'static str {
	if secret.is_empty() { "" } else { "********" }
}

fn check_index(field: &'static str, value: u32) -> std::result::Result<(), ConfigError> {
	if (1..=MAX_ACCOUNT_INDEX).contains(&value) {
		Ok(())
	} else {
		Err(ConfigError::IndexOutOfRange {
			field,
			value,
			max: MAX_ACCOUNT_INDEX,
		})
	}
}

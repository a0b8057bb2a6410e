//! Connection descriptor generation for the remote-desktop client.
//!
//! A descriptor is a plain-text document of `key:type:value` lines. Building
//! one is a pure transform of the configuration and a login; writing it to
//! disk is a separate step owned by the orchestrator.

use std::path::{Path, PathBuf};

use crate::config::SessionConfig;
use crate::error::Result;

/// Every attribute key a descriptor carries, in emission order.
pub const DESCRIPTOR_KEYS: [&str; 18] = [
	"full address",
	"username",
	"screen mode id",
	"session bpp",
	"authentication level",
	"enablecredsspsupport",
	"prompt for credentials on client",
	"promptcredentialonce",
	"redirectclipboard",
	"redirectprinters",
	"redirectcomports",
	"redirectsmartcards",
	"redirectposdevices",
	"drivestoredirect",
	"devicestoredirect",
	"audiomode",
	"audiocapturemode",
	"audioqualitymode",
];

/// Full-screen session.
const SCREEN_MODE_FULL: u8 = 2;
const SESSION_BPP: u8 = 32;
const AUTHENTICATION_LEVEL: u8 = 2;
/// Lowest audio quality; not user-configurable.
const AUDIO_QUALITY_MODE: u8 = 0;

/// Builds the descriptor text for `login`.
///
/// Credential prompts are always disabled: silent connection relies on the
/// credential store holding the secret before the client starts.
pub fn build(config: &SessionConfig, login: &str) -> String {
	let lines = [
		string_line("full address", &config.host),
		string_line("username", login),
		int_line("screen mode id", SCREEN_MODE_FULL),
		int_line("session bpp", SESSION_BPP),
		int_line("authentication level", AUTHENTICATION_LEVEL),
		flag_line("enablecredsspsupport", true),
		flag_line("prompt for credentials on client", false),
		flag_line("promptcredentialonce", false),
		flag_line("redirectclipboard", config.share_clipboard),
		flag_line("redirectprinters", config.share_printers),
		flag_line("redirectcomports", config.share_comports),
		flag_line("redirectsmartcards", config.share_smartcards),
		flag_line("redirectposdevices", config.share_posdevices),
		redirect_line("drivestoredirect", config.redirect_drives),
		redirect_line("devicestoredirect", config.redirect_devices),
		int_line("audiomode", config.audio_mode.value()),
		flag_line("audiocapturemode", config.audio_capture),
		int_line("audioqualitymode", AUDIO_QUALITY_MODE),
	];
	lines.join("\n")
}

/// File name for `login`'s descriptor; unique per login.
pub fn file_name(login: &str) -> String {
	format!("remote_{}.rdp", login.replace('\\', "_"))
}

/// Writes a descriptor for `login` into `dir` and returns its path.
pub async fn write(dir: &Path, login: &str, contents: &str) -> Result<PathBuf> {
	tokio::fs::create_dir_all(dir).await?;
	let path = dir.join(file_name(login));
	tokio::fs::write(&path, contents).await?;
	Ok(path)
}

fn string_line(key: &str, value: &str) -> String {
	format!("{key}:s:{value}")
}

fn int_line(key: &str, value: u8) -> String {
	format!("{key}:i:{value}")
}

fn flag_line(key: &str, enabled: bool) -> String {
	int_line(key, u8::from(enabled))
}

// All-or-nothing: the client accepts `*` for every drive/device or nothing.
fn redirect_line(key: &str, enabled: bool) -> String {
	string_line(key, if enabled { "*" } else { "" })
}

//! Persistent configuration storage across invocations.
//!
//! The record lives at `<config dir>/MassRDPLoader/MassRDPLoader/config.json`
//! unless `--config` or `MASSRDP_CONFIG` points elsewhere. A missing or
//! corrupted file is never an error: defaults are written back and used.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use massrdp::SessionConfig;
use tracing::{debug, warn};


const APP_ORG: &str = "MassRDPLoader";
const APP_NAME: &str = "MassRDPLoader";
const CONFIG_FILE: &str = "config.json";

/// JSON-backed store for one [`SessionConfig`].
#[derive(Debug, Clone)]
pub struct ConfigStore {
	path: PathBuf,
}

impl ConfigStore {
	pub fn new(path: PathBuf) -> Self {
		Self { path }
	}

	/// Store at `path`, or at the platform default location.
	pub fn open(path: Option<PathBuf>) -> Self {
		Self::new(path.unwrap_or_else(default_config_path))
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Loads the stored record, falling back to defaults when it is absent or unreadable.
	///
	/// The fallback is written back so the next load finds a valid file.
	pub fn load(&self) -> SessionConfig {
		self.read().unwrap_or_else(|| self.restore_defaults())
	}

	/// Like [`ConfigStore::load`] but never touches the file.
	pub fn peek(&self) -> SessionConfig {
		self.read().unwrap_or_default()
	}

	fn read(&self) -> Option<SessionConfig> {
		let content = match fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
				debug!(target = "massrdp.config", path = %self.path.display(), "no stored config");
				return None;
			}
			Err(err) => {
				warn!(target = "massrdp.config", path = %self.path.display(), error = %err, "stored config unreadable; using defaults");
				return None;
			}
		};

		match SessionConfig::from_json(&content) {
			Ok(config) => Some(config),
			Err(err) => {
				warn!(target = "massrdp.config", path = %self.path.display(), error = %err, "stored config corrupted; using defaults");
				None
			}
		}
	}

	pub fn save(&self, config: &SessionConfig) -> Result<()> {
		if let Some(parent) = self.path.parent() {
			fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
		}
		let json = config.to_json_pretty()?;
		fs::write(&self.path, json).with_context(|| format!("writing {}", self.path.display()))?;
		Ok(())
	}

	/// Overwrites the stored record with defaults.
	pub fn reset(&self) -> Result<SessionConfig> {
		let config = SessionConfig::default();
		self.save(&config)?;
		Ok(config)
	}

	fn restore_defaults(&self) -> SessionConfig {
		let config = SessionConfig::default();
		if let Err(err) = self.save(&config) {
			warn!(target = "massrdp.config", path = %self.path.display(), error = %err, "failed to write default config");
		}
		config
	}
}

/// Platform config location used when no explicit path is given.
pub fn default_config_path() -> PathBuf {
	dirs::config_dir()
		.or_else(|| dirs::home_dir().map(|home| home.join(".config")))
		.unwrap_or_else(|| PathBuf::from("."))
		.join(APP_ORG)
		.join(APP_NAME)
		.join(CONFIG_FILE)
}

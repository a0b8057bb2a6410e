use thiserror::Error;

/// A configuration that must not be run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
	#[error("host must not be empty")]
	EmptyHost,

	#[error("{field} must be between 1 and {max}, got {value}")]
	IndexOutOfRange { field: &'static str, value: u32, max: u32 },

	#[error("start index {start} is greater than end index {end}")]
	StartAfterEnd { start: u32, end: u32 },
}

#[derive(Debug, Error)]
pub enum Error {
	#[error("invalid configuration: {0}")]
	Config(#[from] ConfigError),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

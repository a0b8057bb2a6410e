use thiserror::Error;

/// Failure to start or observe an external program.
#[derive(Debug, Error)]
pub enum LaunchError {
	#[error("failed to start {program}: {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed waiting for {program}: {source}")]
	Wait {
		program: String,
		#[source]
		source: std::io::Error,
	},
}

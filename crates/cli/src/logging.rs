//! Tracing subscriber setup for the CLI.

use tracing_subscriber::EnvFilter;

const CRATES: [&str; 3] = ["massrdp", "massrdp_runtime", "massrdp_cli"];

/// Installs a stderr subscriber. `RUST_LOG` takes precedence over `verbosity`.
pub fn init_logging(verbosity: u8) {
	let level = match verbosity {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	};

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.try_init();
}

fn default_directives(level: &str) -> String {
	CRATES.iter().map(|krate| format!("{krate}={level}")).collect::<Vec<_>>().join(",")
}

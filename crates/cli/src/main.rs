use clap::Parser;
use massrdp_cli::cli::Cli;
use massrdp_cli::config_store::ConfigStore;
use massrdp_cli::{commands, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	let store = ConfigStore::open(cli.config);

	if let Err(err) = commands::dispatch(cli.command, &store).await {
		error!(target = "massrdp", error = %err, "command failed");
		eprintln!("error: {err:#}");
		std::process::exit(1);
	}
}

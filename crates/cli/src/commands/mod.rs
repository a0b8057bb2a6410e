mod config;
mod doctor;
mod preview;
mod run;

use anyhow::Result;

use crate::cli::Commands;
use crate::config_store::ConfigStore;

pub async fn dispatch(command: Commands, store: &ConfigStore) -> Result<()> {
	match command {
		Commands::Run(args) => run::execute(store, args).await,
		Commands::Config { action } => config::execute(store, action),
		Commands::Preview { index } => preview::execute(store, index),
		Commands::Doctor(programs) => doctor::execute(&programs),
	}
}

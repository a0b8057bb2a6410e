use anyhow::Result;

use crate::cli::{ConfigAction, ConfigOverrides};
use crate::config_store::ConfigStore;
use crate::output::{OutputFormat, render_config};

pub fn execute(store: &ConfigStore, action: ConfigAction) -> Result<()> {
	match action {
		ConfigAction::Show { format } => show(store, format),
		ConfigAction::Set(overrides) => set(store, &overrides),
		ConfigAction::Reset => {
			store.reset()?;
			println!("Configuration reset to defaults: {}", store.path().display());
			Ok(())
		}
		ConfigAction::Path => {
			println!("{}", store.path().display());
			Ok(())
		}
	}
}

fn show(store: &ConfigStore, format: OutputFormat) -> Result<()> {
	println!("{}", render_config(&store.load(), format));
	Ok(())
}

fn set(store: &ConfigStore, overrides: &ConfigOverrides) -> Result<()> {
	let mut config = store.load();
	overrides.apply(&mut config);
	config.validate()?;
	store.save(&config)?;
	println!("Configuration saved: {}", store.path().display());
	Ok(())
}

use anyhow::{Result, bail};
use massrdp::{MAX_ACCOUNT_INDEX, descriptor};

use crate::config_store::ConfigStore;

pub fn execute(store: &ConfigStore, index: Option<u32>) -> Result<()> {
	let config = store.peek();
	let index = index.unwrap_or(config.start_index);
	if !(1..=MAX_ACCOUNT_INDEX).contains(&index) {
		bail!("account index must be between 1 and {MAX_ACCOUNT_INDEX}, got {index}");
	}

	let login = config.login_for(index);
	println!("# {}", descriptor::file_name(&login));
	println!("{}", descriptor::build(&config, &login));
	Ok(())
}

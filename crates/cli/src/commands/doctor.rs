//! Reports whether the external programs a run depends on can be found.

use anyhow::{Result, bail};
use colored::Colorize;
use massrdp_runtime::resolve_program;

use crate::cli::ProgramArgs;

pub fn execute(programs: &ProgramArgs) -> Result<()> {
	let checks = [("credential tool", &programs.credential_tool), ("remote-desktop client", &programs.client)];

	let mut missing = Vec::new();
	for (role, program) in checks {
		match resolve_program(program) {
			Some(path) => println!("{} {role}: {program} ({})", "ok".green(), path.display()),
			None => {
				println!("{} {role}: {program} not found", "missing".red());
				missing.push(program.as_str());
			}
		}
	}

	if !missing.is_empty() {
		bail!("required programs not found: {}", missing.join(", "));
	}
	Ok(())
}

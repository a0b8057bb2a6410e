//! Runs the orchestrator for the stored (and overridden) configuration.
//!
//! Ctrl-C requests cancellation the way the Stop button did; the run still
//! finishes its current step and emits its finish event before exiting.

use std::sync::Arc;

use anyhow::Result;
use massrdp::{Orchestrator, OrchestratorOptions, RunEvent, RunOutcome, SessionConfig};
use massrdp_runtime::SystemLauncher;
use tracing::info;

use crate::cli::RunArgs;
use crate::config_store::ConfigStore;
use crate::output::{render_event, render_stop_requested};

pub async fn execute(store: &ConfigStore, args: RunArgs) -> Result<()> {
	let mut config = store.load();
	args.overrides.apply(&mut config);
	config.validate()?;

	if !args.no_save {
		store.save(&config)?;
	}

	let mut options = OrchestratorOptions {
		credential_tool: args.programs.credential_tool.clone(),
		desktop_client: args.programs.client.clone(),
		..Default::default()
	};
	if let Some(dir) = &args.descriptor_dir {
		options.descriptor_dir = dir.clone();
	}

	let orchestrator = Orchestrator::new(Arc::new(SystemLauncher), options);
	let mut handle = orchestrator.start(config.clone())?;
	let cancel = handle.cancel_flag();

	let ctrl_c = tokio::signal::ctrl_c();
	tokio::pin!(ctrl_c);

	let mut outcome = None;
	loop {
		tokio::select! {
			event = handle.next_event() => {
				let Some(event) = event else { break };
				println!("{}", render_event(&event, args.format));
				if let RunEvent::Finished(finished) = event {
					outcome = Some(finished);
				}
			}
			_ = &mut ctrl_c, if !cancel.is_cancelled() => {
				info!(target = "massrdp.run", "stop requested");
				cancel.cancel();
				println!("{}", render_stop_requested(args.format));
			}
		}
	}

	if outcome == Some(RunOutcome::Completed) && !args.no_save {
		if let Some(next) = next_start_index(&config) {
			config.start_index = next;
			store.save(&config)?;
			info!(target = "massrdp.run", start_index = next, "advanced start index for next run");
		}
	}
	Ok(())
}

/// After a single-account run, the next run starts one account further on.
fn next_start_index(config: &SessionConfig) -> Option<u32> {
	(!config.auto_mode && config.start_index < config.end_index).then(|| config.start_index + 1)
}

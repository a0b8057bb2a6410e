use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use massrdp::orchestrator::{DEFAULT_CREDENTIAL_TOOL, DEFAULT_DESKTOP_CLIENT};
use massrdp::{AudioMode, SessionConfig};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "massrdp")]
#[command(about = "Batch launcher for remote-desktop sessions over a numbered account pool")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Configuration file to load and save
	#[arg(long, global = true, value_name = "FILE", env = "MASSRDP_CONFIG")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Launch sessions for the configured account range
	Run(RunArgs),

	/// Inspect or edit the stored configuration
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},

	/// Print the connection file for one account without launching anything
	Preview {
		/// Account index (defaults to the configured start index)
		#[arg(long)]
		index: Option<u32>,
	},

	/// Check that the credential tool and remote-desktop client can be found
	Doctor(ProgramArgs),
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
	/// Show the stored configuration (password masked)
	Show {
		#[arg(short, long, value_enum, default_value = "text")]
		format: OutputFormat,
	},
	/// Update stored fields
	Set(ConfigOverrides),
	/// Restore default settings
	Reset,
	/// Print the configuration file location
	Path,
}

#[derive(Args, Debug)]
pub struct RunArgs {
	#[command(flatten)]
	pub overrides: ConfigOverrides,

	#[command(flatten)]
	pub programs: ProgramArgs,

	/// Output format for progress events
	#[arg(short, long, value_enum, default_value = "text")]
	pub format: OutputFormat,

	/// Do not persist the submitted configuration
	#[arg(long)]
	pub no_save: bool,

	/// Directory for generated connection files (defaults to the temp dir)
	#[arg(long, value_name = "DIR")]
	pub descriptor_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ProgramArgs {
	/// Credential-store command
	#[arg(long, value_name = "PROGRAM", default_value = DEFAULT_CREDENTIAL_TOOL)]
	pub credential_tool: String,

	/// Remote-desktop client
	#[arg(long, value_name = "PROGRAM", default_value = DEFAULT_DESKTOP_CLIENT)]
	pub client: String,
}

/// Field overrides applied on top of the stored configuration.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigOverrides {
	/// Remote host name or address
	#[arg(long)]
	pub host: Option<String>,

	/// Login domain (empty for unqualified accounts)
	#[arg(long)]
	pub domain: Option<String>,

	/// Password shared by the pool accounts
	#[arg(long)]
	pub password: Option<String>,

	/// First account index
	#[arg(long)]
	pub start: Option<u32>,

	/// Last account index
	#[arg(long)]
	pub end: Option<u32>,

	/// Process the whole range unattended
	#[arg(long, value_name = "BOOL")]
	pub auto: Option<bool>,

	/// Seconds between accounts in auto mode
	#[arg(long, value_name = "SECONDS")]
	pub delay: Option<u64>,

	/// Share the clipboard
	#[arg(long, value_name = "BOOL")]
	pub clipboard: Option<bool>,

	/// Share printers
	#[arg(long, value_name = "BOOL")]
	pub printers: Option<bool>,

	/// Share serial ports
	#[arg(long, value_name = "BOOL")]
	pub comports: Option<bool>,

	/// Share smart cards
	#[arg(long, value_name = "BOOL")]
	pub smartcards: Option<bool>,

	/// Share point-of-service devices
	#[arg(long, value_name = "BOOL")]
	pub posdevices: Option<bool>,

	/// Redirect all local drives
	#[arg(long, value_name = "BOOL")]
	pub drives: Option<bool>,

	/// Redirect all plug-and-play devices
	#[arg(long, value_name = "BOOL")]
	pub devices: Option<bool>,

	/// Where remote audio plays
	#[arg(long, value_enum)]
	pub audio: Option<AudioArg>,

	/// Redirect the local microphone
	#[arg(long, value_name = "BOOL")]
	pub audio_capture: Option<bool>,

	/// Inject credentials before launch so the client does not prompt
	#[arg(long, value_name = "BOOL")]
	pub silent: Option<bool>,
}

impl ConfigOverrides {
	pub fn apply(&self, config: &mut SessionConfig) {
		if let Some(host) = &self.host {
			config.host = host.trim().to_string();
		}
		if let Some(domain) = &self.domain {
			config.domain = domain.trim().to_string();
		}
		if let Some(password) = &self.password {
			config.password = password.clone();
		}
		set(&mut config.start_index, self.start);
		set(&mut config.end_index, self.end);
		set(&mut config.auto_mode, self.auto);
		set(&mut config.auto_delay_seconds, self.delay);
		set(&mut config.share_clipboard, self.clipboard);
		set(&mut config.share_printers, self.printers);
		set(&mut config.share_comports, self.comports);
		set(&mut config.share_smartcards, self.smartcards);
		set(&mut config.share_posdevices, self.posdevices);
		set(&mut config.redirect_drives, self.drives);
		set(&mut config.redirect_devices, self.devices);
		set(&mut config.audio_mode, self.audio.map(AudioMode::from));
		set(&mut config.audio_capture, self.audio_capture);
		set(&mut config.silent_connect, self.silent);
	}
}

fn set<T>(field: &mut T, value: Option<T>) {
	if let Some(value) = value {
		*field = value;
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AudioArg {
	/// Play on this computer
	Local,
	/// Play on the remote computer
	Remote,
	/// Do not play
	Disabled,
}

impl From<AudioArg> for AudioMode {
	fn from(arg: AudioArg) -> Self {
		match arg {
			AudioArg::Local => AudioMode::PlayLocally,
			AudioArg::Remote => AudioMode::PlayRemote,
			AudioArg::Disabled => AudioMode::Disabled,
		}
	}
}

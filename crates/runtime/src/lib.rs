//! External process plumbing for the MassRDP loader.

pub mod error;
pub mod process;

pub use error::LaunchError;
pub use process::{ProcessLauncher, ProcessStatus, SystemLauncher, display_command, resolve_program};

pub mod cli;
pub mod commands;
pub mod config_store;
pub mod logging;
pub mod output;

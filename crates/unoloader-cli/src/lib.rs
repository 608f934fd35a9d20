//! Bootstrap entry point for unoloader.
//!
//! The binary in `main.rs` parses the command line and hands a
//! [`BootstrapConfig`] to [`bootstrap::run`].

#![deny(unsafe_code)]

pub mod bootstrap;
pub mod config;
pub mod entry;
pub mod error;
pub mod parser;

pub use bootstrap::Bootstrap;
pub use config::{BootstrapConfig, SEARCH_PATH_ENV};
pub use entry::{EntryInvocation, EntrySource, discover_entry, manifest_entry};
pub use error::CliError;
pub use parser::Cli;

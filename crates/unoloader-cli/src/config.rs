//! Bootstrap configuration.
//!
//! Values come from command-line flags, then the process environment, then a
//! `.env` file loaded by `main` before parsing. Everything downstream receives
//! plain values from [`BootstrapConfig`] and never reads the environment.

use std::io;
use std::path::PathBuf;

use crate::parser::Cli;

/// Environment variable holding resource locations searched before the
/// installation's.
pub const SEARCH_PATH_ENV: &str = "UNOLOADER_PATH";

/// Resolved inputs of one bootstrap run.
#[derive(Debug, Clone, Default)]
pub struct BootstrapConfig {
    /// Raw resource search path, platform path-list separated.
    pub search_path: Option<String>,
    /// Explicit installation directory.
    pub uno_path: Option<PathBuf>,
    /// Directory relative resource locations are resolved against.
    pub base_dir: PathBuf,
    /// Entry identifier (unless a manifest names one) and application arguments.
    pub args: Vec<String>,
}

impl BootstrapConfig {
    /// Build the configuration from parsed flags, resolving relative
    /// locations against the current directory.
    pub fn from_cli(cli: Cli) -> io::Result<Self> {
        Ok(Self {
            search_path: cli.search_path.filter(|s| !s.is_empty()),
            uno_path: cli.uno_path.filter(|p| !p.as_os_str().is_empty()),
            base_dir: std::env::current_dir()?,
            args: cli.args,
        })
    }
}

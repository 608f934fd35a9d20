//! Command-line definition.

use std::path::PathBuf;

use clap::Parser;
use unoloader_runtime::UNO_PATH_ENV;

use crate::config::SEARCH_PATH_ENV;

/// Bootstrap a UNO application: find the office installation, build a module
/// loader over its resource locations and run the application's entry point.
#[derive(Debug, Parser)]
#[command(name = "unoloader")]
#[command(version)]
pub struct Cli {
    /// Office program directory, bypassing installation discovery
    #[arg(long = "uno-path", env = UNO_PATH_ENV, value_name = "DIR")]
    pub uno_path: Option<PathBuf>,

    /// Resource locations searched before the installation's, separated like PATH
    #[arg(long = "search-path", env = SEARCH_PATH_ENV, value_name = "LOCATIONS")]
    pub search_path: Option<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Entry module (unless a manifest names one) followed by its arguments
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

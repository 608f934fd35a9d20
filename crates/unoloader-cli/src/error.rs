//! CLI error type and exit codes.

use thiserror::Error;
use unoloader_core::LoadError;
use unoloader_runtime::InvokeError;

/// Fatal bootstrap failures.
#[derive(Debug, Error)]
pub enum CliError {
    /// Neither a manifest nor the command line named an entry module.
    #[error("no entry module: no manifest names an Application-Class and no argument was given")]
    MissingEntryIdentifier,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}

impl CliError {
    /// Map error to a process exit code.
    ///
    /// A failing entry program passes its own exit code through; everything
    /// else follows sysexits.h.
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::MissingEntryIdentifier => 2, // EX_USAGE
            Self::Invoke(InvokeError::ExitCode { code, .. }) => *code,
            Self::Invoke(InvokeError::Spawn { .. }) => 71, // EX_OSERR
            Self::Load(_) | Self::Invoke(_) | Self::Task(_) => 70, // EX_SOFTWARE
        }
    }
}

//! Querying an installation's `unoinfo` helper for resource locations.
//!
//! `unoinfo java` prints one sentinel byte selecting the encoding, followed by
//! NUL-separated resource locations (see [`unoloader_core::envelope`]).
//! Every failure (launch, read, oversized output, non-zero exit, bad
//! envelope) is logged and yields no locations; the bootstrap carries on with
//! what it already has.
//!
//! There is no timeout: a helper that never exits stalls the
//! bootstrap.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{debug, warn};
use unoloader_core::envelope::{Envelope, EnvelopeError};
use unoloader_core::{ResourceHelperPort, ResourceLocation, locations_from_paths};

use crate::drain::spawn_drain;

/// File name of the helper inside an installation directory.
#[cfg(windows)]
pub const HELPER_NAME: &str = "unoinfo.exe";
/// File name of the helper inside an installation directory.
#[cfg(not(windows))]
pub const HELPER_NAME: &str = "unoinfo";

/// Argument selecting the ecosystem whose resource locations are wanted.
pub const HELPER_ECOSYSTEM: &str = "java";

/// Initial size of the stdout buffer.
pub const INITIAL_CAPACITY: usize = 1000;

/// Largest stdout buffer the reader will grow to.
pub const DEFAULT_OUTPUT_CEILING: usize = 1_073_741_823;

/// Errors raised while running the helper.
#[derive(Debug, Error)]
pub enum HelperError {
    #[error("exec {}: {source}", .path.display())]
    Launch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("reading unoinfo output: {0}")]
    Read(#[source] io::Error),

    #[error("too much unoinfo output (limit {ceiling} bytes)")]
    TooMuchOutput { ceiling: usize },

    #[error("waiting for unoinfo: {0}")]
    Wait(#[source] io::Error),

    #[error("unoinfo exit value {0}")]
    ExitCode(i32),

    #[error("unoinfo terminated by signal")]
    Terminated,

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

/// Read `reader` to the end into a buffer that starts at `initial` bytes and
/// doubles whenever it fills up.
///
/// Fails with [`HelperError::TooMuchOutput`] as soon as doubling would exceed
/// `ceiling`, without reading the rest of the stream.
pub async fn read_bounded<R>(
    reader: &mut R,
    initial: usize,
    ceiling: usize,
) -> Result<Vec<u8>, HelperError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = vec![0u8; initial.max(1)];
    let mut filled = 0;

    loop {
        if filled == buf.len() {
            let doubled = filled
                .checked_mul(2)
                .filter(|&size| size <= ceiling)
                .ok_or(HelperError::TooMuchOutput { ceiling })?;
            buf.resize(doubled, 0);
        }
        let n = reader
            .read(&mut buf[filled..])
            .await
            .map_err(HelperError::Read)?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    buf.truncate(filled);
    Ok(buf)
}

/// Runs `<installation>/unoinfo java` and turns its output into locations.
#[derive(Debug, Clone)]
pub struct UnoinfoHelper {
    helper_name: String,
    ecosystem: String,
    output_ceiling: usize,
}

impl Default for UnoinfoHelper {
    fn default() -> Self {
        Self::new()
    }
}

impl UnoinfoHelper {
    pub fn new() -> Self {
        Self {
            helper_name: HELPER_NAME.to_string(),
            ecosystem: HELPER_ECOSYSTEM.to_string(),
            output_ceiling: DEFAULT_OUTPUT_CEILING,
        }
    }

    #[must_use]
    pub fn with_helper_name(mut self, name: impl Into<String>) -> Self {
        self.helper_name = name.into();
        self
    }

    #[must_use]
    pub fn with_ecosystem(mut self, ecosystem: impl Into<String>) -> Self {
        self.ecosystem = ecosystem.into();
        self
    }

    #[must_use]
    pub const fn with_output_ceiling(mut self, ceiling: usize) -> Self {
        self.output_ceiling = ceiling;
        self
    }

    /// Path of the helper executable inside `installation`.
    pub fn helper_path(&self, installation: &Path) -> PathBuf {
        installation.join(&self.helper_name)
    }

    /// Run the helper and return the locations it reports.
    pub async fn query(&self, installation: &Path) -> Result<Vec<ResourceLocation>, HelperError> {
        let path = self.helper_path(installation);
        debug!(helper = %path.display(), ecosystem = %self.ecosystem, "Running unoinfo");

        let mut child = Command::new(&path)
            .arg(&self.ecosystem)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| HelperError::Launch {
                path: path.clone(),
                source,
            })?;

        if let Some(stderr) = child.stderr.take() {
            spawn_drain(stderr, "unoinfo stderr");
        }

        let output = match child.stdout.take() {
            Some(mut stdout) => {
                read_bounded(&mut stdout, INITIAL_CAPACITY, self.output_ceiling).await?
            }
            None => Vec::new(),
        };

        let status = child.wait().await.map_err(HelperError::Wait)?;
        if !status.success() {
            return Err(status
                .code()
                .map_or(HelperError::Terminated, HelperError::ExitCode));
        }

        let paths = Envelope::parse(&output).path_fields()?;
        let base = std::env::current_dir().unwrap_or_else(|_| installation.to_path_buf());
        let locations = locations_from_paths(paths, &base);
        debug!(count = locations.len(), "unoinfo reported resource locations");
        Ok(locations)
    }
}

#[async_trait]
impl ResourceHelperPort for UnoinfoHelper {
    async fn resource_locations(&self, installation: &Path) -> Vec<ResourceLocation> {
        match self.query(installation).await {
            Ok(locations) => locations,
            Err(e) => {
                warn!(installation = %installation.display(), error = %e, "unoinfo failed, no installation resource locations added");
                Vec::new()
            }
        }
    }
}

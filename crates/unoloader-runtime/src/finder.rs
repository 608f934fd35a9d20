//! Office installation discovery.
//!
//! Resolution order:
//! 1. Explicit override (`--uno-path` or `UNO_PATH`). Authoritative: when it
//!    does not name a directory, discovery stops and reports nothing.
//! 2. The directory of the `soffice` executable found on `PATH`, with
//!    symlinks resolved.
//! 3. Well-known installation directories for the platform.
//!
//! Candidates only qualify when they contain the `unoinfo` helper.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use unoloader_core::InstallationFinder;

use crate::unoinfo::HELPER_NAME;

/// Environment variable naming the installation's program directory.
pub const UNO_PATH_ENV: &str = "UNO_PATH";

/// Executable whose location identifies an installation on `PATH`.
const OFFICE_EXECUTABLE: &str = "soffice";

/// Installation finder searching the host.
#[derive(Debug, Clone)]
pub struct DefaultInstallationFinder {
    explicit: Option<PathBuf>,
    search_path: bool,
    candidates: Vec<PathBuf>,
}

impl Default for DefaultInstallationFinder {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DefaultInstallationFinder {
    /// Create a finder, optionally pinned to an explicit directory.
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            search_path: true,
            candidates: well_known_candidates(),
        }
    }

    /// Replace the well-known candidate directories.
    #[must_use]
    pub fn with_candidates(mut self, candidates: Vec<PathBuf>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Skip the `PATH` lookup of the office executable.
    #[must_use]
    pub const fn without_path_search(mut self) -> Self {
        self.search_path = false;
        self
    }

    fn from_path(&self) -> Option<PathBuf> {
        if !self.search_path {
            return None;
        }
        let executable = which::which(OFFICE_EXECUTABLE).ok()?;
        let resolved = fs::canonicalize(&executable).unwrap_or(executable);
        let dir = resolved.parent()?.to_path_buf();
        debug!(dir = %dir.display(), "Found {} on PATH", OFFICE_EXECUTABLE);
        qualifies(&dir).then_some(dir)
    }

    fn from_candidates(&self) -> Option<PathBuf> {
        self.candidates.iter().find(|dir| qualifies(dir)).cloned()
    }
}

impl InstallationFinder for DefaultInstallationFinder {
    fn find(&self) -> Option<PathBuf> {
        if let Some(explicit) = &self.explicit {
            if explicit.is_dir() {
                info!(installation = %explicit.display(), "Using explicit UNO installation");
                return Some(explicit.clone());
            }
            warn!(
                installation = %explicit.display(),
                "Explicit UNO installation is not a directory, skipping discovery"
            );
            return None;
        }

        let found = self.from_path().or_else(|| self.from_candidates());
        if let Some(dir) = &found {
            info!(installation = %dir.display(), "Discovered UNO installation");
        }
        found
    }
}

/// A directory qualifies as an installation when it holds the helper.
fn qualifies(dir: &Path) -> bool {
    dir.is_dir() && dir.join(HELPER_NAME).is_file()
}

#[cfg(target_os = "linux")]
fn well_known_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![
        PathBuf::from("/usr/lib/libreoffice/program"),
        PathBuf::from("/usr/lib64/libreoffice/program"),
    ];
    // Versioned vendor installs, newest first
    if let Ok(entries) = fs::read_dir("/opt") {
        let mut versioned: Vec<PathBuf> = entries
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with("libreoffice"))
            .map(|e| e.path().join("program"))
            .collect();
        versioned.sort_by(|a, b| b.cmp(a));
        candidates.extend(versioned);
    }
    candidates
}

#[cfg(target_os = "macos")]
fn well_known_candidates() -> Vec<PathBuf> {
    vec![PathBuf::from("/Applications/LibreOffice.app/Contents/MacOS")]
}

#[cfg(windows)]
fn well_known_candidates() -> Vec<PathBuf> {
    ["ProgramFiles", "ProgramFiles(x86)"]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .map(|root| PathBuf::from(root).join("LibreOffice").join("program"))
        .collect()
}

#[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
fn well_known_candidates() -> Vec<PathBuf> {
    Vec::new()
}

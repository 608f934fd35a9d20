//! Installation finder port.
//!
//! Locating an office installation is platform specific (environment
//! overrides, `PATH`, well-known directories). The core only needs the
//! outcome: an existing directory, or nothing.

use std::path::PathBuf;

/// Port for discovering the root of an installed office suite.
pub trait InstallationFinder: Send + Sync {
    /// Return the installation directory, or `None` when no installation is
    /// found. Absence is a legitimate outcome, not an error.
    fn find(&self) -> Option<PathBuf>;
}

/// Finder that never finds anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInstallation;

impl InstallationFinder for NoInstallation {
    fn find(&self) -> Option<PathBuf> {
        None
    }
}

/// Finder that always reports the same directory.
#[derive(Debug, Clone)]
pub struct FixedInstallation(pub PathBuf);

impl InstallationFinder for FixedInstallation {
    fn find(&self) -> Option<PathBuf> {
        Some(self.0.clone())
    }
}

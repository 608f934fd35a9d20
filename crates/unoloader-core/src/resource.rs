//! Resource locations and ordered search paths.
//!
//! A resource location is an absolute `file:` URL naming a directory or an
//! archive from which module descriptors and other resources are read. A
//! [`ResourceList`] keeps locations in declaration order, which is also the
//! order in which they are searched.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use url::Url;

/// Errors produced while turning a path token into a [`ResourceLocation`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResourceError {
    /// The token was empty.
    #[error("empty resource location")]
    Empty,

    /// The token contained a NUL byte, which no filesystem path may hold.
    #[error("resource location contains a NUL byte: {0:?}")]
    InteriorNul(String),

    /// The path could not be expressed as a `file:` URL.
    #[error("bad pathname: {0}")]
    Malformed(String),

    /// The URL does not use the `file` scheme.
    #[error("unsupported resource location scheme: {0}")]
    UnsupportedScheme(String),
}

/// Platform path-list separator used by search-path environment values.
#[cfg(windows)]
pub const PATH_LIST_SEPARATOR: char = ';';
/// Platform path-list separator used by search-path environment values.
#[cfg(not(windows))]
pub const PATH_LIST_SEPARATOR: char = ':';

/// An absolute `file:` URL identifying a directory or an archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocation {
    url: Url,
}

impl ResourceLocation {
    /// Build a location from a filesystem path token.
    ///
    /// Relative tokens are resolved against `base`. Existing directories get
    /// a trailing slash in their URL, everything else is treated as a file
    /// (an archive, or a location that does not exist yet).
    pub fn from_path_token(token: &str, base: &Path) -> Result<Self, ResourceError> {
        if token.contains('\0') {
            return Err(ResourceError::InteriorNul(token.to_string()));
        }
        Self::from_path(Path::new(token), base)
    }

    /// Build a location from a filesystem path, resolved against `base` when
    /// relative.
    pub fn from_path(path: &Path, base: &Path) -> Result<Self, ResourceError> {
        if path.as_os_str().is_empty() {
            return Err(ResourceError::Empty);
        }

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        };

        let url = if absolute.is_dir() {
            Url::from_directory_path(&absolute)
        } else {
            Url::from_file_path(&absolute)
        }
        .map_err(|()| ResourceError::Malformed(absolute.display().to_string()))?;

        Ok(Self { url })
    }

    /// Wrap an existing URL. Only `file:` URLs are accepted.
    pub fn from_url(url: Url) -> Result<Self, ResourceError> {
        if url.scheme() != "file" {
            return Err(ResourceError::UnsupportedScheme(url.scheme().to_string()));
        }
        if url.to_file_path().is_err() {
            return Err(ResourceError::Malformed(url.to_string()));
        }
        Ok(Self { url })
    }

    /// The location's URL.
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Filesystem path of the location.
    pub fn path(&self) -> PathBuf {
        // `from_url` and `from_path_token` only admit URLs with a path form.
        self.url
            .to_file_path()
            .unwrap_or_else(|()| PathBuf::from(self.url.path()))
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// Tokenize `data` on `delimiter` and convert every non-empty token.
///
/// Malformed tokens are skipped with a warning; they never abort the batch.
pub fn parse_path_list(data: &str, delimiter: char, base: &Path) -> Vec<ResourceLocation> {
    data.split(delimiter)
        .filter(|token| !token.is_empty())
        .filter_map(|token| match ResourceLocation::from_path_token(token, base) {
            Ok(location) => Some(location),
            Err(e) => {
                warn!(token = %token, error = %e, "Skipping bad resource location");
                None
            }
        })
        .collect()
}

/// Convert paths into locations, skipping malformed ones with a warning.
pub fn locations_from_paths<I>(paths: I, base: &Path) -> Vec<ResourceLocation>
where
    I: IntoIterator<Item = PathBuf>,
{
    paths
        .into_iter()
        .filter_map(|path| match ResourceLocation::from_path(&path, base) {
            Ok(location) => Some(location),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping bad resource location");
                None
            }
        })
        .collect()
}

/// Ordered sequence of resource locations. Earlier entries win.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceList {
    locations: Vec<ResourceLocation>,
}

impl ResourceList {
    pub const fn new() -> Self {
        Self {
            locations: Vec::new(),
        }
    }

    /// Append locations after the existing ones, preserving their order.
    pub fn extend(&mut self, locations: impl IntoIterator<Item = ResourceLocation>) {
        self.locations.extend(locations);
    }

    pub fn push(&mut self, location: ResourceLocation) {
        self.locations.push(location);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResourceLocation> {
        self.locations.iter()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn as_slice(&self) -> &[ResourceLocation] {
        &self.locations
    }

    /// Join the filesystem paths with the platform path-list separator.
    ///
    /// This is the form handed to entry programs as their context path.
    pub fn to_path_list(&self) -> String {
        self.locations
            .iter()
            .map(|l| l.path().display().to_string())
            .collect::<Vec<_>>()
            .join(&PATH_LIST_SEPARATOR.to_string())
    }
}

impl From<Vec<ResourceLocation>> for ResourceList {
    fn from(locations: Vec<ResourceLocation>) -> Self {
        Self { locations }
    }
}

impl FromIterator<ResourceLocation> for ResourceList {
    fn from_iter<T: IntoIterator<Item = ResourceLocation>>(iter: T) -> Self {
        Self {
            locations: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ResourceList {
    type Item = &'a ResourceLocation;
    type IntoIter = std::slice::Iter<'a, ResourceLocation>;

    fn into_iter(self) -> Self::IntoIter {
        self.locations.iter()
    }
}

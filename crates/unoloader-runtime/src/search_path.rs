//! Module and resource lookup across resource locations.
//!
//! Directory locations are read from the filesystem, any other existing file
//! is opened as a zip archive (jar files included). Locations that do not
//! exist or cannot be read are skipped, as are archives that cannot be
//! opened. Only a malformed module descriptor stops a lookup.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};
use unoloader_core::{
    LoadError, ModuleOrigin, ModuleResolver, PROTECTED_NAMESPACE, QualifiedName, Resolution,
    ResourceList, ResourceLocation, define_module,
};
use zip::ZipArchive;
use zip::result::ZipError;

/// A resource read from one location.
#[derive(Debug, Clone)]
pub struct FoundResource {
    pub location: ResourceLocation,
    pub bytes: Vec<u8>,
}

/// Resolver over an ordered list of resource locations.
#[derive(Debug, Clone)]
pub struct SearchPathResolver {
    locations: ResourceList,
}

impl SearchPathResolver {
    pub const fn new(locations: ResourceList) -> Self {
        Self { locations }
    }

    pub const fn locations(&self) -> &ResourceList {
        &self.locations
    }

    /// Every occurrence of `resource` across the locations, in search order.
    ///
    /// Locations that fail to read are logged and skipped.
    pub fn resources(&self, resource: &str) -> Vec<FoundResource> {
        self.locations
            .iter()
            .filter_map(|location| match read_resource(location, resource) {
                Ok(Some((_, bytes))) => Some(FoundResource {
                    location: location.clone(),
                    bytes,
                }),
                Ok(None) => None,
                Err(e) => {
                    warn!(location = %location, %resource, error = %e, "Cannot read resource");
                    None
                }
            })
            .collect()
    }
}

impl ModuleResolver for SearchPathResolver {
    fn resolve(&self, name: &QualifiedName) -> Result<Resolution, LoadError> {
        if name.is_within(PROTECTED_NAMESPACE) {
            return Ok(Resolution::Forbidden(format!(
                "prohibited namespace: {PROTECTED_NAMESPACE}"
            )));
        }

        let descriptor = name.descriptor_path();
        for location in &self.locations {
            match read_resource(location, &descriptor) {
                Ok(Some((origin, bytes))) => {
                    let module = define_module(name.clone(), origin, &bytes)?;
                    return Ok(Resolution::Found(Arc::new(module)));
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(location = %location, resource = %descriptor, error = %e, "Cannot read resource, skipping location");
                }
            }
        }

        debug!(module = %name, locations = self.locations.len(), "Module not on search path");
        Ok(Resolution::NotFound)
    }
}

/// Read `resource` (a `/`-separated relative path) from one location.
fn read_resource(
    location: &ResourceLocation,
    resource: &str,
) -> io::Result<Option<(ModuleOrigin, Vec<u8>)>> {
    let path = location.path();
    if path.is_dir() {
        return match fs::read(path.join(resource)) {
            Ok(bytes) => Ok(Some((ModuleOrigin::Directory(location.clone()), bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        };
    }
    if !path.is_file() {
        return Ok(None);
    }
    Ok(read_archive_entry(&path, resource)?
        .map(|bytes| (ModuleOrigin::Archive(location.clone()), bytes)))
}

/// Read one entry out of a zip archive.
///
/// Returns `Ok(None)` when the entry is absent or the file is not a readable
/// archive.
pub(crate) fn read_archive_entry(archive: &Path, entry: &str) -> io::Result<Option<Vec<u8>>> {
    let file = File::open(archive)?;
    let mut zip = match ZipArchive::new(file) {
        Ok(zip) => zip,
        Err(e) => {
            warn!(archive = %archive.display(), error = %e, "Skipping unreadable archive");
            return Ok(None);
        }
    };
    let mut file = match zip.by_name(entry) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(io::Error::other(e)),
    };
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;
    Ok(Some(bytes))
}

//! Entry module discovery.
//!
//! Packaging manifests on the ambient search path may name the application's
//! entry module in the `Application-Class` attribute of their
//! `unoloader/Loader` section. Manifests are consulted in reverse search
//! order and the first one naming a module wins; the command line is only
//! used when none does.

use tracing::{debug, info, warn};
use unoloader_core::{MANIFEST_RESOURCE, Manifest, ResourceLocation};
use unoloader_runtime::SearchPathResolver;

use crate::error::CliError;

/// Where the entry identifier came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntrySource {
    Manifest(ResourceLocation),
    Argument,
}

/// Entry module and the arguments it is invoked with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInvocation {
    pub identifier: String,
    pub args: Vec<String>,
    pub source: EntrySource,
}

/// The entry module named by a manifest on `ambient`, if any.
pub fn manifest_entry(ambient: &SearchPathResolver) -> Option<(String, ResourceLocation)> {
    let manifests = ambient.resources(MANIFEST_RESOURCE);
    debug!(count = manifests.len(), "Scanning manifests for an entry module");

    manifests.into_iter().rev().find_map(|found| {
        let text = match std::str::from_utf8(&found.bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!(location = %found.location, error = %e, "Skipping manifest that is not UTF-8");
                return None;
            }
        };
        match Manifest::parse(text) {
            Ok(manifest) => manifest
                .application_class()
                .map(|class| (class.to_string(), found.location.clone())),
            Err(e) => {
                warn!(location = %found.location, error = %e, "Skipping malformed manifest");
                None
            }
        }
    })
}

/// Decide which module to run and with which arguments.
///
/// When a manifest names the module every argument is forwarded; otherwise
/// the first argument is the module and the rest are forwarded.
pub fn discover_entry(
    ambient: &SearchPathResolver,
    mut args: Vec<String>,
) -> Result<EntryInvocation, CliError> {
    if let Some((identifier, location)) = manifest_entry(ambient) {
        info!(module = %identifier, manifest = %location, "Entry module named by manifest");
        return Ok(EntryInvocation {
            identifier,
            args,
            source: EntrySource::Manifest(location),
        });
    }

    if args.is_empty() {
        return Err(CliError::MissingEntryIdentifier);
    }
    let identifier = args.remove(0);
    debug!(module = %identifier, "Entry module named on the command line");
    Ok(EntryInvocation {
        identifier,
        args,
        source: EntrySource::Argument,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use unoloader_core::ResourceList;

    fn location(path: &Path) -> ResourceLocation {
        ResourceLocation::from_path_token(&path.display().to_string(), Path::new("/")).unwrap()
    }

    fn with_manifest(root: &Path, name: &str, manifest: &str) -> ResourceLocation {
        let dir = root.join(name);
        fs::create_dir_all(dir.join("META-INF")).unwrap();
        fs::write(dir.join("META-INF/MANIFEST.MF"), manifest).unwrap();
        location(&dir)
    }

    fn loader_manifest(class: &str) -> String {
        format!("Manifest-Version: 1.0\n\nName: unoloader/Loader\nApplication-Class: {class}\n")
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_manifest_takes_precedence_over_arguments() {
        let root = tempfile::tempdir().unwrap();
        let app = with_manifest(root.path(), "app", &loader_manifest("com.example.App"));
        let ambient = SearchPathResolver::new(ResourceList::from(vec![app.clone()]));

        let entry = discover_entry(&ambient, args(&["com.example.Other", "x"])).unwrap();
        assert_eq!(entry.identifier, "com.example.App");
        assert_eq!(entry.args, args(&["com.example.Other", "x"]));
        assert_eq!(entry.source, EntrySource::Manifest(app));
    }

    #[test]
    fn test_later_location_manifest_wins() {
        let root = tempfile::tempdir().unwrap();
        let first = with_manifest(root.path(), "first", &loader_manifest("com.example.First"));
        let second = with_manifest(root.path(), "second", &loader_manifest("com.example.Second"));
        let ambient = SearchPathResolver::new(ResourceList::from(vec![first, second.clone()]));

        let (class, location) = manifest_entry(&ambient).unwrap();
        assert_eq!(class, "com.example.Second");
        assert_eq!(location, second);
    }

    #[test]
    fn test_unusable_manifests_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let named = with_manifest(root.path(), "named", &loader_manifest("com.example.App"));
        let main_only = with_manifest(
            root.path(),
            "main-only",
            "Manifest-Version: 1.0\nApplication-Class: com.example.Ignored\n",
        );
        let broken = with_manifest(root.path(), "broken", "this is not a manifest\n");
        let ambient = SearchPathResolver::new(ResourceList::from(vec![named, main_only, broken]));

        let (class, _) = manifest_entry(&ambient).unwrap();
        assert_eq!(class, "com.example.App");
    }

    #[test]
    fn test_first_argument_names_module_without_manifest() {
        let root = tempfile::tempdir().unwrap();
        let plain = with_manifest(root.path(), "plain", "Manifest-Version: 1.0\n");
        let ambient = SearchPathResolver::new(ResourceList::from(vec![plain]));

        let entry = discover_entry(&ambient, args(&["com.example.App", "a", "b"])).unwrap();
        assert_eq!(entry.identifier, "com.example.App");
        assert_eq!(entry.args, args(&["a", "b"]));
        assert_eq!(entry.source, EntrySource::Argument);
    }

    #[test]
    fn test_missing_identifier_is_an_error() {
        let ambient = SearchPathResolver::new(ResourceList::new());
        assert!(matches!(
            discover_entry(&ambient, Vec::new()),
            Err(CliError::MissingEntryIdentifier)
        ));
    }
}

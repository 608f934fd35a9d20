//! Assembly of the loader's search path.
//!
//! Environment-supplied locations come first, followed by the locations the
//! installation's helper reports. Each source keeps its own order, and the
//! combined order is the order modules are searched in.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, warn};
use unoloader_core::{
    InstallationFinder, PATH_LIST_SEPARATOR, ResourceHelperPort, ResourceList, parse_path_list,
};

/// Builds the merged [`ResourceList`].
#[derive(Clone)]
pub struct ResourceListBuilder {
    env_path: Option<String>,
    base_dir: PathBuf,
    finder: Arc<dyn InstallationFinder>,
    helper: Arc<dyn ResourceHelperPort>,
}

impl std::fmt::Debug for ResourceListBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceListBuilder")
            .field("env_path", &self.env_path)
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

impl ResourceListBuilder {
    /// Create a builder.
    ///
    /// `env_path` is the process's resource search path value, if any,
    /// joined with the platform path-list separator. Relative entries are
    /// resolved against `base_dir`.
    pub fn new(
        env_path: Option<String>,
        base_dir: PathBuf,
        finder: Arc<dyn InstallationFinder>,
        helper: Arc<dyn ResourceHelperPort>,
    ) -> Self {
        Self {
            env_path,
            base_dir,
            finder,
            helper,
        }
    }

    /// Locations taken from the environment alone.
    pub fn environment_locations(&self) -> ResourceList {
        match &self.env_path {
            Some(data) => parse_path_list(data, PATH_LIST_SEPARATOR, &self.base_dir).into(),
            None => {
                debug!("No resource search path in the environment");
                ResourceList::new()
            }
        }
    }

    /// Environment locations followed by installation locations.
    pub async fn build(&self) -> ResourceList {
        let mut list = self.environment_locations();
        debug!(count = list.len(), "Resource locations from environment");

        let finder = Arc::clone(&self.finder);
        // Discovery stats the filesystem synchronously.
        let installation = tokio::task::spawn_blocking(move || finder.find())
            .await
            .unwrap_or_else(|e| {
                warn!(error = %e, "Installation discovery task failed");
                None
            });

        match installation {
            Some(installation) => {
                let discovered = self.helper.resource_locations(&installation).await;
                debug!(
                    installation = %installation.display(),
                    count = discovered.len(),
                    "Resource locations from installation"
                );
                list.extend(discovered);
            }
            None => warn!("No UNO installation found"),
        }

        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use unoloader_core::{FixedInstallation, NoInstallation, ResourceLocation};

    struct StaticHelper {
        tokens: Vec<&'static str>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ResourceHelperPort for StaticHelper {
        async fn resource_locations(&self, installation: &Path) -> Vec<ResourceLocation> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.tokens
                .iter()
                .map(|t| ResourceLocation::from_path_token(t, installation).unwrap())
                .collect()
        }
    }

    fn names(list: &ResourceList) -> Vec<String> {
        list.iter()
            .map(|l| l.path().file_name().unwrap().to_string_lossy().to_string())
            .collect()
    }

    fn env_value(root: &Path, names: &[&str]) -> String {
        names
            .iter()
            .map(|n| root.join(n).display().to_string())
            .collect::<Vec<_>>()
            .join(&PATH_LIST_SEPARATOR.to_string())
    }

    #[tokio::test]
    async fn environment_locations_precede_installation_locations() {
        let root = std::env::temp_dir();
        let helper = Arc::new(StaticHelper {
            tokens: vec!["C", "D"],
            calls: AtomicUsize::new(0),
        });
        let builder = ResourceListBuilder::new(
            Some(env_value(&root, &["A", "B"])),
            root.clone(),
            Arc::new(FixedInstallation(root.join("office"))),
            helper.clone(),
        );

        let list = builder.build().await;
        assert_eq!(names(&list), vec!["A", "B", "C", "D"]);
        assert_eq!(helper.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_installation_keeps_environment_locations() {
        let root = std::env::temp_dir();
        let helper = Arc::new(StaticHelper {
            tokens: vec!["C"],
            calls: AtomicUsize::new(0),
        });
        let builder = ResourceListBuilder::new(
            Some(env_value(&root, &["A"])),
            root.clone(),
            Arc::new(NoInstallation),
            helper.clone(),
        );

        let list = builder.build().await;
        assert_eq!(names(&list), vec!["A"]);
        assert_eq!(helper.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn no_environment_path_yields_only_installation_locations() {
        let root = std::env::temp_dir();
        let builder = ResourceListBuilder::new(
            None,
            root.clone(),
            Arc::new(FixedInstallation(root.clone())),
            Arc::new(StaticHelper {
                tokens: vec!["C", "D"],
                calls: AtomicUsize::new(0),
            }),
        );
        assert_eq!(names(&builder.build().await), vec!["C", "D"]);
    }
}
